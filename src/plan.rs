//! Rotation planning: a fixed lookup from verdict to action.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::orientation::{BodyAxis, HeadPosition, Verdict};
use crate::rotate::RotateError;

/// What to do with a video once its orientation is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationAction {
    /// Already upright; copy unchanged.
    Identity,
    /// Upside down.
    Rotate180,
    /// Head on the left; turn the frame clockwise.
    RotateCw90,
    /// Head on the right; turn the frame counter-clockwise.
    RotateCcw90,
    /// Orientation unknown; copy unchanged.
    Unknown,
}

impl RotationAction {
    /// True for actions that are a plain copy of the source.
    pub fn is_copy(self) -> bool {
        matches!(self, RotationAction::Identity | RotationAction::Unknown)
    }

    /// Net clockwise quarter turns applied to the pixel plane.
    pub fn clockwise_quarter_turns(self) -> u8 {
        match self {
            RotationAction::Identity | RotationAction::Unknown => 0,
            RotationAction::RotateCw90 => 1,
            RotationAction::Rotate180 => 2,
            RotationAction::RotateCcw90 => 3,
        }
    }

    /// Direction name understood by the executor, `None` for copy actions.
    pub fn direction(self) -> Option<&'static str> {
        match self {
            RotationAction::RotateCw90 => Some("clockwise"),
            RotationAction::RotateCcw90 => Some("counterclockwise"),
            RotationAction::Rotate180 => Some("180"),
            RotationAction::Identity | RotationAction::Unknown => None,
        }
    }
}

/// Map a verdict to its rotation action.
pub fn plan_rotation(verdict: Verdict) -> RotationAction {
    match (verdict.body_axis(), verdict.head_position()) {
        (Some(BodyAxis::Vertical), Some(HeadPosition::Top)) => RotationAction::Identity,
        (Some(BodyAxis::Vertical), Some(HeadPosition::Bottom)) => RotationAction::Rotate180,
        (Some(BodyAxis::Horizontal), Some(HeadPosition::Right)) => RotationAction::RotateCcw90,
        (Some(BodyAxis::Horizontal), Some(HeadPosition::Left)) => RotationAction::RotateCw90,
        _ => RotationAction::Unknown,
    }
}

/// Parses the executor's direction vocabulary: `clockwise`, `counterclockwise`, `180`.
impl FromStr for RotationAction {
    type Err = RotateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clockwise" => Ok(RotationAction::RotateCw90),
            "counterclockwise" => Ok(RotationAction::RotateCcw90),
            "180" => Ok(RotationAction::Rotate180),
            other => Err(RotateError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for RotationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RotationAction::Identity => "copy (already upright)",
            RotationAction::Rotate180 => "rotate 180°",
            RotationAction::RotateCw90 => "rotate 90° clockwise",
            RotationAction::RotateCcw90 => "rotate 90° counter-clockwise",
            RotationAction::Unknown => "copy (orientation unknown)",
        })
    }
}
