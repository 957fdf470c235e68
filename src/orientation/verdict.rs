use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

use super::vote::VoteTally;

/// Dominant direction of the shoulder-to-hip line in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyAxis {
    Vertical,
    Horizontal,
}

/// Side of the hips the head lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadPosition {
    Top,
    Bottom,
    Left,
    Right,
}

/// Orientation decision for a whole video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// No qualifying detection in any sampled frame, or the video could not be read.
    Undetermined,
    Decided {
        axis: BodyAxis,
        head: HeadPosition,
    },
}

impl Verdict {
    pub fn new(axis: BodyAxis, head: HeadPosition) -> Self {
        Verdict::Decided { axis, head }
    }

    /// Reduce a finished tally to a verdict.
    ///
    /// Ties on the axis favor horizontal. The head side needs a strict majority of
    /// the winning axis' votes; anything else falls to bottom/right.
    pub fn from_tally(tally: &VoteTally) -> Self {
        if tally.vertical == 0 && tally.horizontal == 0 {
            return Verdict::Undetermined;
        }

        if tally.vertical > tally.horizontal {
            // head_above_hip > vertical / 2, without integer truncation.
            let head = if 2 * u64::from(tally.head_above_hip) > u64::from(tally.vertical) {
                HeadPosition::Top
            } else {
                HeadPosition::Bottom
            };
            Verdict::new(BodyAxis::Vertical, head)
        } else {
            let head = if 2 * u64::from(tally.head_left_of_hip) > u64::from(tally.horizontal) {
                HeadPosition::Left
            } else {
                HeadPosition::Right
            };
            Verdict::new(BodyAxis::Horizontal, head)
        }
    }

    pub fn body_axis(&self) -> Option<BodyAxis> {
        match self {
            Verdict::Decided { axis, .. } => Some(*axis),
            Verdict::Undetermined => None,
        }
    }

    pub fn head_position(&self) -> Option<HeadPosition> {
        match self {
            Verdict::Decided { head, .. } => Some(*head),
            Verdict::Undetermined => None,
        }
    }

    pub fn is_undetermined(&self) -> bool {
        matches!(self, Verdict::Undetermined)
    }
}

impl fmt::Display for BodyAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BodyAxis::Vertical => "vertical",
            BodyAxis::Horizontal => "horizontal",
        })
    }
}

impl fmt::Display for HeadPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeadPosition::Top => "top",
            HeadPosition::Bottom => "bottom",
            HeadPosition::Left => "left",
            HeadPosition::Right => "right",
        })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Undetermined => f.write_str("undetermined"),
            Verdict::Decided { axis, head } => write!(f, "body {axis}, head {head}"),
        }
    }
}

/// Serialized as `{"body_axis": ..., "head_position": ...}` with nulls when undetermined.
impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Verdict", 2)?;
        state.serialize_field("body_axis", &self.body_axis())?;
        state.serialize_field("head_position", &self.head_position())?;
        state.end()
    }
}
