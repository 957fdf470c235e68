use serde::Serialize;

use super::verdict::BodyAxis;
use crate::detect::{Keypoint, KeypointKind, PoseDetection};

/// Where the head sits relative to the hips, measured on the detection's own axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadSide {
    /// Vertical body, head y strictly smaller than hip y.
    AboveHip,
    /// Horizontal body, head x strictly smaller than hip x.
    LeftOfHip,
    /// Anything else, including exact ties. Casts no head vote.
    Other,
}

/// Votes extracted from one detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionVote {
    pub axis: BodyAxis,
    pub head: HeadSide,
}

/// Vote counters for one video's analysis pass.
///
/// Counters only grow during a pass. A fresh tally is created per video.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub vertical: u32,
    pub horizontal: u32,
    pub head_above_hip: u32,
    pub head_left_of_hip: u32,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of detections that voted.
    pub fn detections(&self) -> u32 {
        self.vertical + self.horizontal
    }

    pub fn record(&mut self, vote: DetectionVote) {
        match vote.axis {
            BodyAxis::Vertical => self.vertical += 1,
            BodyAxis::Horizontal => self.horizontal += 1,
        }
        match vote.head {
            HeadSide::AboveHip => self.head_above_hip += 1,
            HeadSide::LeftOfHip => self.head_left_of_hip += 1,
            HeadSide::Other => {}
        }
    }
}

/// Derive the body-axis and head-side votes for one detection.
///
/// The torso axis runs from the shoulder midpoint to the hip midpoint. It is
/// vertical only when its vertical span strictly exceeds its horizontal span.
/// The head reference is the eye midpoint.
pub fn vote_for(detection: &PoseDetection) -> DetectionVote {
    let (shoulder_x, shoulder_y) = Keypoint::midpoint(
        detection.keypoint(KeypointKind::LeftShoulder),
        detection.keypoint(KeypointKind::RightShoulder),
    );
    let (hip_x, hip_y) = Keypoint::midpoint(
        detection.keypoint(KeypointKind::LeftHip),
        detection.keypoint(KeypointKind::RightHip),
    );
    let (head_x, head_y) = Keypoint::midpoint(
        detection.keypoint(KeypointKind::LeftEye),
        detection.keypoint(KeypointKind::RightEye),
    );

    let vertical_span = (shoulder_y - hip_y).abs();
    let horizontal_span = (shoulder_x - hip_x).abs();

    if vertical_span > horizontal_span {
        DetectionVote {
            axis: BodyAxis::Vertical,
            head: if head_y < hip_y {
                HeadSide::AboveHip
            } else {
                HeadSide::Other
            },
        }
    } else {
        DetectionVote {
            axis: BodyAxis::Horizontal,
            head: if head_x < hip_x {
                HeadSide::LeftOfHip
            } else {
                HeadSide::Other
            },
        }
    }
}

/// Record votes for every detection scoring strictly above `confidence_threshold`.
///
/// Returns the number of detections that voted.
pub fn cast_votes(
    tally: &mut VoteTally,
    detections: &[PoseDetection],
    confidence_threshold: f32,
) -> usize {
    let mut accepted = 0;
    for detection in detections {
        if detection.score > confidence_threshold {
            tally.record(vote_for(detection));
            accepted += 1;
        }
    }
    accepted
}
