//! Decoding of YOLOv8-pose style output tensors.
//!
//! The model emits `[1, 56, N]`: for each of `N` anchors, a box (cx, cy, w, h),
//! a person score, and 17 keypoints as (x, y, confidence), all in model input
//! pixels. Overlapping anchors that describe the same person are collapsed with
//! IoU non-maximum suppression. Distinct people all survive.

use super::result::{Keypoint, PoseDetection, NUM_KEYPOINTS};

/// Channels per anchor: 4 box + 1 score + 17 * 3 keypoint values.
pub const POSE_CHANNELS: usize = 4 + 1 + NUM_KEYPOINTS * 3;

#[derive(Clone, Copy, Debug)]
pub struct DecodeParams {
    /// Frame width divided by model input width.
    pub x_scale: f32,
    /// Frame height divided by model input height.
    pub y_scale: f32,
    /// Anchors below this score are dropped before NMS.
    pub score_floor: f32,
    pub iou_threshold: f32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            x_scale: 1.0,
            y_scale: 1.0,
            score_floor: 0.25,
            iou_threshold: 0.45,
        }
    }
}

struct Candidate {
    bbox: [f32; 4],
    detection: PoseDetection,
}

/// Decode a channel-major `[56, anchors]` buffer into per-person detections,
/// sorted by descending score.
pub fn decode_pose_output(data: &[f32], anchors: usize, params: DecodeParams) -> Vec<PoseDetection> {
    if anchors == 0 || data.len() < POSE_CHANNELS * anchors {
        return Vec::new();
    }
    let at = |channel: usize, anchor: usize| data[channel * anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let score = at(4, anchor);
        if !score.is_finite() || score < params.score_floor {
            continue;
        }
        let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
        for (k, keypoint) in keypoints.iter_mut().enumerate() {
            let base = 5 + k * 3;
            *keypoint = Keypoint::new(
                at(base, anchor) * params.x_scale,
                at(base + 1, anchor) * params.y_scale,
                at(base + 2, anchor),
            );
        }
        candidates.push(Candidate {
            bbox: [
                (cx - w / 2.0) * params.x_scale,
                (cy - h / 2.0) * params.y_scale,
                (cx + w / 2.0) * params.x_scale,
                (cy + h / 2.0) * params.y_scale,
            ],
            detection: PoseDetection::new(keypoints, score),
        });
    }

    candidates.sort_by(|a, b| {
        b.detection
            .score
            .partial_cmp(&a.detection.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![true; candidates.len()];
    for i in 0..candidates.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if keep[j] && iou(&candidates[i].bbox, &candidates[j].bbox) > params.iou_threshold {
                keep[j] = false;
            }
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, kept)| kept.then_some(candidate.detection))
        .collect()
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes.
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::KeypointKind;

    /// Build a channel-major buffer from per-anchor rows.
    fn buffer(rows: &[[f32; POSE_CHANNELS]]) -> Vec<f32> {
        let anchors = rows.len();
        let mut data = vec![0.0; POSE_CHANNELS * anchors];
        for (anchor, row) in rows.iter().enumerate() {
            for (channel, value) in row.iter().enumerate() {
                data[channel * anchors + anchor] = *value;
            }
        }
        data
    }

    fn row(cx: f32, cy: f32, score: f32) -> [f32; POSE_CHANNELS] {
        let mut row = [0.0; POSE_CHANNELS];
        row[0] = cx;
        row[1] = cy;
        row[2] = 20.0;
        row[3] = 40.0;
        row[4] = score;
        let shoulder = 5 + KeypointKind::LeftShoulder.index() * 3;
        row[shoulder] = cx;
        row[shoulder + 1] = cy - 10.0;
        row
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [20.0, 20.0, 30.0, 30.0];
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert!(iou(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn overlapping_anchors_collapse_but_distinct_people_survive() {
        let data = buffer(&[
            row(50.0, 50.0, 0.70),
            row(51.0, 50.0, 0.90),
            row(200.0, 50.0, 0.85),
            row(300.0, 50.0, 0.10),
        ]);
        let people = decode_pose_output(&data, 4, DecodeParams::default());
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].score, 0.90);
        assert_eq!(people[1].score, 0.85);
    }

    #[test]
    fn keypoints_are_scaled_to_frame_pixels() {
        let data = buffer(&[row(100.0, 80.0, 0.9)]);
        let params = DecodeParams {
            x_scale: 2.0,
            y_scale: 0.5,
            ..DecodeParams::default()
        };
        let people = decode_pose_output(&data, 1, params);
        let shoulder = people[0].keypoint(KeypointKind::LeftShoulder);
        assert_eq!((shoulder.x, shoulder.y), (200.0, 35.0));
    }

    #[test]
    fn short_buffer_yields_nothing() {
        assert!(decode_pose_output(&[0.0; 10], 1, DecodeParams::default()).is_empty());
    }
}
