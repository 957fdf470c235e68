use serde::Serialize;

/// Number of COCO keypoints per person.
pub const NUM_KEYPOINTS: usize = 17;

/// COCO keypoint names, in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointKind {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointKind {
    pub const ALL: [KeypointKind; NUM_KEYPOINTS] = [
        KeypointKind::Nose,
        KeypointKind::LeftEye,
        KeypointKind::RightEye,
        KeypointKind::LeftEar,
        KeypointKind::RightEar,
        KeypointKind::LeftShoulder,
        KeypointKind::RightShoulder,
        KeypointKind::LeftElbow,
        KeypointKind::RightElbow,
        KeypointKind::LeftWrist,
        KeypointKind::RightWrist,
        KeypointKind::LeftHip,
        KeypointKind::RightHip,
        KeypointKind::LeftKnee,
        KeypointKind::RightKnee,
        KeypointKind::LeftAnkle,
        KeypointKind::RightAnkle,
    ];

    /// Position in the COCO keypoint array.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A 2D landmark in frame pixel coordinates.
///
/// `confidence` is whatever the backend reports; orientation voting ignores it and
/// relies on the detection score instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Arithmetic mean of two points, per axis, in `f64`.
    pub fn midpoint(a: Keypoint, b: Keypoint) -> (f64, f64) {
        (
            (f64::from(a.x) + f64::from(b.x)) / 2.0,
            (f64::from(a.y) + f64::from(b.y)) / 2.0,
        )
    }
}

/// One candidate person in one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PoseDetection {
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
    /// Overall person score.
    pub score: f32,
}

impl PoseDetection {
    pub fn new(keypoints: [Keypoint; NUM_KEYPOINTS], score: f32) -> Self {
        Self { keypoints, score }
    }

    pub fn keypoint(&self, kind: KeypointKind) -> Keypoint {
        self.keypoints[kind.index()]
    }

    /// Builder for synthetic detections: every keypoint starts at the origin.
    pub fn builder(score: f32) -> PoseDetectionBuilder {
        PoseDetectionBuilder {
            detection: PoseDetection::new([Keypoint::default(); NUM_KEYPOINTS], score),
        }
    }
}

pub struct PoseDetectionBuilder {
    detection: PoseDetection,
}

impl PoseDetectionBuilder {
    pub fn point(mut self, kind: KeypointKind, x: f32, y: f32) -> Self {
        self.detection.keypoints[kind.index()] = Keypoint::new(x, y, 1.0);
        self
    }

    /// Place both shoulders, both hips and both eyes at the given pair centers.
    pub fn torso(self, shoulders: (f32, f32), hips: (f32, f32), eyes: (f32, f32)) -> Self {
        self.point(KeypointKind::LeftShoulder, shoulders.0, shoulders.1)
            .point(KeypointKind::RightShoulder, shoulders.0, shoulders.1)
            .point(KeypointKind::LeftHip, hips.0, hips.1)
            .point(KeypointKind::RightHip, hips.0, hips.1)
            .point(KeypointKind::LeftEye, eyes.0, eyes.1)
            .point(KeypointKind::RightEye, eyes.0, eyes.1)
    }

    pub fn build(self) -> PoseDetection {
        self.detection
    }
}
