//! Pose estimation.
//!
//! The orientation core only consumes what a backend returns: per-person COCO
//! keypoints in frame pixels plus an overall score. Backends own the model session.

mod backend;
pub mod backends;
mod decode;
mod registry;
mod result;
mod session;

pub use backend::PoseBackend;
pub use backends::{ScriptStats, ScriptedBackend, StubBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use decode::{decode_pose_output, DecodeParams, POSE_CHANNELS};
pub use registry::BackendRegistry;
pub use session::PoseSession;
pub use result::{Keypoint, KeypointKind, PoseDetection, PoseDetectionBuilder, NUM_KEYPOINTS};
