use anyhow::Result;

use crate::detect::result::PoseDetection;
use crate::frame::Frame;

/// Pose estimation backend.
///
/// A backend wraps one inference session. Sessions are not reentrant, so `detect`
/// takes `&mut self` and a backend is driven by exactly one worker at a time.
///
/// # Lifecycle
///
/// 1. Construct once per process (model loading happens here).
/// 2. `warm_up` once before the first frame.
/// 3. `detect` for every sampled frame of every video in the batch.
/// 4. `shutdown` once when the batch is done.
pub trait PoseBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Detect people in a frame. Keypoints are returned in frame pixel coordinates.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<PoseDetection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release session resources. The backend must not be used afterwards.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<B: PoseBackend + ?Sized> PoseBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<PoseDetection>> {
        (**self).detect(frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        (**self).warm_up()
    }

    fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown()
    }
}
