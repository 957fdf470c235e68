use anyhow::Result;

use crate::detect::backend::PoseBackend;
use crate::detect::result::PoseDetection;
use crate::frame::Frame;

/// Backend that never finds anyone. Every clip analyzed with it is undetermined.
pub struct StubBackend {
    frames_seen: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self { frames_seen: 0 }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<PoseDetection>> {
        self.frames_seen += 1;
        Ok(Vec::new())
    }
}
