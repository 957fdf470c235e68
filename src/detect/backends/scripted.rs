use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::detect::backend::PoseBackend;
use crate::detect::result::PoseDetection;
use crate::frame::Frame;

/// One scripted response.
#[derive(Clone, Debug)]
pub enum ScriptStep {
    Detections(Vec<PoseDetection>),
    Fail(String),
}

/// Backend that replays scripted detections, one step per `detect` call.
///
/// Once the script runs out, the fallback list is returned for every further frame.
pub struct ScriptedBackend {
    script: VecDeque<ScriptStep>,
    fallback: Vec<PoseDetection>,
    stats: ScriptStats,
}

/// Shared view of how a scripted backend was driven, usable after the backend
/// has been moved into a worker.
#[derive(Clone, Debug, Default)]
pub struct ScriptStats {
    detect_calls: Arc<AtomicU64>,
    warmed_up: Arc<AtomicBool>,
    shut_down: Arc<AtomicBool>,
}

impl ScriptStats {
    pub fn detect_calls(&self) -> u64 {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn warmed_up(&self) -> bool {
        self.warmed_up.load(Ordering::SeqCst)
    }

    pub fn shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: Vec::new(),
            stats: ScriptStats::default(),
        }
    }

    /// Return the same detections for every frame.
    pub fn repeating(detections: Vec<PoseDetection>) -> Self {
        Self::new().with_fallback(detections)
    }

    pub fn with_fallback(mut self, detections: Vec<PoseDetection>) -> Self {
        self.fallback = detections;
        self
    }

    pub fn then_detect(mut self, detections: Vec<PoseDetection>) -> Self {
        self.script.push_back(ScriptStep::Detections(detections));
        self
    }

    pub fn then_fail(mut self, message: &str) -> Self {
        self.script.push_back(ScriptStep::Fail(message.to_string()));
        self
    }

    pub fn stats(&self) -> ScriptStats {
        self.stats.clone()
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<PoseDetection>> {
        if self.stats.shut_down() {
            return Err(anyhow!("scripted backend used after shutdown"));
        }
        self.stats.detect_calls.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(ScriptStep::Detections(detections)) => Ok(detections),
            Some(ScriptStep::Fail(message)) => Err(anyhow!(message)),
            None => Ok(self.fallback.clone()),
        }
    }

    fn warm_up(&mut self) -> Result<()> {
        self.stats.warmed_up.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.stats.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}
