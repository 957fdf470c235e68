//! Per-video orientation analysis.
//!
//! Sampling, pose estimation, voting and aggregation for one video run strictly
//! one frame at a time against a single backend session.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::detect::PoseBackend;
use crate::frame::Frame;
use crate::ingest::{sample_indices, FrameSource, VideoOpener, DEFAULT_SAMPLE_FRAMES};
use crate::orientation::{cast_votes, Verdict, VoteTally};
use crate::plan::{plan_rotation, RotationAction};

/// Default minimum detection score. Detections must score strictly above it.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisOptions {
    /// Frames sampled per video.
    pub sample_frames: usize,
    pub confidence_threshold: f32,
    /// Retain one decoded frame for previews.
    pub keep_snapshot: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            sample_frames: DEFAULT_SAMPLE_FRAMES,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            keep_snapshot: false,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<()> {
        if self.sample_frames == 0 {
            return Err(anyhow!("sample frame count must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        Ok(())
    }
}

/// Outcome of analyzing one video.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    pub verdict: Verdict,
    pub action: RotationAction,
    pub tally: VoteTally,
    pub frames_requested: usize,
    pub frames_analyzed: usize,
    pub frames_skipped: usize,
    /// Decoded frame nearest the middle of the sample, when requested.
    #[serde(skip)]
    pub snapshot: Option<Frame>,
}

impl AnalysisReport {
    fn from_tally(tally: VoteTally, frames_requested: usize) -> Self {
        let verdict = Verdict::from_tally(&tally);
        Self {
            verdict,
            action: plan_rotation(verdict),
            tally,
            frames_requested,
            frames_analyzed: 0,
            frames_skipped: 0,
            snapshot: None,
        }
    }
}

/// Orientation analyzer. Owns no session; the caller lends the backend per video.
pub struct Analyzer<'a> {
    opener: &'a dyn VideoOpener,
    options: AnalysisOptions,
}

impl<'a> Analyzer<'a> {
    pub fn new(opener: &'a dyn VideoOpener, options: AnalysisOptions) -> Self {
        Self { opener, options }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze a video file.
    ///
    /// Fails only when the video cannot be opened. Frames that fail to decode or
    /// to run through the backend are skipped.
    pub fn analyze(&self, path: &Path, backend: &mut dyn PoseBackend) -> Result<AnalysisReport> {
        let mut source = self.opener.open(path)?;
        let report = self.analyze_source(source.as_mut(), backend);
        if report.verdict.is_undetermined() {
            log::warn!(
                "{}: no person scored above {} in any sampled frame",
                path.display(),
                self.options.confidence_threshold
            );
        }
        log::info!(
            "{}: {} ({} of {} sampled frames analyzed, {} votes)",
            path.display(),
            report.verdict,
            report.frames_analyzed,
            report.frames_requested,
            report.tally.detections()
        );
        Ok(report)
    }

    /// Verdict only, with unopenable videos mapped to [`Verdict::Undetermined`].
    pub fn verdict_for(&self, path: &Path, backend: &mut dyn PoseBackend) -> Verdict {
        match self.analyze(path, backend) {
            Ok(report) => report.verdict,
            Err(err) => {
                log::warn!("could not open {}: {:#}", path.display(), err);
                Verdict::Undetermined
            }
        }
    }

    /// Sample, detect and vote over an already opened source.
    pub fn analyze_source(
        &self,
        source: &mut dyn FrameSource,
        backend: &mut dyn PoseBackend,
    ) -> AnalysisReport {
        let indices = sample_indices(source.frame_count(), self.options.sample_frames);
        let middle = indices.len() / 2;

        let mut tally = VoteTally::new();
        let mut analyzed = 0;
        let mut skipped = 0;
        let mut snapshot = None;

        for (position, &index) in indices.iter().enumerate() {
            let frame = match source.frame_at(index) {
                Ok(frame) => frame,
                Err(err) => {
                    log::debug!("skipping frame {}: {:#}", index, err);
                    skipped += 1;
                    continue;
                }
            };

            match backend.detect(&frame) {
                Ok(detections) => {
                    let accepted =
                        cast_votes(&mut tally, &detections, self.options.confidence_threshold);
                    log::trace!(
                        "frame {}: {} detections, {} accepted",
                        index,
                        detections.len(),
                        accepted
                    );
                    analyzed += 1;
                }
                Err(err) => {
                    log::warn!("{} failed on frame {}: {:#}", backend.name(), index, err);
                    skipped += 1;
                    continue;
                }
            }

            if self.options.keep_snapshot && (snapshot.is_none() || position <= middle) {
                snapshot = Some(frame);
            }
        }

        let mut report = AnalysisReport::from_tally(tally, indices.len());
        report.frames_analyzed = analyzed;
        report.frames_skipped = skipped;
        report.snapshot = snapshot;
        report
    }
}
