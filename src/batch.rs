//! Batch driver: correct every video in a folder.
//!
//! Videos are processed one after another against a single pose backend. Each
//! input `<dir>/<name>` produces `<dir>/<subdir>/<name>`, either a rotated
//! re-encode or a plain copy. Per-file problems are recorded in the summary and
//! never stop the batch.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::analyze::{AnalysisOptions, Analyzer};
use crate::detect::PoseBackend;
use crate::ingest::VideoOpener;
use crate::orientation::Verdict;
use crate::plan::RotationAction;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::rotate::RotationExecutor;

/// Output folder created inside the input folder.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "corrected";

/// Recognized video extensions, compared case-insensitively.
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

#[derive(Clone, Debug, PartialEq)]
pub struct BatchOptions {
    pub output_subdir: String,
    pub analysis: AnalysisOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_subdir: DEFAULT_OUTPUT_SUBDIR.to_string(),
            analysis: AnalysisOptions::default(),
        }
    }
}

/// What happened to one input file.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Written unchanged: already upright, or orientation undetermined.
    Copied {
        verdict: Verdict,
        action: RotationAction,
    },
    Rotated {
        verdict: Verdict,
        action: RotationAction,
    },
    /// Could not be opened; no output written.
    Skipped { reason: String },
    /// Copy or rotation failed.
    Failed { error: String },
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Copied { verdict, action } | FileOutcome::Rotated { verdict, action } => {
                write!(f, "{} ({})", action, verdict)
            }
            FileOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            FileOutcome::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileResult {
    pub name: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub copied: usize,
    pub rotated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Set when a stop request ended the batch before every file was processed.
    pub stopped_early: bool,
    pub output_dir: Option<PathBuf>,
    pub files: Vec<FileResult>,
}

impl BatchSummary {
    fn record(&mut self, result: FileResult) {
        match result.outcome {
            FileOutcome::Copied { .. } => self.copied += 1,
            FileOutcome::Rotated { .. } => self.rotated += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.files.push(result);
    }

    pub fn processed(&self) -> usize {
        self.files.len()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} videos: {} rotated, {} copied, {} skipped, {} failed",
            self.processed(),
            self.total,
            self.rotated,
            self.copied,
            self.skipped,
            self.failed
        )?;
        if self.stopped_early {
            f.write_str(" (stopped early)")?;
        }
        Ok(())
    }
}

/// Video files directly inside `dir`, sorted by name.
pub fn discover_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    let mut videos = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path) {
            videos.push(path);
        }
    }
    videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(videos)
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

pub struct BatchDriver<'a> {
    analyzer: Analyzer<'a>,
    executor: &'a dyn RotationExecutor,
    reporter: &'a dyn ProgressReporter,
    output_subdir: String,
    stop: Option<Arc<AtomicBool>>,
}

impl<'a> BatchDriver<'a> {
    pub fn new(
        opener: &'a dyn VideoOpener,
        executor: &'a dyn RotationExecutor,
        reporter: &'a dyn ProgressReporter,
        options: BatchOptions,
    ) -> Self {
        Self {
            analyzer: Analyzer::new(opener, options.analysis),
            executor,
            reporter,
            output_subdir: options.output_subdir,
            stop: None,
        }
    }

    /// Stop between files once `flag` is set. The file in progress always finishes.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn run(&self, input_dir: &Path, backend: &mut dyn PoseBackend) -> Result<BatchSummary> {
        if !input_dir.is_dir() {
            return Err(anyhow!("{} is not a directory", input_dir.display()));
        }
        self.analyzer.options().validate()?;

        let output_dir = input_dir.join(&self.output_subdir);
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        let videos = discover_videos(input_dir)?;
        let total = videos.len();
        let mut summary = BatchSummary {
            total,
            output_dir: Some(output_dir.clone()),
            ..BatchSummary::default()
        };
        self.reporter.report(ProgressEvent::Started { total });
        if total == 0 {
            log::warn!("no supported video files in {}", input_dir.display());
        }

        for (index, input) in videos.iter().enumerate() {
            if self.stop_requested() {
                log::warn!("stop requested; {} videos left unprocessed", total - index);
                summary.stopped_early = true;
                break;
            }

            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.reporter.report(ProgressEvent::FileStarted {
                index,
                total,
                name: name.clone(),
            });

            let outcome = self.process(input, &output_dir.join(&name), backend);
            match &outcome {
                FileOutcome::Failed { error } => log::error!("{}: {}", name, error),
                FileOutcome::Skipped { reason } => log::warn!("{}: skipped: {}", name, reason),
                _ => {}
            }

            self.reporter.report(ProgressEvent::FileFinished {
                index,
                total,
                name: name.clone(),
                outcome: outcome.clone(),
            });
            summary.record(FileResult { name, outcome });
        }

        self.reporter.report(ProgressEvent::Finished {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    fn process(&self, input: &Path, output: &Path, backend: &mut dyn PoseBackend) -> FileOutcome {
        let report = match self.analyzer.analyze(input, backend) {
            Ok(report) => report,
            Err(err) => {
                return FileOutcome::Skipped {
                    reason: format!("{:#}", err),
                }
            }
        };
        let (verdict, action) = (report.verdict, report.action);

        if action.is_copy() {
            return match fs::copy(input, output) {
                Ok(_) => FileOutcome::Copied { verdict, action },
                Err(err) => FileOutcome::Failed {
                    error: format!("copy to {} failed: {}", output.display(), err),
                },
            };
        }

        match self.executor.rotate(input, output, action) {
            Ok(()) => FileOutcome::Rotated { verdict, action },
            Err(err) => FileOutcome::Failed {
                error: err.to_string(),
            },
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
