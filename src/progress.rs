//! Batch progress reporting.
//!
//! The batch driver emits [`ProgressEvent`]s through a [`ProgressReporter`]. The
//! analysis core never sees a reporter, so any UI can sit on the other side.

use std::fmt;
use std::sync::mpsc::Sender;

use crate::batch::{BatchSummary, FileOutcome};

#[derive(Clone, Debug)]
pub enum ProgressEvent {
    Started {
        total: usize,
    },
    FileStarted {
        index: usize,
        total: usize,
        name: String,
    },
    FileFinished {
        index: usize,
        total: usize,
        name: String,
        outcome: FileOutcome,
    },
    Finished {
        summary: BatchSummary,
    },
}

impl ProgressEvent {
    /// Completed fraction in percent, for file-level events.
    pub fn percent(&self) -> Option<f64> {
        match self {
            ProgressEvent::FileFinished { index, total, .. } if *total > 0 => {
                Some((*index + 1) as f64 / *total as f64 * 100.0)
            }
            _ => None,
        }
    }
}

pub trait ProgressReporter: Send {
    fn report(&self, event: ProgressEvent);
}

/// Forwards events over a channel to another thread.
pub struct ChannelReporter {
    sender: Sender<ProgressEvent>,
}

impl ChannelReporter {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: ProgressEvent) {
        // A receiver that hung up only loses progress output.
        if self.sender.send(event).is_err() {
            log::debug!("progress receiver disconnected");
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Started { total } => write!(f, "processing {} videos", total),
            ProgressEvent::FileStarted { index, total, name } => {
                write!(f, "analyzing {} ({}/{})", name, index + 1, total)
            }
            ProgressEvent::FileFinished { name, outcome, .. } => write!(
                f,
                "{}: {} [{:.0}%]",
                name,
                outcome,
                self.percent().unwrap_or(100.0)
            ),
            ProgressEvent::Finished { summary } => write!(f, "batch complete: {}", summary),
        }
    }
}

/// Writes events to the log, for runs without an interactive terminal.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::FileFinished {
                outcome: FileOutcome::Failed { .. },
                ..
            } => log::error!("{}", event),
            ProgressEvent::FileFinished {
                outcome: FileOutcome::Skipped { .. },
                ..
            } => log::warn!("{}", event),
            _ => log::info!("{}", event),
        }
    }
}
