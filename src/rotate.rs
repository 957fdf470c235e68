//! Rotation execution through an external ffmpeg process.
//!
//! The video is re-encoded with a `transpose` filter while the audio stream is
//! copied untouched. A half turn is two clockwise transposes chained in one
//! filter graph rather than a separate transform.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::plan::RotationAction;

/// Default ffmpeg binary, resolved through `PATH`.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

#[derive(Debug, Error)]
pub enum RotateError {
    #[error("invalid rotation direction '{0}' (expected clockwise, counterclockwise or 180)")]
    InvalidDirection(String),

    #[error("{0} is a copy action, not a rotation")]
    NotARotation(RotationAction),

    #[error("failed to launch {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with {status}: {stderr}")]
    ToolFailed {
        binary: String,
        status: String,
        stderr: String,
    },
}

/// Applies a rotation to a video file.
pub trait RotationExecutor: Send {
    /// Rotate `input` into `output`, overwriting `output` if present.
    ///
    /// Copy actions are rejected before any process is spawned.
    fn rotate(&self, input: &Path, output: &Path, action: RotationAction)
        -> Result<(), RotateError>;
}

/// `transpose` filter graph for a rotation action.
pub fn transpose_filter(action: RotationAction) -> Result<&'static str, RotateError> {
    match action {
        RotationAction::RotateCw90 => Ok("transpose=1"),
        RotationAction::RotateCcw90 => Ok("transpose=2"),
        RotationAction::Rotate180 => Ok("transpose=1,transpose=1"),
        RotationAction::Identity | RotationAction::Unknown => {
            Err(RotateError::NotARotation(action))
        }
    }
}

/// Executor that shells out to ffmpeg.
#[derive(Clone, Debug)]
pub struct FfmpegExecutor {
    binary: PathBuf,
}

impl FfmpegExecutor {
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command-line arguments for one rotation.
    pub fn args(
        &self,
        input: &Path,
        output: &Path,
        action: RotationAction,
    ) -> Result<Vec<OsString>, RotateError> {
        let filter = transpose_filter(action)?;
        Ok(vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-vf".into(),
            filter.into(),
            "-c:a".into(),
            "copy".into(),
            "-y".into(),
            output.as_os_str().to_owned(),
        ])
    }
}

impl Default for FfmpegExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG)
    }
}

impl RotationExecutor for FfmpegExecutor {
    fn rotate(
        &self,
        input: &Path,
        output: &Path,
        action: RotationAction,
    ) -> Result<(), RotateError> {
        let args = self.args(input, output, action)?;
        let binary = self.binary.display().to_string();
        log::debug!("running {} {:?}", binary, args);

        let result = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| RotateError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(RotateError::ToolFailed {
                binary,
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        log::info!("rotated {} -> {} ({})", input.display(), output.display(), action);
        Ok(())
    }
}
