use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analyze::{AnalysisOptions, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::batch::{BatchOptions, DEFAULT_OUTPUT_SUBDIR};
use crate::ingest::DEFAULT_SAMPLE_FRAMES;
use crate::rotate::DEFAULT_FFMPEG;

const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_MODEL_PATH: &str = "models/yolov8n-pose.onnx";
const DEFAULT_MODEL_SIZE: u32 = 640;

#[derive(Debug, Deserialize, Default)]
struct UprightConfigFile {
    output_subdir: Option<String>,
    analysis: Option<AnalysisConfigFile>,
    model: Option<ModelConfigFile>,
    ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct AnalysisConfigFile {
    sample_frames: Option<usize>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    backend: Option<String>,
    path: Option<PathBuf>,
    input_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UprightConfig {
    pub output_subdir: String,
    pub sample_frames: usize,
    pub confidence_threshold: f32,
    pub model: ModelSettings,
    pub ffmpeg: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub backend: String,
    pub path: PathBuf,
    /// Square model input edge in pixels.
    pub input_size: u32,
}

impl Default for UprightConfig {
    fn default() -> Self {
        Self {
            output_subdir: DEFAULT_OUTPUT_SUBDIR.to_string(),
            sample_frames: DEFAULT_SAMPLE_FRAMES,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            model: ModelSettings {
                backend: DEFAULT_BACKEND.to_string(),
                path: PathBuf::from(DEFAULT_MODEL_PATH),
                input_size: DEFAULT_MODEL_SIZE,
            },
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
        }
    }
}

impl UprightConfig {
    /// Load from the file named by `UPRIGHT_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("UPRIGHT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: UprightConfigFile) -> Self {
        let defaults = Self::default();
        let analysis = file.analysis.unwrap_or_default();
        let model = file.model.unwrap_or_default();
        Self {
            output_subdir: file.output_subdir.unwrap_or(defaults.output_subdir),
            sample_frames: analysis.sample_frames.unwrap_or(defaults.sample_frames),
            confidence_threshold: analysis
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            model: ModelSettings {
                backend: model.backend.unwrap_or(defaults.model.backend),
                path: model.path.unwrap_or(defaults.model.path),
                input_size: model.input_size.unwrap_or(defaults.model.input_size),
            },
            ffmpeg: file.ffmpeg.unwrap_or(defaults.ffmpeg),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(frames) = std::env::var("UPRIGHT_SAMPLE_FRAMES") {
            self.sample_frames = frames
                .trim()
                .parse()
                .map_err(|_| anyhow!("UPRIGHT_SAMPLE_FRAMES must be a positive integer"))?;
        }
        if let Ok(confidence) = std::env::var("UPRIGHT_CONFIDENCE") {
            self.confidence_threshold = confidence
                .trim()
                .parse()
                .map_err(|_| anyhow!("UPRIGHT_CONFIDENCE must be a number"))?;
        }
        if let Ok(subdir) = std::env::var("UPRIGHT_OUTPUT_SUBDIR") {
            if !subdir.trim().is_empty() {
                self.output_subdir = subdir.trim().to_string();
            }
        }
        if let Ok(backend) = std::env::var("UPRIGHT_BACKEND") {
            if !backend.trim().is_empty() {
                self.model.backend = backend.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("UPRIGHT_MODEL") {
            if !path.trim().is_empty() {
                self.model.path = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("UPRIGHT_FFMPEG") {
            if !path.trim().is_empty() {
                self.ffmpeg = PathBuf::from(path);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.analysis_options().validate()?;
        if self.output_subdir.is_empty()
            || self.output_subdir.contains(['/', '\\'])
            || self.output_subdir == "."
            || self.output_subdir == ".."
        {
            return Err(anyhow!(
                "output_subdir must be a plain folder name, got '{}'",
                self.output_subdir
            ));
        }
        if self.model.input_size == 0 || self.model.input_size % 32 != 0 {
            return Err(anyhow!(
                "model input_size must be a positive multiple of 32, got {}",
                self.model.input_size
            ));
        }
        Ok(())
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            sample_frames: self.sample_frames,
            confidence_threshold: self.confidence_threshold,
            ..AnalysisOptions::default()
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            output_subdir: self.output_subdir.clone(),
            analysis: self.analysis_options(),
        }
    }
}

/// `.toml` files parse as TOML, anything else as JSON.
fn read_config_file(path: &Path) -> Result<UprightConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
