//! Upright: orientation correction for folders of people videos.
//!
//! Each video is sampled at evenly spaced frames and run through a pose
//! estimator. Every confident person detection casts a vote on whether the body
//! lies along the vertical or horizontal axis of the frame and on which side the
//! head sits. The aggregated verdict maps to a rotation that brings the subject
//! upright, applied by an external ffmpeg executor.
//!
//! # Module Structure
//!
//! - `frame`: decoded RGB frames and in-memory quarter-turn rotation
//! - `ingest`: frame sampling and video sources (synthetic `stub://`, ffmpeg)
//! - `detect`: pose backends, keypoint types, YOLOv8-pose decoding
//! - `orientation`: per-detection votes and the aggregated verdict
//! - `plan`: verdict to rotation action lookup
//! - `rotate`: ffmpeg-backed rotation executor
//! - `analyze`: per-video analysis
//! - `batch`, `progress`: folder driver and progress events
//! - `config`: file and environment configuration

pub mod analyze;
pub mod batch;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod orientation;
pub mod plan;
pub mod progress;
pub mod rotate;

pub use analyze::{AnalysisOptions, AnalysisReport, Analyzer, DEFAULT_CONFIDENCE_THRESHOLD};
pub use batch::{
    discover_videos, is_video_file, BatchDriver, BatchOptions, BatchSummary, FileOutcome,
    FileResult, DEFAULT_OUTPUT_SUBDIR, VIDEO_EXTENSIONS,
};
pub use config::{ModelSettings, UprightConfig};
pub use detect::{
    BackendRegistry, Keypoint, KeypointKind, PoseBackend, PoseDetection, PoseSession,
};
pub use frame::Frame;
pub use ingest::{sample_indices, FileOpener, FrameSource, VideoFile, VideoOpener};
pub use orientation::{BodyAxis, HeadPosition, Verdict, VoteTally};
pub use plan::{plan_rotation, RotationAction};
pub use progress::{ChannelReporter, LogReporter, ProgressEvent, ProgressReporter};
pub use rotate::{transpose_filter, FfmpegExecutor, RotateError, RotationExecutor};
