//! Frame sampling from video files.
//!
//! - `sampler`: evenly spaced index selection and the `FrameSource` /
//!   `VideoOpener` seams the analyzer drives.
//! - `file`: local video files (ffmpeg, feature: ingest-file-ffmpeg) and
//!   synthetic `stub://` clips for tests.
//!
//! Sources decode one frame per request and hand it over by value. Nothing is
//! cached between requests.

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod sampler;

pub use file::{FileOpener, VideoFile};
pub use sampler::{sample_indices, FrameSource, VideoOpener, DEFAULT_SAMPLE_FRAMES};
