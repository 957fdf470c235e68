//! Local video files as random-access frame sources.
//!
//! Real files decode through ffmpeg (feature `ingest-file-ffmpeg`). Paths of the
//! form `stub://<frames>[?fail=<i>,<j>...]` open a synthetic clip of gray frames
//! whose listed indices fail to decode, for exercising the pipeline without media.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegVideo;
use super::sampler::{FrameSource, VideoOpener};
use crate::frame::Frame;

const SYNTHETIC_SCHEME: &str = "stub://";
const SYNTHETIC_WIDTH: u32 = 64;
const SYNTHETIC_HEIGHT: u32 = 48;

/// An opened video file.
pub struct VideoFile {
    backend: VideoBackend,
}

enum VideoBackend {
    Synthetic(SyntheticVideo),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegVideo),
}

impl VideoFile {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = path.to_string_lossy();
        if !is_local_file_path(&raw) {
            return Err(anyhow!(
                "{} is not a local video file; stream URLs are not supported",
                raw
            ));
        }
        if let Some(clip) = raw.strip_prefix(SYNTHETIC_SCHEME) {
            return Ok(Self {
                backend: VideoBackend::Synthetic(SyntheticVideo::parse(clip)?),
            });
        }

        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            Ok(Self {
                backend: VideoBackend::Ffmpeg(FfmpegVideo::open(path)?),
            })
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Err(anyhow!(
                "cannot open {}: video decoding requires the ingest-file-ffmpeg feature",
                path.display()
            ))
        }
    }
}

impl FrameSource for VideoFile {
    fn frame_count(&self) -> u64 {
        match &self.backend {
            VideoBackend::Synthetic(video) => video.frames,
            #[cfg(feature = "ingest-file-ffmpeg")]
            VideoBackend::Ffmpeg(video) => video.frame_count(),
        }
    }

    fn frame_at(&mut self, index: u64) -> Result<Frame> {
        match &mut self.backend {
            VideoBackend::Synthetic(video) => video.frame_at(index),
            #[cfg(feature = "ingest-file-ffmpeg")]
            VideoBackend::Ffmpeg(video) => video.frame_at(index),
        }
    }
}

/// Default opener: [`VideoFile::open`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FileOpener;

impl VideoOpener for FileOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(VideoFile::open(path)?))
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticVideo {
    frames: u64,
    failing: HashSet<u64>,
}

impl SyntheticVideo {
    fn parse(clip: &str) -> Result<Self> {
        let (count, query) = match clip.split_once('?') {
            Some((count, query)) => (count, Some(query)),
            None => (clip, None),
        };
        let frames: u64 = count
            .parse()
            .with_context(|| format!("synthetic clip needs a frame count, got '{}'", count))?;

        let mut failing = HashSet::new();
        if let Some(query) = query {
            let list = query
                .strip_prefix("fail=")
                .ok_or_else(|| anyhow!("unsupported synthetic clip option '{}'", query))?;
            for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                failing.insert(
                    entry
                        .parse()
                        .with_context(|| format!("invalid failing frame index '{}'", entry))?,
                );
            }
        }

        log::debug!("opened synthetic clip: {} frames", frames);
        Ok(Self { frames, failing })
    }

    fn frame_at(&mut self, index: u64) -> Result<Frame> {
        if index >= self.frames {
            return Err(anyhow!(
                "frame {} out of range for {}-frame clip",
                index,
                self.frames
            ));
        }
        if self.failing.contains(&index) {
            return Err(anyhow!("synthetic decode failure at frame {}", index));
        }
        let shade = (index % 256) as u8;
        Frame::filled(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, index, [shade, shade, shade])
    }
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with(SYNTHETIC_SCHEME) {
        return true;
    }
    !path.contains("://")
}
