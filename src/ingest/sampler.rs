use std::path::Path;

use anyhow::Result;

use crate::frame::Frame;

/// Default number of frames sampled per video.
pub const DEFAULT_SAMPLE_FRAMES: usize = 20;

/// Random-access frame source for one opened video.
///
/// Dropping the source releases its decoder and demuxer handles.
pub trait FrameSource {
    /// Total frames in the video stream, as reported by the container.
    fn frame_count(&self) -> u64;

    /// Seek to `index` and decode that frame.
    fn frame_at(&mut self, index: u64) -> Result<Frame>;
}

/// Opens videos as frame sources.
pub trait VideoOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>>;
}

/// `count` indices evenly spaced over `[0, total - 1]`, truncated toward zero.
///
/// The first index is 0 and, for `count > 1`, the last is `total - 1`. Indices
/// repeat when `total < count`. Positions are exact rationals, so where a
/// floating-point linspace lands just below an integer this returns the integer.
pub fn sample_indices(total: u64, count: usize) -> Vec<u64> {
    let last = u128::from(total.saturating_sub(1));
    match count {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let steps = (count - 1) as u128;
            (0..count as u128)
                .map(|i| (i * last / steps) as u64)
                .collect()
        }
    }
}
