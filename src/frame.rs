//! Decoded video frames.
//!
//! - `Frame`: packed RGB24 pixels for one sampled frame, tagged with its index.
//! - Quarter-turn rotation on the pixel plane. The half turn is defined as two
//!   clockwise quarter turns, so every rotation reduces to one primitive.
//!
//! Frames are transient: the sampler hands each one to the pose backend and it is
//! dropped once its votes are cast. Only the analysis snapshot outlives that.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::plan::RotationAction;

/// Bytes per RGB24 pixel.
pub const RGB_CHANNELS: usize = 3;

/// One decoded RGB24 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Index of this frame within its video stream.
    pub index: u64,
}

impl Frame {
    /// Wrap packed RGB24 pixel data. The buffer length must equal `width * height * 3`.
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = expected_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            index,
        })
    }

    /// Uniformly filled frame.
    pub fn filled(width: u32, height: u32, index: u64, rgb: [u8; 3]) -> Result<Self> {
        let len = expected_len(width, height)?;
        let data = rgb.iter().copied().cycle().take(len).collect();
        Self::new(data, width, height, index)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// RGB value at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * RGB_CHANNELS;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Rotate 90° clockwise. Width and height swap.
    pub fn rotate_cw(&self) -> Self {
        self.remap(|nx, ny, _w, h| (ny, h - 1 - nx))
    }

    /// Rotate 90° counter-clockwise. Width and height swap.
    pub fn rotate_ccw(&self) -> Self {
        self.remap(|nx, ny, w, _h| (w - 1 - ny, nx))
    }

    /// Rotate 180°, composed from two clockwise quarter turns.
    pub fn rotate_180(&self) -> Self {
        self.rotate_cw().rotate_cw()
    }

    /// Apply the pixel-plane transform a rotation action stands for.
    ///
    /// Copy actions (identity and undetermined) return the frame unchanged.
    pub fn rotated(&self, action: RotationAction) -> Self {
        match action.clockwise_quarter_turns() {
            1 => self.rotate_cw(),
            2 => self.rotate_180(),
            3 => self.rotate_ccw(),
            _ => self.clone(),
        }
    }

    /// Write the frame as a JPEG image.
    pub fn save_jpeg(&self, path: &Path) -> Result<()> {
        let image = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
        image
            .save_with_format(path, image::ImageFormat::Jpeg)
            .with_context(|| format!("failed to write snapshot {}", path.display()))
    }

    /// Build the rotated frame. `source_of(nx, ny, w, h)` maps an output coordinate to
    /// the source coordinate, where `w`/`h` are the source dimensions.
    fn remap(&self, source_of: impl Fn(u32, u32, u32, u32) -> (u32, u32)) -> Self {
        let (w, h) = (self.width, self.height);
        let (out_w, out_h) = (h, w);
        let mut data = Vec::with_capacity(self.data.len());
        for ny in 0..out_h {
            for nx in 0..out_w {
                let (sx, sy) = source_of(nx, ny, w, h);
                let idx = (sy as usize * w as usize + sx as usize) * RGB_CHANNELS;
                data.extend_from_slice(&self.data[idx..idx + RGB_CHANNELS]);
            }
        }
        Self {
            data,
            width: out_w,
            height: out_h,
            index: self.index,
        }
    }
}

fn expected_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(RGB_CHANNELS))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x2 frame where every pixel encodes its own coordinates.
    fn coordinate_frame() -> Frame {
        let (w, h) = (3u32, 2u32);
        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&[x as u8, y as u8, 7]);
            }
        }
        Frame::new(data, w, h, 4).unwrap()
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(Frame::new(vec![0; 5], 2, 1, 0).is_err());
    }

    #[test]
    fn clockwise_moves_bottom_left_to_top_left() {
        let frame = coordinate_frame();
        let rotated = frame.rotate_cw();
        assert_eq!((rotated.width, rotated.height), (2, 3));
        // Source bottom-left (0,1) lands at the top-left after a clockwise turn.
        assert_eq!(rotated.pixel(0, 0), Some([0, 1, 7]));
        // Source top-left (0,0) lands at the top-right.
        assert_eq!(rotated.pixel(1, 0), Some([0, 0, 7]));
        assert_eq!(rotated.index, 4);
    }

    #[test]
    fn counter_clockwise_moves_top_right_to_top_left() {
        let rotated = coordinate_frame().rotate_ccw();
        assert_eq!((rotated.width, rotated.height), (2, 3));
        assert_eq!(rotated.pixel(0, 0), Some([2, 0, 7]));
        assert_eq!(rotated.pixel(0, 2), Some([0, 0, 7]));
    }

    #[test]
    fn opposite_quarter_turns_restore_the_frame() {
        let frame = coordinate_frame();
        assert_eq!(frame.rotate_cw().rotate_ccw(), frame);
        assert_eq!(frame.rotate_ccw().rotate_cw(), frame);
    }

    #[test]
    fn half_turn_equals_two_clockwise_turns() {
        let frame = coordinate_frame();
        let half = frame.rotated(RotationAction::Rotate180);
        assert_eq!((half.width, half.height), (3, 2));
        assert_eq!(half.pixel(0, 0), Some([2, 1, 7]));
        assert_eq!(half.rotate_180(), frame);
        assert_eq!(
            frame.rotate_ccw().rotate_ccw(),
            frame.rotated(RotationAction::Rotate180)
        );
    }

    #[test]
    fn copy_actions_leave_pixels_alone() {
        let frame = coordinate_frame();
        assert_eq!(frame.rotated(RotationAction::Identity), frame);
        assert_eq!(frame.rotated(RotationAction::Unknown), frame);
    }

    #[test]
    fn quarter_turn_actions_dispatch_to_matching_rotation() {
        let frame = coordinate_frame();
        assert_eq!(frame.rotated(RotationAction::RotateCw90), frame.rotate_cw());
        assert_eq!(frame.rotated(RotationAction::RotateCcw90), frame.rotate_ccw());
    }
}
