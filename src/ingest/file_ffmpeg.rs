//! Local file frame access using FFmpeg.
//!
//! Frames are addressed by index. Each lookup seeks to the closest keyframe at or
//! before the target and decodes forward until the target frame is reached.
//! Demuxer, decoder and scaler are released when the value is dropped.

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;
use std::path::Path;

use crate::frame::Frame;

const MICROS_PER_SEC: i128 = 1_000_000;

pub(crate) struct FfmpegVideo {
    path: String,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    time_base: (i128, i128),
    frame_rate: (i128, i128),
    start_pts: i64,
    frame_count: u64,
}

impl FfmpegVideo {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let display = path.display().to_string();
        let input = ffmpeg::format::input(&path)
            .with_context(|| format!("failed to open video '{}' with ffmpeg", display))?;
        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("'{}' has no video track", display))?;
        let stream_index = stream.index();

        let time_base = rational(stream.time_base());
        let frame_rate = {
            let avg = rational(stream.avg_frame_rate());
            if avg.0 > 0 && avg.1 > 0 {
                avg
            } else {
                rational(stream.rate())
            }
        };
        if time_base.0 <= 0 || time_base.1 <= 0 || frame_rate.0 <= 0 || frame_rate.1 <= 0 {
            return Err(anyhow!("'{}' has no usable frame rate or time base", display));
        }
        let start_pts = match stream.start_time() {
            ts if ts == ffmpeg::ffi::AV_NOPTS_VALUE => 0,
            ts => ts,
        };

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else {
            // duration (time base units) * time_base * frame_rate
            let duration = if stream.duration() > 0 {
                i128::from(stream.duration()) * time_base.0 * MICROS_PER_SEC / time_base.1
            } else {
                i128::from(input.duration().max(0))
            };
            (duration * frame_rate.0 / (frame_rate.1 * MICROS_PER_SEC)).max(0) as u64
        };

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::debug!(
            "opened {} (ffmpeg): {} frames at {}/{} fps",
            display,
            frame_count,
            frame_rate.0,
            frame_rate.1
        );

        Ok(Self {
            path: display,
            input,
            stream_index,
            decoder,
            scaler,
            time_base,
            frame_rate,
            start_pts,
            frame_count,
        })
    }

    pub(crate) fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub(crate) fn frame_at(&mut self, index: u64) -> Result<Frame> {
        let offset_us = i128::from(index) * self.frame_rate.1 * MICROS_PER_SEC / self.frame_rate.0;
        let start_us = i128::from(self.start_pts) * self.time_base.0 * MICROS_PER_SEC / self.time_base.1;
        let seek_us = i64::try_from(start_us + offset_us).context("seek target overflows")?;
        let target_pts = self.start_pts
            + i64::try_from(offset_us * self.time_base.1 / (self.time_base.0 * MICROS_PER_SEC))
                .context("frame timestamp overflows")?;

        self.input
            .seek(seek_us, ..seek_us)
            .with_context(|| format!("seek to frame {} in {}", index, self.path))?;
        self.decoder.flush();

        let mut decoded = ffmpeg::frame::Video::empty();
        let mut found = false;
        'packets: for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            self.decoder
                .send_packet(&packet)
                .context("send packet to ffmpeg decoder")?;
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                if reached(&decoded, target_pts) {
                    found = true;
                    break 'packets;
                }
            }
        }

        if !found {
            self.decoder.send_eof().context("flush ffmpeg decoder")?;
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                if reached(&decoded, target_pts) {
                    found = true;
                    break;
                }
            }
        }

        if !found {
            return Err(anyhow!("{} ended before frame {}", self.path, index));
        }
        self.convert(&decoded, index)
    }

    fn convert(&mut self, decoded: &ffmpeg::frame::Video, index: u64) -> Result<Frame> {
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb_frame)
            .context("scale frame to RGB")?;
        let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;
        Frame::new(pixels, width, height, index)
    }
}

/// Frames without timestamps are taken as-is.
fn reached(frame: &ffmpeg::frame::Video, target_pts: i64) -> bool {
    frame
        .timestamp()
        .or(frame.pts())
        .map_or(true, |pts| pts >= target_pts)
}

fn rational(value: ffmpeg::Rational) -> (i128, i128) {
    (
        i128::from(value.numerator()),
        i128::from(value.denominator()),
    )
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        let pixels = data
            .get(..row_bytes * height as usize)
            .context("ffmpeg frame is shorter than its dimensions")?;
        return Ok((pixels.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
