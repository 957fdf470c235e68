#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::PoseBackend;
use crate::detect::decode::{decode_pose_output, DecodeParams, POSE_CHANNELS};
use crate::detect::result::PoseDetection;
use crate::frame::Frame;

type PosePlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Tract-based pose backend for YOLOv8-pose ONNX models.
///
/// Frames of any size are resized to the model input before inference and the
/// keypoints are scaled back to frame pixels.
pub struct TractBackend {
    model: Option<PosePlan>,
    width: u32,
    height: u32,
    decode: DecodeParams,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "loaded pose model {} ({}x{})",
            model_path.display(),
            width,
            height
        );

        Ok(Self {
            model: Some(model),
            width,
            height,
            decode: DecodeParams::default(),
        })
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        let image = image::RgbImage::from_raw(frame.width, frame.height, frame.pixels().to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
        let resized = image::imageops::resize(
            &image,
            self.width,
            self.height,
            image::imageops::FilterType::Triangle,
        );

        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, self.width as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );
        Ok(input.into_tensor())
    }
}

impl PoseBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<PoseDetection>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("tract backend used after shutdown"))?;
        let input = self.build_input(frame)?;
        let outputs = model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let shape = view.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] != POSE_CHANNELS {
            return Err(anyhow!(
                "unexpected pose output shape {:?}, expected [1, {}, N]",
                shape,
                POSE_CHANNELS
            ));
        }
        let anchors = shape[2];
        let data: Vec<f32> = view.iter().copied().collect();

        let params = DecodeParams {
            x_scale: frame.width as f32 / self.width as f32,
            y_scale: frame.height as f32 / self.height as f32,
            ..self.decode
        };
        Ok(decode_pose_output(&data, anchors, params))
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = Frame::filled(self.width, self.height, 0, [0, 0, 0])?;
        self.detect(&blank).map(|_| ())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.model = None;
        Ok(())
    }
}
