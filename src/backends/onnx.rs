//! ONNX Runtime segmentation backend
//!
//! Loads a segmentation model from a local `.onnx` file and runs it on CPU.
//! The session is built once and reused for every image in the batch, so the
//! model load cost is paid exactly once per run.

use crate::{
    config::{MattingConfig, RemovalConfig},
    error::{RemovalError, Result},
    matting,
    session::RemovalSession,
    types::AlphaMask,
};
use image::{DynamicImage, Rgba, RgbaImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::{self, value::Value};
use std::path::Path;
use tracing::debug;

/// Model input edge length; inputs are letterboxed to a square of this size
const TARGET_SIZE: u32 = 1024;
/// ImageNet channel means used for input normalization
const NORMALIZATION_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations used for input normalization
const NORMALIZATION_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// ONNX Runtime session for background segmentation models
pub struct OnnxSession {
    session: Session,
    model_name: String,
}

impl std::fmt::Debug for OnnxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSession")
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}

impl OnnxSession {
    /// Create a session from the model file named in the configuration
    ///
    /// # Errors
    ///
    /// - `RemovalError::InvalidConfig` when no model path is configured
    /// - `RemovalError::Io` when the model file cannot be read
    /// - `RemovalError::Inference` when session construction fails
    pub fn from_config(config: &RemovalConfig) -> Result<Self> {
        let model_path = config
            .model_path
            .as_deref()
            .ok_or_else(|| RemovalError::invalid_config("no model path configured"))?;
        Self::from_file(model_path, config.intra_threads, config.inter_threads)
    }

    /// Create a CPU session from a model file
    ///
    /// Thread counts of 0 select defaults from the machine's parallelism:
    /// all cores for intra-op work, a quarter of them (at least one) for
    /// inter-op coordination.
    ///
    /// # Errors
    ///
    /// - `RemovalError::Io` when the model file cannot be read
    /// - `RemovalError::Inference` when session construction fails
    pub fn from_file(
        model_path: &Path,
        intra_threads: usize,
        inter_threads: usize,
    ) -> Result<Self> {
        let load_start = instant::Instant::now();
        let model_data = std::fs::read(model_path)
            .map_err(|e| RemovalError::file_io_error("read model file", model_path, e))?;

        let cores = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(8);
        let intra_threads = if intra_threads > 0 { intra_threads } else { cores };
        let inter_threads = if inter_threads > 0 {
            inter_threads
        } else {
            (cores / 4).max(1)
        };

        // No execution providers registered: ONNX Runtime falls back to CPU,
        // which is the only provider this pipeline targets.
        let session = Session::builder()
            .map_err(|e| RemovalError::inference(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RemovalError::inference(format!("Failed to set optimization level: {e}")))?
            .with_parallel_execution(true)
            .map_err(|e| {
                RemovalError::inference(format!("Failed to enable parallel execution: {e}"))
            })?
            .with_intra_threads(intra_threads)
            .map_err(|e| RemovalError::inference(format!("Failed to set intra threads: {e}")))?
            .with_inter_threads(inter_threads)
            .map_err(|e| RemovalError::inference(format!("Failed to set inter threads: {e}")))?
            .commit_from_memory(&model_data)
            .map_err(|e| {
                RemovalError::inference(format!("Failed to create session from model data: {e}"))
            })?;

        let model_name = model_path
            .file_stem()
            .map_or_else(|| "onnx".to_string(), |s| s.to_string_lossy().into_owned());

        let load_ms = load_start.elapsed().as_millis() as u64;
        debug!(
            model = %model_path.display(),
            size_bytes = model_data.len(),
            intra_threads,
            inter_threads,
            load_ms,
            "ONNX session created (CPU, optimization level 3)"
        );

        Ok(Self {
            session,
            model_name,
        })
    }

    /// Letterbox and normalize an image into an NCHW input tensor
    ///
    /// The image is scaled to fit a `TARGET_SIZE` square preserving aspect
    /// ratio, centered on a white canvas, then normalized per channel with
    /// the ImageNet statistics the supported models were trained with.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn preprocess(image: &DynamicImage) -> Result<Array4<f32>> {
        let rgb_image = image.to_rgb8();
        let (orig_width, orig_height) = rgb_image.dimensions();
        if orig_width == 0 || orig_height == 0 {
            return Err(RemovalError::processing("input image has zero dimensions"));
        }

        let target = TARGET_SIZE as f32;
        let scale = target.min((target / orig_width as f32).min(target / orig_height as f32));
        let new_width = (orig_width as f32 * scale).round() as u32;
        let new_height = (orig_height as f32 * scale).round() as u32;

        let resized = image::imageops::resize(
            &rgb_image,
            new_width,
            new_height,
            image::imageops::FilterType::Triangle,
        );

        let mut canvas =
            image::ImageBuffer::from_pixel(TARGET_SIZE, TARGET_SIZE, image::Rgb([255, 255, 255]));
        let offset_x = (TARGET_SIZE - new_width) / 2;
        let offset_y = (TARGET_SIZE - new_height) / 2;
        for (x, y, pixel) in resized.enumerate_pixels() {
            let canvas_x = x + offset_x;
            let canvas_y = y + offset_y;
            if canvas_x < TARGET_SIZE && canvas_y < TARGET_SIZE {
                canvas.put_pixel(canvas_x, canvas_y, *pixel);
            }
        }

        let size = TARGET_SIZE as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        #[allow(clippy::indexing_slicing)] // tensor pre-allocated to canvas size
        for (y, row) in canvas.rows().enumerate() {
            for (x, pixel) in row.enumerate() {
                for channel in 0..3 {
                    tensor[[0, channel, y, x]] = (f32::from(pixel[channel]) / 255.0
                        - NORMALIZATION_MEAN[channel])
                        / NORMALIZATION_STD[channel];
                }
            }
        }

        Ok(tensor)
    }

    /// Run the model on a preprocessed input tensor
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let input_value = Value::from_array(input.clone())
            .map_err(|e| RemovalError::processing(format!("Failed to convert input tensor: {e}")))?;

        // Positional inputs: avoids a dependency on tensor names, which vary
        // across model exports
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| RemovalError::inference(format!("ONNX inference failed: {e}")))?;

        let keys: Vec<_> = outputs.keys().collect();
        let first_key = keys
            .first()
            .ok_or_else(|| RemovalError::processing("No output tensors found"))?;
        let output_tensor = outputs
            .get(first_key)
            .ok_or_else(|| RemovalError::processing("First output tensor not found"))?
            .try_extract_array::<f32>()
            .map_err(|e| {
                RemovalError::processing(format!("Failed to extract output tensor: {e}"))
            })?;

        let output_shape = output_tensor.shape();
        if output_shape.len() != 4 {
            return Err(RemovalError::processing(format!(
                "Expected 4D output tensor, got {}D",
                output_shape.len()
            )));
        }
        let output_data = output_tensor.view().to_owned();
        Array4::from_shape_vec(
            (
                output_shape.first().copied().unwrap_or(1),
                output_shape.get(1).copied().unwrap_or(1),
                output_shape.get(2).copied().unwrap_or(1),
                output_shape.get(3).copied().unwrap_or(1),
            ),
            output_data.into_raw_vec_and_offset().0,
        )
        .map_err(|e| RemovalError::processing(format!("Failed to reshape output tensor: {e}")))
    }

    /// Map the model's letterboxed output back onto the original image grid
    ///
    /// Inverts the preprocessing transform: for each original pixel, find its
    /// position in the scaled-and-centered tensor and sample the confidence
    /// there. Coordinates that land outside the tensor read as background.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn tensor_to_mask(output: &Array4<f32>, original_dimensions: (u32, u32)) -> Result<AlphaMask> {
        let shape = output.shape();
        let (Some(&batch), Some(&channels), Some(&tensor_height), Some(&tensor_width)) =
            (shape.first(), shape.get(1), shape.get(2), shape.get(3))
        else {
            return Err(RemovalError::processing("output tensor missing dimensions"));
        };
        if batch != 1 || channels != 1 {
            return Err(RemovalError::processing(format!(
                "expected [1, 1, H, W] mask tensor, got {shape:?}"
            )));
        }

        let (orig_width, orig_height) = original_dimensions;
        let tensor_size = tensor_width.min(tensor_height) as f32;
        let scale =
            tensor_size.min((tensor_size / orig_width as f32).min(tensor_size / orig_height as f32));
        let scaled_width = (orig_width as f32 * scale).round() as usize;
        let scaled_height = (orig_height as f32 * scale).round() as usize;
        let offset_x = (tensor_width - scaled_width.min(tensor_width)) / 2;
        let offset_y = (tensor_height - scaled_height.min(tensor_height)) / 2;

        let mut data = Vec::with_capacity(orig_width as usize * orig_height as usize);
        for y in 0..orig_height {
            for x in 0..orig_width {
                let tensor_x = (x as f32 * scale).round() as usize + offset_x;
                let tensor_y = (y as f32 * scale).round() as usize + offset_y;
                let value = if tensor_x < tensor_width && tensor_y < tensor_height {
                    output.get([0, 0, tensor_y, tensor_x]).copied().unwrap_or(0.0)
                } else {
                    0.0
                };
                data.push((value.clamp(0.0, 1.0) * 255.0) as u8);
            }
        }

        AlphaMask::new(data, original_dimensions)
    }

    /// Cut the original image with the mask: mask becomes the alpha channel,
    /// fully-background pixels are cleared to transparent black
    fn apply_mask(image: &DynamicImage, mask: &AlphaMask) -> RgbaImage {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        RgbaImage::from_fn(width, height, |x, y| {
            let alpha = mask.value_at(x, y);
            if alpha > 0 {
                let pixel = rgba.get_pixel(x, y);
                Rgba([pixel.0[0], pixel.0[1], pixel.0[2], alpha])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }
}

impl RemovalSession for OnnxSession {
    fn remove(
        &mut self,
        image: &DynamicImage,
        matting: Option<&MattingConfig>,
    ) -> Result<RgbaImage> {
        let input = Self::preprocess(image)?;
        let output = self.infer(&input)?;
        let mut mask = Self::tensor_to_mask(&output, (image.width(), image.height()))?;
        if let Some(matting) = matting {
            mask = matting::refine_alpha(&mask, matting)?;
        }
        Ok(Self::apply_mask(image, &mask))
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
