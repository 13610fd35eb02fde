//! Shared fixtures for integration tests

#![allow(unreachable_pub)]

use bgbatch::{MattingConfig, RemovalSession, Result};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Write a small solid-color PNG fixture
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
    let img = RgbImage::from_pixel(width, height, Rgb([170, 80, 40]));
    img.save_with_format(dir.join(name), image::ImageFormat::Png)
        .expect("Failed to write PNG fixture");
}

/// Write a small solid-color JPEG fixture
pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 120, 200]));
    img.save_with_format(dir.join(name), image::ImageFormat::Jpeg)
        .expect("Failed to write JPEG fixture");
}

/// Deterministic stand-in backend for pipeline-level tests
///
/// Produces an alpha channel that depends only on pixel coordinates, so
/// re-running a batch over the same inputs yields byte-identical outputs.
/// Records the matting parameters the pipeline forwarded on each call.
pub struct ScriptedSession {
    recorded_matting: Arc<Mutex<Vec<Option<MattingConfig>>>>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            recorded_matting: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn recorded_matting(&self) -> Arc<Mutex<Vec<Option<MattingConfig>>>> {
        Arc::clone(&self.recorded_matting)
    }
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RemovalSession for ScriptedSession {
    fn remove(
        &mut self,
        image: &DynamicImage,
        matting: Option<&MattingConfig>,
    ) -> Result<RgbaImage> {
        self.recorded_matting
            .lock()
            .expect("fixture lock poisoned")
            .push(matting.copied());

        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let pixel = rgba.get_pixel(x, y);
            // Diagonal gradient: transparent at the origin, opaque far corner
            let alpha = (255 * (x + y) / (width + height).max(1)) as u8;
            Rgba([pixel.0[0], pixel.0[1], pixel.0[2], alpha])
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
