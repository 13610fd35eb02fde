//! Core types for background removal results

use crate::error::{RemovalError, Result};
use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-pixel foreground confidence derived from the backend's alpha channel
///
/// Values run 0 (fully background) to 255 (fully foreground); spatial
/// dimensions always match the image the mask was cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaMask {
    /// Mask data as grayscale values (0-255), row-major
    pub data: Vec<u8>,
    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl AlphaMask {
    /// Create a new alpha mask
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Processing` when `data` does not cover
    /// `width * height` pixels.
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Result<Self> {
        let expected = dimensions.0 as usize * dimensions.1 as usize;
        if data.len() != expected {
            return Err(RemovalError::processing(format!(
                "mask data length {} does not match {}x{} dimensions",
                data.len(),
                dimensions.0,
                dimensions.1
            )));
        }
        Ok(Self { data, dimensions })
    }

    /// Mask value at pixel coordinates, 0 outside the mask area
    #[must_use]
    pub fn value_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.dimensions.0 || y >= self.dimensions.1 {
            return 0;
        }
        let index = (y * self.dimensions.0 + x) as usize;
        self.data.get(index).copied().unwrap_or(0)
    }

    /// Convert to a single-channel (`L`) image buffer
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Processing` if the buffer cannot be assembled
    /// (dimension/data mismatch).
    pub fn to_gray_image(&self) -> Result<GrayImage> {
        GrayImage::from_raw(self.dimensions.0, self.dimensions.1, self.data.clone()).ok_or_else(
            || RemovalError::processing("mask data does not fit its dimensions"),
        )
    }

    /// Save the mask as a grayscale PNG
    ///
    /// # Errors
    ///
    /// Propagates image encoding and file I/O failures.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_gray_image()?
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Timing breakdown for a single file's trip through the pipeline
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Image decode time in milliseconds
    pub decode_ms: u64,
    /// Backend removal (preprocess + inference + mask) time in milliseconds
    pub inference_ms: u64,
    /// Alpha post-processing time in milliseconds
    pub postprocess_ms: u64,
    /// PNG encode time in milliseconds (set once written)
    pub encode_ms: Option<u64>,
    /// End-to-end time in milliseconds
    pub total_ms: u64,
}

/// Result of a background removal operation for one input image
#[derive(Debug, Clone)]
pub struct RemovalResult {
    /// The RGBA composite with background pixels made transparent
    pub image: RgbaImage,
    /// The alpha mask the composite was cut with
    pub mask: AlphaMask,
    /// Original input dimensions (width, height)
    pub original_dimensions: (u32, u32),
    /// Timing breakdown for this file
    pub timings: ProcessingTimings,
}

impl RemovalResult {
    /// Create a new removal result
    #[must_use]
    pub fn new(
        image: RgbaImage,
        mask: AlphaMask,
        original_dimensions: (u32, u32),
        timings: ProcessingTimings,
    ) -> Self {
        Self {
            image,
            mask,
            original_dimensions,
            timings,
        }
    }

    /// Result dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Save the composite as an RGBA PNG and record the encode time
    ///
    /// # Errors
    ///
    /// Propagates image encoding and file I/O failures.
    pub fn save_png<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let encode_start = instant::Instant::now();
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        self.timings.encode_ms = Some(encode_start.elapsed().as_millis() as u64);
        Ok(())
    }
}
