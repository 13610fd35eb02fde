//! Configuration types for the batch background removal pipeline

use crate::error::{RemovalError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Alpha value above which a pixel counts as foreground when hard-edge
/// thresholding is applied (`a > 128` becomes 255, everything else 0).
pub const HARD_EDGE_CUTOFF: u8 = 128;

/// Color mode an input image is normalized to before the backend call.
///
/// Segmentation models differ in what they were exported to expect, so this
/// is a configuration option rather than a hard-coded path. Backends must
/// tolerate either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Drop any alpha channel before inference
    Rgb,
    /// Keep/extend to four channels before inference
    Rgba,
}

impl Default for ColorMode {
    fn default() -> Self {
        Self::Rgba
    }
}

impl ColorMode {
    /// Normalize a decoded image to this color mode before the backend call
    #[must_use]
    pub fn normalize(self, image: &image::DynamicImage) -> image::DynamicImage {
        match self {
            Self::Rgb => image::DynamicImage::ImageRgb8(image.to_rgb8()),
            Self::Rgba => image::DynamicImage::ImageRgba8(image.to_rgba8()),
        }
    }
}

/// Alpha-matting refinement parameters, forwarded to the backend unchanged
/// when `enabled` is set. When disabled the backend uses its own defaults
/// (i.e. no refinement) regardless of the threshold fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MattingConfig {
    /// Whether matting refinement is applied at all
    pub enabled: bool,
    /// Alpha values at or above this count as definite foreground (0-255)
    pub foreground_threshold: u8,
    /// Alpha values at or below this count as definite background (0-255)
    pub background_threshold: u8,
    /// Erosion radius applied to the definite-foreground region, in pixels
    pub erode_size: u32,
}

impl Default for MattingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            foreground_threshold: 240,
            background_threshold: 20,
            erode_size: 10,
        }
    }
}

impl MattingConfig {
    /// Validate threshold ordering
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::InvalidConfig` when the background threshold is
    /// not strictly below the foreground threshold.
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.background_threshold >= self.foreground_threshold {
            return Err(RemovalError::invalid_config(format!(
                "background threshold ({}) must be below foreground threshold ({})",
                self.background_threshold, self.foreground_threshold
            )));
        }
        Ok(())
    }
}

/// Unified configuration for the batch removal pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct RemovalConfig {
    /// Path to the ONNX model file (unused by mock sessions)
    pub model_path: Option<PathBuf>,
    /// Color mode inputs are normalized to before the backend call
    pub input_color_mode: ColorMode,
    /// Alpha-matting refinement parameters
    pub matting: MattingConfig,
    /// Binarize the alpha channel at [`HARD_EDGE_CUTOFF`] before writing
    pub hard_edge: bool,
    /// Also write a grayscale `_mask.png` next to each composite
    pub export_mask: bool,
    /// Number of intra-op inference threads (0 = auto)
    pub intra_threads: usize,
    /// Number of inter-op inference threads (0 = auto)
    pub inter_threads: usize,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            input_color_mode: ColorMode::default(),
            matting: MattingConfig::default(),
            hard_edge: false,
            export_mask: false,
            intra_threads: 0,
            inter_threads: 0,
        }
    }
}

impl RemovalConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder::new()
    }

    /// Matting parameters to forward to the backend for a single call.
    ///
    /// Returns `None` when matting is disabled so the backend falls back to
    /// its own defaults instead of reading the unused threshold fields.
    #[must_use]
    pub fn matting_for_call(&self) -> Option<&MattingConfig> {
        self.matting.enabled.then_some(&self.matting)
    }
}

/// Builder for [`RemovalConfig`]
pub struct RemovalConfigBuilder {
    config: RemovalConfig,
}

impl RemovalConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RemovalConfig::default(),
        }
    }

    #[must_use]
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.model_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn input_color_mode(mut self, mode: ColorMode) -> Self {
        self.config.input_color_mode = mode;
        self
    }

    #[must_use]
    pub fn matting(mut self, matting: MattingConfig) -> Self {
        self.config.matting = matting;
        self
    }

    #[must_use]
    pub fn hard_edge(mut self, hard_edge: bool) -> Self {
        self.config.hard_edge = hard_edge;
        self
    }

    #[must_use]
    pub fn export_mask(mut self, export_mask: bool) -> Self {
        self.config.export_mask = export_mask;
        self
    }

    #[must_use]
    pub fn intra_threads(mut self, threads: usize) -> Self {
        self.config.intra_threads = threads;
        self
    }

    #[must_use]
    pub fn inter_threads(mut self, threads: usize) -> Self {
        self.config.inter_threads = threads;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::InvalidConfig` for inconsistent matting
    /// thresholds.
    pub fn build(self) -> Result<RemovalConfig> {
        self.config.matting.validate()?;
        Ok(self.config)
    }
}

impl Default for RemovalConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
