//! Segmentation session abstraction
//!
//! The pipeline does not know how background removal is implemented; it only
//! drives a [`RemovalSession`]. Sessions are constructed once per batch and
//! reused for every file so model weights load exactly once.

use crate::{config::MattingConfig, error::Result};
use image::{DynamicImage, RgbaImage};

/// Trait for segmentation backends
///
/// Implementations hold whatever long-lived state inference needs (a loaded
/// model, thread pools). The method takes `&mut self` because inference
/// runtimes typically require exclusive access to their session for a run;
/// the batch loop is sequential so this never contends. A later concurrent
/// design would need a mutex or a per-worker session pool.
pub trait RemovalSession {
    /// Remove the background from one image
    ///
    /// Returns an RGBA image of the input's dimensions whose alpha channel
    /// encodes per-pixel foreground confidence. `matting` is `Some` only
    /// when refinement was requested; `None` means the backend applies its
    /// own defaults.
    ///
    /// # Errors
    ///
    /// - Backend inference failures
    /// - Mask generation or alpha application errors
    fn remove(
        &mut self,
        image: &DynamicImage,
        matting: Option<&MattingConfig>,
    ) -> Result<RgbaImage>;

    /// Human-readable backend name for logs and reports
    fn name(&self) -> &str;
}
