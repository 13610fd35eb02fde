//! Mock session for unit tests
//!
//! Produces a deterministic radial soft mask without loading a model, and
//! records what the pipeline passed in so tests can assert on forwarding.

use crate::{config::MattingConfig, error::Result, session::RemovalSession};
use image::{ColorType, DynamicImage, Rgba, RgbaImage};
use std::sync::{Arc, Mutex};

/// Deterministic stand-in for a real segmentation backend
///
/// The alpha channel it produces is a radial gradient: opaque at the image
/// center falling off toward the corners, so downstream thresholding and
/// matting code sees a realistic mix of values.
pub struct MockRemovalSession {
    recorded_matting: Arc<Mutex<Vec<Option<MattingConfig>>>>,
    seen_color_types: Arc<Mutex<Vec<ColorType>>>,
    fail_with: Option<String>,
}

impl MockRemovalSession {
    pub fn new() -> Self {
        Self {
            recorded_matting: Arc::new(Mutex::new(Vec::new())),
            seen_color_types: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// A session whose `remove` always fails with the given message
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Handle to the matting parameters observed per call
    pub fn recorded_matting(&self) -> Arc<Mutex<Vec<Option<MattingConfig>>>> {
        Arc::clone(&self.recorded_matting)
    }

    /// Handle to the input color types observed per call
    pub fn seen_color_types(&self) -> Arc<Mutex<Vec<ColorType>>> {
        Arc::clone(&self.seen_color_types)
    }
}

impl Default for MockRemovalSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RemovalSession for MockRemovalSession {
    fn remove(
        &mut self,
        image: &DynamicImage,
        matting: Option<&MattingConfig>,
    ) -> Result<RgbaImage> {
        self.recorded_matting
            .lock()
            .expect("mock lock poisoned")
            .push(matting.copied());
        self.seen_color_types
            .lock()
            .expect("mock lock poisoned")
            .push(image.color());

        if let Some(message) = &self.fail_with {
            return Err(crate::error::RemovalError::inference(message.clone()));
        }

        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let center_x = f64::from(width) / 2.0;
        let center_y = f64::from(height) / 2.0;
        let max_distance = center_x.hypot(center_y).max(1.0);

        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let distance = (f64::from(x) - center_x).hypot(f64::from(y) - center_y);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let alpha = (255.0 * (1.0 - distance / max_distance)).round() as u8;
            let pixel = rgba.get_pixel(x, y);
            Rgba([pixel.0[0], pixel.0[1], pixel.0[2], alpha])
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_mask_is_radial() {
        let mut session = MockRemovalSession::new();
        let image = DynamicImage::ImageRgba8(RgbaImage::new(11, 11));
        let result = session.remove(&image, None).unwrap();
        let center = result.get_pixel(5, 5).0[3];
        let corner = result.get_pixel(0, 0).0[3];
        assert!(center > 200);
        assert!(corner < 50);
    }

    #[test]
    fn test_mock_failure_mode() {
        let mut session = MockRemovalSession::failing("weights on fire");
        let image = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        let err = session.remove(&image, None).unwrap_err();
        assert!(err.to_string().contains("weights on fire"));
    }
}
