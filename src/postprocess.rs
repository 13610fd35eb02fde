//! Optional alpha-channel post-processing
//!
//! Two independent, composable transforms applied between the backend call
//! and the output writer: hard-edge thresholding of the alpha channel, and
//! extraction of the alpha channel as a standalone grayscale mask.

use crate::config::HARD_EDGE_CUTOFF;
use image::{GrayImage, Luma, RgbaImage};

/// Binarize the alpha channel in place: `a > 128` becomes 255, else 0
///
/// Idempotent, since 0 and 255 both map to themselves. Color channels are
/// untouched.
pub fn harden_alpha(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        pixel.0[3] = if pixel.0[3] > HARD_EDGE_CUTOFF { 255 } else { 0 };
    }
}

/// Copy the alpha channel into a new single-channel image, unmodified
///
/// Reflects whatever thresholding was or wasn't applied upstream in the same
/// run; this is a one-way projection, not a transform.
#[must_use]
pub fn extract_alpha_mask(image: &RgbaImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| Luma([image.get_pixel(x, y).0[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([200, 100, 50, ((x + y * width) * 17 % 256) as u8])
        })
    }

    #[test]
    fn test_harden_alpha_binarizes() {
        let mut image = gradient_image(16, 16);
        harden_alpha(&mut image);
        for pixel in image.pixels() {
            assert!(pixel.0[3] == 0 || pixel.0[3] == 255);
        }
    }

    #[test]
    fn test_harden_alpha_cut_point() {
        let mut image = RgbaImage::new(3, 1);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 128]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 129]));
        image.put_pixel(2, 0, Rgba([0, 0, 0, 0]));
        harden_alpha(&mut image);
        // 128 itself is not above the cut point
        assert_eq!(image.get_pixel(0, 0).0[3], 0);
        assert_eq!(image.get_pixel(1, 0).0[3], 255);
        assert_eq!(image.get_pixel(2, 0).0[3], 0);
    }

    #[test]
    fn test_harden_alpha_idempotent() {
        let mut once = gradient_image(8, 8);
        harden_alpha(&mut once);
        let mut twice = once.clone();
        harden_alpha(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_harden_alpha_leaves_color_channels() {
        let mut image = gradient_image(4, 4);
        let before: Vec<[u8; 3]> = image.pixels().map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
        harden_alpha(&mut image);
        let after: Vec<[u8; 3]> = image.pixels().map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_extract_alpha_mask_matches_alpha() {
        let image = gradient_image(9, 7);
        let mask = extract_alpha_mask(&image);
        assert_eq!(mask.dimensions(), image.dimensions());
        for (x, y, pixel) in image.enumerate_pixels() {
            assert_eq!(mask.get_pixel(x, y).0[0], pixel.0[3]);
        }
    }
}
