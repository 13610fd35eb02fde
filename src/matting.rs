//! Trimap-based alpha refinement
//!
//! Backends call [`refine_alpha`] when matting is enabled: the soft mask is
//! split into definite foreground, definite background, and an unknown band.
//! The definite-foreground region is eroded so gradient pixels near the
//! silhouette keep their soft values instead of snapping to opaque, definite
//! background is zeroed, and the unknown band passes through untouched.

use crate::{config::MattingConfig, error::Result, types::AlphaMask};

/// Refine a soft alpha mask using matting thresholds and erosion
///
/// Pixels at or above the foreground threshold become fully opaque after the
/// foreground region survives a square erosion of radius `erode_size`;
/// pixels demoted by the erosion fall back to their soft values. Pixels at
/// or below the background threshold become fully transparent. Everything in
/// between is kept as-is.
///
/// # Errors
///
/// Propagates mask construction failures (dimension mismatches).
pub fn refine_alpha(mask: &AlphaMask, matting: &MattingConfig) -> Result<AlphaMask> {
    let (width, height) = mask.dimensions;
    let foreground: Vec<bool> = mask
        .data
        .iter()
        .map(|&a| a >= matting.foreground_threshold)
        .collect();

    let eroded = erode(&foreground, width as usize, height as usize, matting.erode_size as usize);

    let refined: Vec<u8> = mask
        .data
        .iter()
        .zip(eroded.iter())
        .map(|(&a, &definite_fg)| {
            if definite_fg {
                255
            } else if a <= matting.background_threshold {
                0
            } else {
                a
            }
        })
        .collect();

    AlphaMask::new(refined, mask.dimensions)
}

/// Binary erosion with a square structuring element of the given radius
///
/// Pixels outside the image count as background, so foreground touching the
/// border erodes. Separable min filter: a horizontal pass then a vertical
/// pass over the row-major buffer.
fn erode(mask: &[bool], width: usize, height: usize, radius: usize) -> Vec<bool> {
    if radius == 0 || mask.is_empty() {
        return mask.to_vec();
    }

    let mut horizontal = vec![false; mask.len()];
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            let window_full = x >= radius
                && x + radius < width
                && (lo..=hi).all(|ix| mask.get(row + ix).copied().unwrap_or(false));
            if let Some(slot) = horizontal.get_mut(row + x) {
                *slot = window_full;
            }
        }
    }

    let mut result = vec![false; mask.len()];
    for x in 0..width {
        for y in 0..height {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(height - 1);
            let window_full = y >= radius
                && y + radius < height
                && (lo..=hi).all(|iy| horizontal.get(iy * width + x).copied().unwrap_or(false));
            if let Some(slot) = result.get_mut(y * width + x) {
                *slot = window_full;
            }
        }
    }

    result
}
