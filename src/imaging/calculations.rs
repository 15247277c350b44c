//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::ScaleFactor;

/// Scale a single edge length, rounding half away from zero.
///
/// Never returns 0: an image cannot be encoded with an empty edge, so tiny
/// results are clamped to one pixel.
pub fn scale_edge(edge: u32, scale: ScaleFactor) -> u32 {
    let scaled = (edge as f64 * scale.value()).round();
    if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}

/// Calculate the target dimensions for a uniform rescale.
///
/// # Arguments
/// * `original` - Source image dimensions (width, height)
/// * `scale` - Factor applied to both edges
///
/// # Returns
/// * `(round(width * scale), round(height * scale))`, each at least 1
pub fn calculate_scaled_dimensions(original: (u32, u32), scale: ScaleFactor) -> (u32, u32) {
    let (w, h) = original;
    (scale_edge(w, scale), scale_edge(h, scale))
}
