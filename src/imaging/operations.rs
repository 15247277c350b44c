//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_scaled_dimensions;
use super::params::{Quality, RescaleParams, ScaleFactor};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Settings for the transform step applied to every downloaded image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformConfig {
    pub scale: ScaleFactor,
    pub quality: Quality,
}

/// Plan a rescale operation without executing it.
pub fn plan_rescale(path: &Path, original: (u32, u32), config: &TransformConfig) -> RescaleParams {
    let (width, height) = calculate_scaled_dimensions(original, config.scale);
    RescaleParams {
        path: path.to_path_buf(),
        width,
        height,
        quality: config.quality,
    }
}

/// Rescale the image at `path` by the configured factor and overwrite it as JPEG.
///
/// Returns the dimensions of the written image.
pub fn rescale_in_place(
    backend: &impl ImageBackend,
    path: &Path,
    config: &TransformConfig,
) -> Result<Dimensions> {
    let original = get_dimensions(backend, path)?;
    let params = plan_rescale(path, original, config);
    backend.rescale(&params)
}
