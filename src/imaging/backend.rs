//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the batch needs:
//! identify (read dimensions) and rescale (resize + RGB convert + JPEG encode,
//! in place).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests substitute a recording mock.

use super::params::RescaleParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions. The format is sniffed from the file content,
    /// not its extension.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Rescale the image at `params.path` and overwrite it as JPEG.
    ///
    /// On error the file at `params.path` is left untouched.
    fn rescale(&self, params: &RescaleParams) -> Result<Dimensions, BackendError>;
}
