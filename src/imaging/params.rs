//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the high-level [`operations`](super::operations) module (which decides the
//! target size) and the [`backend`](super::backend) (which does the pixel
//! work), so a mock backend can stand in during tests.
//!
//! ## Types
//!
//! - [`Quality`] — JPEG encoding quality (1–100, default 75). Clamped on construction.
//! - [`ScaleFactor`] — Multiplier applied to both edges. Must be finite and positive.
//! - [`RescaleParams`] — Full specification for an in-place rescale: path, target dimensions, quality.

use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Uniform scale factor applied to width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Returns `None` for zero, negative, NaN or infinite factors.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(1.5)
    }
}

/// Parameters for rescaling an image file in place.
///
/// The backend decodes `path`, resizes to exactly `width`×`height` with
/// bilinear filtering, converts to RGB8 and writes a JPEG back to `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct RescaleParams {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
