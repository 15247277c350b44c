//! Image processing — pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::with_guessed_format` + `into_dimensions` |
//! | **Rescale** | `resize_exact` with bilinear (`Triangle`) filter |
//! | **Re-encode** | `to_rgb8` + `JpegEncoder`, replacing the file in place |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_scaled_dimensions;
pub use operations::{TransformConfig, get_dimensions, plan_rescale, rescale_in_place};
pub use params::{Quality, RescaleParams, ScaleFactor};
pub use rust_backend::RustBackend;
