//! Pure Rust image processing backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Triangle` (bilinear) filter |
//! | Color conversion | `DynamicImage::to_rgb8` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Downloaded files are always named `<name>.jpeg` even when the server sent a
//! PNG or WebP, so the decoder is chosen from the file's magic bytes rather
//! than from its extension.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::RescaleParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Upper bound on output pixels (16384²). Guards against a scale factor or a
/// crafted header asking for an allocation the process cannot satisfy.
const MAX_OUTPUT_PIXELS: u64 = 16384 * 16384;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_sniffed(
    path: &Path,
) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_sniffed(path)?
        .decode()
        .map_err(|e| BackendError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Sibling path used while encoding, renamed over the target on success.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn encode_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    writer.flush()?;
    Ok(())
}

/// Encode as JPEG and atomically replace `path`.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), BackendError> {
    let tmp = temp_sibling(path);
    if let Err(e) = encode_jpeg(img, &tmp, quality) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_sniffed(path)?.into_dimensions().map_err(|e| {
            BackendError::Decode {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Dimensions { width, height })
    }

    fn rescale(&self, params: &RescaleParams) -> Result<Dimensions, BackendError> {
        let pixels = params.width as u64 * params.height as u64;
        if pixels > MAX_OUTPUT_PIXELS {
            return Err(BackendError::ProcessingFailed(format!(
                "target size {}x{} exceeds the {} pixel limit",
                params.width, params.height, MAX_OUTPUT_PIXELS
            )));
        }

        let img = load_image(&params.path)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Triangle);
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        save_jpeg(&rgb, &params.path, params.quality.value())?;

        Ok(Dimensions {
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}
