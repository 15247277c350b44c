//! Shared test utilities: synthetic images, log capture, throwaway configs.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let config = test_config(tmp.path());
//! write_input(&config, &["alice;http://127.0.0.1:9/a.png"]);
//!
//! let (_guard, logs) = capture_logs();
//! // ... run something ...
//! assert!(logs.contents().contains("Job is done!"));
//! ```

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageEncoder, ImageFormat, ImageReader, RgbImage, RgbaImage};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::BatchConfig;
use crate::fetch::RetryPolicy;
use crate::logging::build_subscriber;

// =========================================================================
// Synthetic images
// =========================================================================

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Encode an RGBA PNG (4 channels, partly transparent) in memory.
pub fn png_rgba_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 64, (y % 256) as u8, if x % 2 == 0 { 255 } else { 0 }])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Write an RGBA PNG to `path`, whatever its extension says.
pub fn create_test_png_rgba(path: &Path, width: u32, height: u32) {
    std::fs::write(path, png_rgba_bytes(width, height)).unwrap();
}

/// Decode a file by sniffing its content.
pub fn decode_file(path: &Path) -> DynamicImage {
    ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .decode()
        .unwrap()
}

// =========================================================================
// Log capture
// =========================================================================

/// In-memory log sink usable as a `tracing-subscriber` writer.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(Arc::clone(&self.0))
    }
}

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

/// Route this thread's `tracing` events into a buffer until the guard drops.
///
/// Works with `#[tokio::test]`, whose default runtime polls on the test thread.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = build_subscriber(EnvFilter::new("debug"), logs.clone());
    (tracing::subscriber::set_default(subscriber), logs)
}

// =========================================================================
// Config fixtures
// =========================================================================

/// Config rooted in `dir`: input `dir/list.txt`, images in `dir/avs/`,
/// single download attempt.
pub fn test_config(dir: &Path) -> BatchConfig {
    let mut config = BatchConfig::default();
    config.input.path = dir.join("list.txt");
    config.output.base_dir = dir.to_path_buf();
    config.download.max_retries = RetryPolicy::none().max_retries;
    config.download.timeout_secs = 10;
    config.log.file = dir.join("error_log.txt");
    config
}

/// Write `lines` to the config's input file, newline-terminated.
pub fn write_input(config: &BatchConfig, lines: &[&str]) {
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(&config.input.path, content).unwrap();
}
