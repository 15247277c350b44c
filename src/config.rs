//! Batch configuration.
//!
//! Every path and tunable the batch uses lives here instead of in the code:
//! the input list, the output directory layout, the scale factor, the JPEG
//! quality, HTTP timeouts and retries, and the log file.
//!
//! ## Config File
//!
//! `imgbatch.toml` in the working directory is picked up automatically; use
//! `--config <path>` to point elsewhere. The file is optional.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [input]
//! path = "1.csv"            # name;url list, one row per line
//! delimiter = ";"           # single character between name and url
//!
//! [output]
//! base_dir = "."            # images go to <base_dir>/<subdir>/<name>.<extension>
//! subdir = "avs"
//! extension = "jpeg"
//! quality = 75              # JPEG quality (1-100)
//!
//! [transform]
//! scale = 1.5               # both edges are multiplied by this, then rounded
//!
//! [download]
//! connect_timeout_secs = 30
//! timeout_secs = 300        # whole request, body included
//! max_retries = 3           # extra attempts for transient failures (0 = none)
//! retry_base_delay_ms = 500
//! retry_max_delay_ms = 8000
//! user_agent = "imgbatch/0.1.0"
//!
//! [log]
//! file = "error_log.txt"    # append-only
//! level = "info"            # RUST_LOG overrides this
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want. User values
//! are merged over the stock defaults before deserializing, and unknown keys
//! are rejected to catch typos early.

use crate::fetch::{FetchConfig, RetryPolicy};
use crate::imaging::{Quality, ScaleFactor, TransformConfig};
use crate::row::is_safe_name;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "imgbatch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Batch configuration loaded from `imgbatch.toml`.
///
/// All fields have defaults matching the classic `1.csv` → `avs/` layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Where the row list comes from.
    pub input: InputConfig,
    /// Where images are written and how they are encoded.
    pub output: OutputConfig,
    /// Resize settings.
    pub transform: TransformSettings,
    /// HTTP behaviour.
    pub download: DownloadConfig,
    /// Log file settings.
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Path to the `name;url` list.
    pub path: PathBuf,
    /// Field delimiter. Exactly one character; whitespace such as `\t` works.
    pub delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("1.csv"),
            delimiter: ";".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Base directory; the image directory is created beneath it.
    pub base_dir: PathBuf,
    /// Image directory name under `base_dir`.
    pub subdir: String,
    /// File extension for saved images (the content is always JPEG).
    pub extension: String,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            subdir: "avs".to_string(),
            extension: "jpeg".to_string(),
            quality: Quality::default().value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSettings {
    /// Multiplier applied to both edges.
    pub scale: f64,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            scale: ScaleFactor::default().value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    pub connect_timeout_secs: u64,
    /// Total time allowed for one request, including the body.
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure. `0` disables retrying.
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 300,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 8000,
            user_agent: concat!("imgbatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Append-only log file.
    pub file: PathBuf,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("error_log.txt"),
            level: "info".to_string(),
        }
    }
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.delimiter.chars().count() != 1 {
            return Err(ConfigError::Validation(
                "input.delimiter must be exactly one character".into(),
            ));
        }
        if ScaleFactor::new(self.transform.scale).is_none() {
            return Err(ConfigError::Validation(
                "transform.scale must be a positive number".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        for (key, value) in [
            ("output.subdir", &self.output.subdir),
            ("output.extension", &self.output.extension),
        ] {
            if value.is_empty() || !is_safe_name(value) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a plain name: non-empty, not `.` or `..`, no path separators"
                )));
            }
        }
        if self.download.timeout_secs == 0 || self.download.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "download timeouts must be non-zero".into(),
            ));
        }
        if self.download.retry_base_delay_ms > self.download.retry_max_delay_ms {
            return Err(ConfigError::Validation(
                "download.retry_base_delay_ms must not exceed retry_max_delay_ms".into(),
            ));
        }
        Ok(())
    }

    /// The single delimiter character. Falls back to `;` on an unvalidated config.
    pub fn delimiter(&self) -> char {
        self.input.delimiter.chars().next().unwrap_or(';')
    }

    /// `<base_dir>/<subdir>`.
    pub fn output_dir(&self) -> PathBuf {
        self.output.base_dir.join(&self.output.subdir)
    }

    /// `<base_dir>/<subdir>/<name>.<extension>`.
    pub fn image_path(&self, name: &str) -> PathBuf {
        self.output_dir()
            .join(format!("{}.{}", name, self.output.extension))
    }

    pub fn transform_config(&self) -> TransformConfig {
        TransformConfig {
            scale: ScaleFactor::new(self.transform.scale).unwrap_or_default(),
            quality: Quality::new(self.output.quality),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let d = &self.download;
        FetchConfig {
            connect_timeout: Duration::from_secs(d.connect_timeout_secs),
            timeout: Duration::from_secs(d.timeout_secs),
            user_agent: d.user_agent.clone(),
            retry: RetryPolicy {
                max_retries: d.max_retries,
                base_delay: Duration::from_millis(d.retry_base_delay_ms),
                max_delay: Duration::from_millis(d.retry_max_delay_ms),
            },
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BatchConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BatchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when the
/// file is absent.
pub fn load_config(path: &Path) -> Result<BatchConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `imgbatch.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgbatch configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Input list
# ---------------------------------------------------------------------------
[input]
# One row per line: <name><delimiter><url>. No header, no quoting.
path = "1.csv"
# Exactly one character. Only the first occurrence on a line splits it.
delimiter = ";"

# ---------------------------------------------------------------------------
# Output images
# ---------------------------------------------------------------------------
[output]
# Images are written to <base_dir>/<subdir>/<name>.<extension>.
base_dir = "."
subdir = "avs"
# The file content is always JPEG; this only names the file.
extension = "jpeg"
# JPEG quality (1 = worst, 100 = best).
quality = 75

# ---------------------------------------------------------------------------
# Resize
# ---------------------------------------------------------------------------
[transform]
# Both edges are multiplied by this factor and rounded (bilinear filter).
scale = 1.5

# ---------------------------------------------------------------------------
# Download
# ---------------------------------------------------------------------------
[download]
connect_timeout_secs = 30
# Whole request including the body.
timeout_secs = 300
# Extra attempts after a transient failure (connect error, timeout, 5xx, 429).
# Set to 0 to try each URL exactly once.
max_retries = 3
retry_base_delay_ms = 500
retry_max_delay_ms = 8000
# user_agent = "imgbatch/<version>"

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[log]
# Append-only text log: timestamp, level, message.
file = "error_log.txt"
# Filter directive; the RUST_LOG environment variable takes precedence.
level = "info"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_classic_layout() {
        let config = BatchConfig::default();
        assert_eq!(config.input.path, PathBuf::from("1.csv"));
        assert_eq!(config.delimiter(), ';');
        assert_eq!(config.output_dir(), PathBuf::from("./avs"));
        assert_eq!(config.image_path("alice"), PathBuf::from("./avs/alice.jpeg"));
        assert_eq!(config.transform.scale, 1.5);
        assert_eq!(config.output.quality, 75);
        assert_eq!(config.log.file, PathBuf::from("error_log.txt"));
    }

    #[test]
    fn default_config_is_valid() {
        BatchConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[transform]
scale = 2.0
"##;
        let config: BatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.transform.scale, 2.0);
        // Defaults preserved
        assert_eq!(config.output.subdir, "avs");
        assert_eq!(config.download.max_retries, 3);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r##"
[output]
sub_dir = "typo"
"##;
        let result: Result<BatchConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn transform_config_derived_from_sections() {
        let mut config = BatchConfig::default();
        config.transform.scale = 0.5;
        config.output.quality = 90;
        let t = config.transform_config();
        assert_eq!(t.scale.value(), 0.5);
        assert_eq!(t.quality.value(), 90);
    }

    #[test]
    fn fetch_config_derived_from_download_section() {
        let mut config = BatchConfig::default();
        config.download.max_retries = 0;
        config.download.timeout_secs = 5;
        let f = config.fetch_config();
        assert_eq!(f.retry.max_retries, 0);
        assert_eq!(f.timeout, Duration::from_secs(5));
        assert!(f.user_agent.starts_with("imgbatch/"));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_multi_char_delimiter() {
        let mut config = BatchConfig::default();
        config.input.delimiter = ";;".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.input.delimiter = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_scale() {
        let mut config = BatchConfig::default();
        config.transform.scale = 0.0;
        assert!(config.validate().is_err());
        config.transform.scale = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_quality_out_of_range() {
        let mut config = BatchConfig::default();
        config.output.quality = 0;
        assert!(config.validate().is_err());
        config.output.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_subdir_escaping_base_dir() {
        for bad in ["../elsewhere", "a/b", "a\\b", "..", ".", ""] {
            let mut config = BatchConfig::default();
            config.output.subdir = bad.into();
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "subdir {bad:?}"
            );
        }
    }

    #[test]
    fn validate_rejects_extension_that_is_not_a_plain_name() {
        for bad in ["jpeg/x", "j\\peg", "..", ".", ""] {
            let mut config = BatchConfig::default();
            config.output.extension = bad.into();
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "extension {bad:?}"
            );
        }
    }

    #[test]
    fn validate_accepts_dotted_plain_names() {
        let mut config = BatchConfig::default();
        config.output.subdir = ".thumbs".into();
        config.output.extension = "jpg".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_retry_delays() {
        let mut config = BatchConfig::default();
        config.download.retry_base_delay_ms = 10_000;
        config.download.retry_max_delay_ms = 100;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("imgbatch.toml")).unwrap();
        assert_eq!(config.output.subdir, "avs");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("imgbatch.toml");
        fs::write(
            &path,
            r##"
[input]
path = "people.txt"
delimiter = ","

[output]
base_dir = "/srv/avatars"
"##,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.input.path, PathBuf::from("people.txt"));
        assert_eq!(config.delimiter(), ',');
        assert_eq!(config.output_dir(), PathBuf::from("/srv/avatars/avs"));
        // Unspecified values should be defaults
        assert_eq!(config.output.extension, "jpeg");
    }

    #[test]
    fn load_config_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("imgbatch.toml");
        fs::write(&path, "[output\nquality = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_runs_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("imgbatch.toml");
        fs::write(&path, "[transform]\nscale = -2.0\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_overlay_replaces_scalars_and_keeps_siblings() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn merge_adds_new_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\n").unwrap();
        let overlay: toml::Value = toml::from_str("[b]\nz = true\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["b"]["z"].as_bool(), Some(true));
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: BatchConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = BatchConfig::default();
        assert_eq!(config.input.path, defaults.input.path);
        assert_eq!(config.output.quality, defaults.output.quality);
        assert_eq!(config.transform.scale, defaults.transform.scale);
        assert_eq!(config.download.max_retries, defaults.download.max_retries);
        assert_eq!(config.download.user_agent, defaults.download.user_agent);
        assert_eq!(config.log.level, defaults.log.level);
    }
}
