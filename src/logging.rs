//! Process-wide logging to an append-only text file.
//!
//! [`init_logging`] installs a `tracing-subscriber` fmt subscriber once, at
//! startup, before any row is processed. Every event becomes one line:
//!
//! ```text
//! 2026-10-17T09:12:44.918231Z  WARN Skipping row with insufficient data: x reason=line too short line=3
//! 2026-10-17T09:12:45.301112Z ERROR Failed to download image from https://...: HTTP 404 downloading https://...
//! 2026-10-17T09:12:45.390007Z  INFO Job is done!
//! ```
//!
//! `RUST_LOG` takes precedence over the configured level. Writes go straight
//! to the file without buffering; [`LogHandle::flush`] syncs it to disk at
//! shutdown.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::LogConfig;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid log level `{level}`: {message}")]
    Filter { level: String, message: String },
    #[error("logging is already initialized")]
    AlreadyInitialized,
}

/// Hands out shared references to one append-mode file handle.
#[derive(Clone)]
struct LogFile(Arc<File>);

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = &'a File;

    fn make_writer(&'a self) -> Self::Writer {
        &self.0
    }
}

/// Returned by [`init_logging`]; keeps the log file reachable for shutdown.
#[derive(Debug)]
pub struct LogHandle {
    path: PathBuf,
    file: Arc<File>,
}

impl LogHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync everything written so far to disk.
    pub fn flush(&self) -> std::io::Result<()> {
        self.file.sync_all()
    }
}

/// Build the filter: `RUST_LOG` if set, otherwise `default_level`.
pub fn env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_level).map_err(|e| LoggingError::Filter {
        level: default_level.to_string(),
        message: e.to_string(),
    })
}

/// The subscriber used in production, generic over its writer so tests can
/// capture output.
pub fn build_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .finish()
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Install the global subscriber writing to `config.file`.
///
/// May succeed only once per process. Later calls fail without touching the
/// filesystem.
pub fn init_logging(config: &LogConfig) -> Result<LogHandle, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Err(LoggingError::AlreadyInitialized);
    }
    let filter = env_filter(&config.level)?;
    let file = Arc::new(open_log_file(&config.file)?);

    let subscriber = build_subscriber(filter, LogFile(Arc::clone(&file)));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::debug!(path = %config.file.display(), "Logging initialized");

    Ok(LogHandle {
        path: config.file.clone(),
        file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::CapturedLogs;
    use tempfile::TempDir;

    #[test]
    fn lines_carry_timestamp_level_and_message() {
        let logs = CapturedLogs::default();
        let subscriber = build_subscriber(EnvFilter::new("info"), logs.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(line = 3, "Skipping row with insufficient data: x");
            tracing::debug!("filtered out");
        });

        let text = logs.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let line = lines[0];
        // RFC 3339 timestamp first
        assert!(line.chars().next().unwrap().is_ascii_digit(), "{line}");
        assert!(line.contains('T') && line.contains('Z'), "{line}");
        assert!(line.contains("WARN"), "{line}");
        assert!(line.contains("Skipping row with insufficient data: x"), "{line}");
        assert!(line.contains("line=3"), "{line}");
        assert!(!line.contains('\u{1b}'), "no ANSI escapes: {line}");
    }

    #[test]
    fn invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(matches!(
            env_filter("loud=please=now"),
            Err(LoggingError::Filter { .. })
        ));
    }

    #[test]
    fn log_file_is_opened_for_append() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/error_log.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "earlier run\n").unwrap();

        let logs = LogFile(Arc::new(open_log_file(&path).unwrap()));
        let subscriber = build_subscriber(EnvFilter::new("info"), logs);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Job is done!");
        });

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("earlier run\n"));
        assert!(text.contains("INFO Job is done!"));
    }

    #[test]
    fn second_init_fails_without_creating_a_file() {
        let tmp = TempDir::new().unwrap();
        let first = LogConfig {
            file: tmp.path().join("a.log"),
            level: "info".into(),
        };
        // Only this test installs the global subscriber.
        let _ = init_logging(&first);

        let second = LogConfig {
            file: tmp.path().join("later/b.log"),
            level: "info".into(),
        };
        assert!(matches!(
            init_logging(&second),
            Err(LoggingError::AlreadyInitialized)
        ));
        assert!(!second.file.exists());
        assert!(!tmp.path().join("later").exists());
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/deeper/run.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
