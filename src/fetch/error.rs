//! Error types for the fetch module.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while downloading one image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed or uses a scheme other than http(s).
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network-level error (DNS resolution, connection refused, TLS, reset body).
    #[error("network error downloading {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Connect or total request timeout elapsed.
    #[error("timeout downloading {url}")]
    Timeout { url: String },

    /// Non-2xx response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus { url: String, status: u16 },

    /// Local file system error while writing the body.
    #[error("IO error writing to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Classify a reqwest error, splitting out timeouts.
    pub fn network(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source,
            }
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Connection problems, timeouts, 5xx and 429 are transient. Client errors,
    /// bad URLs and local I/O failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidUrl { .. } | Self::Io { .. } | Self::Client(_) => false,
        }
    }
}
