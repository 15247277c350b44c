//! HTTP download of one image per row.
//!
//! [`HttpFetcher::fetch`] issues a GET, streams the body to `<dest>.part`, and
//! renames it over `dest` only once the whole body has arrived. A failed
//! attempt removes the partial file, so an earlier good image at `dest` is
//! never clobbered by a broken download and never handed to the transformer.
//!
//! Transient failures are retried according to [`RetryPolicy`].

mod error;
mod retry;

pub use error::FetchError;
pub use retry::RetryPolicy;

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Url};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};

/// Client settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub connect_timeout: Duration,
    /// Total request time, body included.
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
            user_agent: concat!("imgbatch/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Streaming HTTP downloader. Create once and reuse for every row so
/// connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            retry: config.retry,
        })
    }

    /// Download `url` to `dest`, overwriting it. Returns the body size in bytes.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] for unparsable or non-http(s) URLs
    /// - [`FetchError::HttpStatus`] for any non-2xx response
    /// - [`FetchError::Network`] / [`FetchError::Timeout`] for transport failures
    /// - [`FetchError::Io`] when the body cannot be written
    #[instrument(level = "debug", skip(self, dest), fields(dest = %dest.display()))]
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let parsed = parse_url(url)?;
        let mut retries = 0;
        loop {
            match self.fetch_once(&parsed, dest).await {
                Ok(bytes) => {
                    debug!(bytes, retries, "Download complete");
                    return Ok(bytes);
                }
                Err(e) if self.retry.should_retry(&e, retries) => {
                    retries += 1;
                    let delay = self.retry.delay_for(retries);
                    warn!(
                        url,
                        retry = retries,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient download failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let part = part_path(dest);
        let written = match stream_to_file(response, url.as_str(), &part).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part, dest).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(FetchError::io(dest, e));
        }
        Ok(written)
    }
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

/// `<dest>.part`, where the body is written until it is complete.
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Streams the response body to `path`, returning bytes written.
async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, FetchError> {
    let file = File::create(path)
        .await
        .map_err(|e| FetchError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(path, e))?;
        written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| FetchError::io(path, e))?;
    Ok(written)
}
