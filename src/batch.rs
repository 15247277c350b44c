//! The batch driver: input list in, one JPEG per row out.
//!
//! ## Per-row pipeline
//!
//! ```text
//! Start → Parsed → Downloaded → Resized → Done
//!   │        │          │
//!   └ Skipped└ Failed(Download)
//!                       └ Failed(Resize)
//! ```
//!
//! Rows run strictly one after another. A row that is skipped or fails never
//! affects the rows after it; each ends in exactly one [`Outcome`].
//!
//! ## Run-level failures
//!
//! A missing or unreadable input file, or an output directory that cannot be
//! created, ends the run early. Nothing escapes as an error: the reason is
//! logged, stored in [`BatchReport::aborted`], and `Job is done!` is still
//! logged.
//!
//! ## Files
//!
//! ```text
//! <base_dir>/
//! └── avs/
//!     ├── alice.jpeg      # downloaded, rescaled ×1.5, RGB JPEG
//!     └── bob.jpeg        # undecodable body: left exactly as downloaded
//! ```

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::BatchConfig;
use crate::fetch::HttpFetcher;
use crate::imaging::{Dimensions, ImageBackend, RustBackend, rescale_in_place};
use crate::row::{Row, SkipReason, parse_row};

/// Step at which a row failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Resize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Download => "download",
            Stage::Resize => "resize",
        })
    }
}

/// Terminal state of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Saved { path: PathBuf, dimensions: Dimensions },
    Skipped(SkipReason),
    Failed { stage: Stage, message: String },
}

/// One processed input line.
#[derive(Debug, Clone, PartialEq)]
pub struct RowReport {
    /// 1-based line number in the input file.
    pub line: usize,
    /// The line as read, trimmed.
    pub raw: String,
    /// Parsed name, absent for skipped rows.
    pub name: Option<String>,
    pub outcome: Outcome,
}

/// Why a run stopped before reaching the end of the input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchAbort {
    #[error("File not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("cannot read {}: {message}", path.display())]
    InputUnreadable { path: PathBuf, message: String },
    #[error("cannot create output directory {}: {message}", path.display())]
    OutputDir { path: PathBuf, message: String },
    #[error("cannot start HTTP client: {0}")]
    Client(String),
}

/// Everything a run did, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub rows: Vec<RowReport>,
    pub aborted: Option<BatchAbort>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Saved { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }
}

/// A line from the input file together with its parse result.
#[derive(Debug, Clone, PartialEq)]
pub struct InputLine {
    pub line: usize,
    pub raw: String,
    pub parsed: Result<Row, SkipReason>,
}

fn read_input(path: &Path) -> Result<String, BatchAbort> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BatchAbort::InputNotFound(path.to_path_buf()),
        _ => BatchAbort::InputUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })
}

/// Non-blank lines with their 1-based line numbers. A UTF-8 BOM on the first
/// line is dropped. Lines are left untrimmed for [`parse_row`], which knows
/// whether surrounding whitespace is a delimiter.
fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .strip_prefix('\u{feff}')
        .unwrap_or(content)
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Read and parse the input list without touching the network.
pub fn check_input(config: &BatchConfig) -> Result<Vec<InputLine>, BatchAbort> {
    let content = read_input(&config.input.path)?;
    let delimiter = config.delimiter();
    Ok(content_lines(&content)
        .map(|(line, raw)| InputLine {
            line,
            raw: raw.trim().to_string(),
            parsed: parse_row(raw, delimiter),
        })
        .collect())
}

/// Run the batch with the production backend and HTTP client.
pub async fn run_batch(config: &BatchConfig, events: Option<Sender<RowReport>>) -> BatchReport {
    match HttpFetcher::new(&config.fetch_config()) {
        Ok(fetcher) => run_batch_with(&RustBackend::new(), &fetcher, config, events).await,
        Err(e) => {
            let abort = BatchAbort::Client(e.to_string());
            error!("An error occurred: {}", abort);
            info!("Job is done!");
            BatchReport {
                rows: Vec::new(),
                aborted: Some(abort),
            }
        }
    }
}

/// Run the batch with an explicit backend and fetcher (allows testing with mocks).
///
/// Each finished row is also sent on `events`, if given, as soon as it is done.
pub async fn run_batch_with(
    backend: &impl ImageBackend,
    fetcher: &HttpFetcher,
    config: &BatchConfig,
    events: Option<Sender<RowReport>>,
) -> BatchReport {
    let mut report = BatchReport::default();

    if let Err(abort) = drive(backend, fetcher, config, events.as_ref(), &mut report.rows).await {
        match &abort {
            BatchAbort::InputNotFound(_) => error!("{}", abort),
            other => error!("An error occurred: {}", other),
        }
        report.aborted = Some(abort);
    }

    info!(
        saved = report.saved(),
        failed = report.failed(),
        skipped = report.skipped(),
        "Job is done!"
    );
    report
}

async fn drive(
    backend: &impl ImageBackend,
    fetcher: &HttpFetcher,
    config: &BatchConfig,
    events: Option<&Sender<RowReport>>,
    rows: &mut Vec<RowReport>,
) -> Result<(), BatchAbort> {
    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir).map_err(|e| BatchAbort::OutputDir {
        path: output_dir.clone(),
        message: e.to_string(),
    })?;

    let content = read_input(&config.input.path)?;
    let delimiter = config.delimiter();
    debug!(input = %config.input.path.display(), output = %output_dir.display(), "Batch started");

    for (line, raw) in content_lines(&content) {
        let report = match parse_row(raw, delimiter) {
            Ok(row) => RowReport {
                line,
                raw: raw.trim().to_string(),
                outcome: process_row(backend, fetcher, config, &row).await,
                name: Some(row.name),
            },
            Err(reason) => {
                let raw = raw.trim();
                warn!(line, %reason, "Skipping row with insufficient data: {}", raw);
                RowReport {
                    line,
                    raw: raw.to_string(),
                    name: None,
                    outcome: Outcome::Skipped(reason),
                }
            }
        };

        if let Some(tx) = events {
            // A dropped receiver only means nobody is printing progress.
            let _ = tx.send(report.clone());
        }
        rows.push(report);
    }

    Ok(())
}

/// Download then rescale one parsed row.
///
/// The transformer only ever sees a file this call has just downloaded
/// completely; a failed download leaves any earlier file alone.
pub async fn process_row(
    backend: &impl ImageBackend,
    fetcher: &HttpFetcher,
    config: &BatchConfig,
    row: &Row,
) -> Outcome {
    let path = config.image_path(&row.name);

    if let Err(e) = fetcher.fetch(&row.url, &path).await {
        error!("Failed to download image from {}: {}", row.url, e);
        error!(name = %row.name, "Failed to download {}!", row.name);
        return Outcome::Failed {
            stage: Stage::Download,
            message: e.to_string(),
        };
    }

    match rescale_in_place(backend, &path, &config.transform_config()) {
        Ok(dimensions) => {
            info!(
                name = %row.name,
                path = %path.display(),
                %dimensions,
                "Processed {} successfully!",
                row.name
            );
            Outcome::Saved { path, dimensions }
        }
        Err(e) => {
            error!("Failed to resize image {}: {}", path.display(), e);
            error!(name = %row.name, "Failed to resize {}!", row.name);
            Outcome::Failed {
                stage: Stage::Resize,
                message: e.to_string(),
            }
        }
    }
}
