//! CLI output formatting for `run` and `check`.
//!
//! Output is **row-centric**: every input row gets one header line that
//! leads with its line number in the input file and the row's name, so the
//! console reads as an inventory of the list that was fed in. Paths are shown
//! relative to the base directory.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! 001 alice → avs/alice.jpeg (300x150)
//! 002 bob: download failed: HTTP 404 downloading https://img.example/bob.png
//! 003 (skipped: missing delimiter) garbage
//! 005 carol: resize failed: cannot decode avs/carol.jpeg: ...
//!
//! Rows: 4 (saved 1, failed 2, skipped 1)
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 alice → avs/alice.jpeg
//!     Source: https://img.example/alice.png
//! 003 (skipped: missing delimiter) garbage
//!
//! Rows: 2 (ready 1, skipped 1)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use std::path::Path;

use crate::batch::{BatchReport, InputLine, Outcome, RowReport};
use crate::config::BatchConfig;

/// Format a 1-based line number as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `base`, or as-is when it lies elsewhere.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Skipped rows have no name; the raw line IS the identity.
///
/// ```text
/// 003 (skipped: missing delimiter) garbage
/// ```
fn skipped_line(line: usize, reason: &dyn std::fmt::Display, raw: &str) -> String {
    format!("{} (skipped: {}) {}", format_index(line), reason, raw)
}

// ============================================================================
// Run output
// ============================================================================

/// Format one finished row.
pub fn format_row_report(report: &RowReport, base_dir: &Path) -> Vec<String> {
    let name = report.name.as_deref().unwrap_or(&report.raw);
    match &report.outcome {
        Outcome::Saved { path, dimensions } => vec![format!(
            "{} {} \u{2192} {} ({})",
            format_index(report.line),
            name,
            display_path(path, base_dir),
            dimensions
        )],
        Outcome::Failed { stage, message } => vec![format!(
            "{} {}: {} failed: {}",
            format_index(report.line),
            name,
            stage,
            message
        )],
        Outcome::Skipped(reason) => vec![skipped_line(report.line, reason, &report.raw)],
    }
}

/// Format the closing summary of a run.
pub fn format_summary(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(abort) = &report.aborted {
        lines.push(format!("Stopped early: {}", abort));
    }
    lines.push(String::new());
    lines.push(format!(
        "Rows: {} (saved {}, failed {}, skipped {})",
        report.rows.len(),
        report.saved(),
        report.failed(),
        report.skipped()
    ));
    lines
}

pub fn print_row_report(report: &RowReport, base_dir: &Path) {
    for line in format_row_report(report, base_dir) {
        println!("{}", line);
    }
}

pub fn print_summary(report: &BatchReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format a dry-run parse of the input list.
///
/// Parsed rows show where their image would be written, with the URL as
/// indented context.
pub fn format_check_output(lines: &[InputLine], config: &BatchConfig) -> Vec<String> {
    let mut out = Vec::new();
    let mut ready = 0;

    for input in lines {
        match &input.parsed {
            Ok(row) => {
                ready += 1;
                out.push(format!(
                    "{} {} \u{2192} {}",
                    format_index(input.line),
                    row.name,
                    display_path(&config.image_path(&row.name), &config.output.base_dir)
                ));
                out.push(format!("{}Source: {}", indent(1), row.url));
            }
            Err(reason) => out.push(skipped_line(input.line, reason, &input.raw)),
        }
    }

    out.push(String::new());
    out.push(format!(
        "Rows: {} (ready {}, skipped {})",
        lines.len(),
        ready,
        lines.len() - ready
    ));
    out
}

pub fn print_check_output(lines: &[InputLine], config: &BatchConfig) {
    for line in format_check_output(lines, config) {
        println!("{}", line);
    }
}
