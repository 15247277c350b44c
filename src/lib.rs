//! # imgbatch
//!
//! A batch image downloader and rescaler. Feed it a list of `name;url` rows;
//! for each row it downloads the image, scales both edges by a fixed factor
//! with bilinear filtering, converts it to RGB, and writes it as a JPEG named
//! after the row.
//!
//! # Pipeline
//!
//! Every row passes through the same three steps, strictly one row at a time:
//!
//! ```text
//! 1. Parse      "alice;https://…"  →  Row { name, url }
//! 2. Fetch      url                →  <base>/avs/alice.jpeg   (raw bytes)
//! 3. Transform  alice.jpeg         →  alice.jpeg              (×1.5, RGB, JPEG)
//! ```
//!
//! A row that fails at any step is logged and recorded; the batch moves on.
//! Nothing short of bad configuration stops a run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`row`] | Parses one input line into a [`row::Row`] or a skip reason |
//! | [`fetch`] | Streams a URL to disk with timeouts and bounded retry |
//! | [`imaging`] | Pure-Rust rescale + RGB conversion + JPEG re-encode, behind a backend trait |
//! | [`batch`] | The driver: reads the list, runs each row, collects a report |
//! | [`config`] | `imgbatch.toml` loading, merging over stock defaults, validation |
//! | [`logging`] | `tracing` subscriber writing to the append-only log file |
//! | [`output`] | CLI output formatting for `run` and `check` |
//!
//! # Design Decisions
//!
//! ## In-Place Overwrite
//!
//! The download lands at its final path and the transform rewrites that same
//! file. Files are always named `.jpeg`, whatever the server sent, so decoding
//! sniffs the content instead of trusting the extension. If the bytes cannot
//! be decoded they stay on disk untouched.
//!
//! ## Downloads Never Clobber
//!
//! Bodies stream into a `.part` sibling and are renamed over the target only
//! once complete. A failed re-download therefore leaves the previous run's
//! image alone, and the transform only ever sees freshly downloaded bytes, so
//! re-running a list never compounds the scale factor.
//!
//! ## Backend Trait
//!
//! The driver talks to images through [`imaging::ImageBackend`]. Production
//! uses [`imaging::RustBackend`] (the `image` crate); tests substitute a
//! recording mock and assert on the operations requested.

pub mod batch;
pub mod config;
pub mod fetch;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod row;

#[cfg(test)]
pub(crate) mod test_helpers;
