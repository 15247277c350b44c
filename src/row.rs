//! Input row parsing for the `name;url` list format.
//!
//! Each non-blank line of the input file names one image and where to fetch
//! it from:
//!
//! ```text
//! alice;https://example.com/avatars/alice.png
//! bob ; https://example.com/avatars/bob.jpg
//! ```
//!
//! The line is split on the **first** delimiter, so URLs may themselves
//! contain the delimiter character (`...?a=1;b=2`). Both fields are trimmed.
//! There is no header row and no quoting.
//!
//! The name becomes a filename, so anything that would resolve outside the
//! output directory is refused.

use std::fmt;

/// A parsed input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Output file stem (`<name>.jpeg`).
    pub name: String,
    /// Source URL, not yet validated.
    pub url: String,
}

/// Why a line was skipped instead of processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Trimmed line shorter than two characters.
    TooShort,
    /// No delimiter anywhere in the line.
    MissingDelimiter,
    EmptyName,
    EmptyUrl,
    /// Name contains a path separator, NUL, or is `.`/`..`.
    UnsafeName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::TooShort => "line too short",
            SkipReason::MissingDelimiter => "missing delimiter",
            SkipReason::EmptyName => "empty name",
            SkipReason::EmptyUrl => "empty url",
            SkipReason::UnsafeName => "name is not a plain filename",
        };
        f.write_str(text)
    }
}

/// A single path component that stays inside its parent directory.
pub fn is_safe_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// Parse one input line into a [`Row`].
///
/// - `"alice;https://x/a.png"` → name=`alice`, url=`https://x/a.png`
/// - `"  bob ;  https://x/b.png  "` → name=`bob`, url=`https://x/b.png`
/// - `"c;https://x/c?a=1;b=2"` → url keeps everything after the first `;`
/// - `"x"` → [`SkipReason::TooShort`]
/// - `"no delimiter here"` → [`SkipReason::MissingDelimiter`]
/// - `";https://x"` → [`SkipReason::EmptyName`]
/// - `"alice\t"` with a tab delimiter → [`SkipReason::EmptyUrl`]
pub fn parse_row(line: &str, delimiter: char) -> Result<Row, SkipReason> {
    // A whitespace delimiter (e.g. tab) must survive the outer trim.
    let line = line.trim_matches(|c: char| c.is_whitespace() && c != delimiter);
    if line.chars().count() < 2 {
        return Err(SkipReason::TooShort);
    }

    let (name, url) = line
        .split_once(delimiter)
        .ok_or(SkipReason::MissingDelimiter)?;
    let name = name.trim();
    let url = url.trim();

    if name.is_empty() {
        return Err(SkipReason::EmptyName);
    }
    if url.is_empty() {
        return Err(SkipReason::EmptyUrl);
    }
    if !is_safe_name(name) {
        return Err(SkipReason::UnsafeName);
    }

    Ok(Row {
        name: name.to_string(),
        url: url.to_string(),
    })
}
