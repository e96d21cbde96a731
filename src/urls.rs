//! Dataset URL list loading.
//!
//! The URL list is plain text with one archive URL per line. Blank lines
//! are ignored; order and duplicates are preserved.

use std::path::Path;

use crate::error::BallsetError;

/// Reads the URL list at `path`.
///
/// An empty or all-blank file yields an empty list, which is not an error.
pub fn read_url_list(path: &Path) -> Result<Vec<String>, BallsetError> {
    let text = std::fs::read_to_string(path).map_err(|source| BallsetError::UrlList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_url_list(&text))
}

/// Splits `text` into URLs, one per non-blank line.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
