//! Identifier extraction from plain-text lists

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::types::*;

/// One identifier per line; lines are trimmed and blank ones dropped
///
/// Order and duplicates are preserved.
pub fn load_text<R: BufRead>(reader: R) -> IngestResult<Vec<String>> {
    let mut identifiers = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let identifier = line.trim();
        if !identifier.is_empty() {
            identifiers.push(identifier.to_string());
        }
    }
    Ok(identifiers)
}

/// Load identifiers from the text file at `path`
pub fn load_text_path(path: &Path) -> IngestResult<Vec<String>> {
    load_text(BufReader::new(File::open(path)?))
}
