//! Loading transaction identifiers from CSV and text exports
//!
//! The `load_*` functions report every failure. The `*_or_empty` variants
//! log the failure and return an empty list instead, which is what a batch
//! run wants when one export out of several is unreadable.

pub mod tabular;
pub mod text;

pub use tabular::*;
pub use text::*;

use std::path::Path;

/// Like [`load_csv_path`], but failures are logged and yield an empty list
pub fn load_csv_or_empty(path: &Path, kind: CsvKind, options: &CsvOptions) -> Vec<String> {
    match load_csv_path(path, kind, options) {
        Ok(identifiers) => identifiers,
        Err(e) => {
            log::error!("Error processing CSV file {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Like [`load_text_path`], but failures are logged and yield an empty list
pub fn load_text_or_empty(path: &Path) -> Vec<String> {
    match load_text_path(path) {
        Ok(identifiers) => identifiers,
        Err(e) => {
            log::error!("Error parsing text file {}: {e}", path.display());
            Vec::new()
        }
    }
}
