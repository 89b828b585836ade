//! Identifier extraction from CSV exports

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::hash::Hash;
use std::io::Read;
use std::path::Path;

use crate::repository::{payment_request_prefix, DEFAULT_PROVIDER};
use crate::types::*;

/// Format of the `date` column, e.g. `2024-08-30T14:02:11.000000Z`
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Rows dated on or after this day are considered current
pub const DEFAULT_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(2024, 8, 31) {
    Some(date) => date,
    None => panic!("invalid default cutoff"),
};

/// The two CSV export shapes understood by the loader
///
/// The shape is always named by the caller, never sniffed from the headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsvKind {
    /// `key,date` rows; yields keys dated before the cutoff
    Key,
    /// `transaction_id,obs` rows; yields request keys whose `obs` is `OK`
    TransactionId,
}

/// Knobs for CSV ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Exclusive upper bound for [`CsvKind::Key`] rows
    pub cutoff: NaiveDate,
    /// Prefix put in front of [`CsvKind::TransactionId`] identifiers
    pub request_prefix: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            request_prefix: payment_request_prefix(DEFAULT_PROVIDER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
struct KeyDateRow {
    key: String,
    date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
struct TransactionIdRow {
    transaction_id: String,
    obs: String,
}

/// Load identifiers from CSV data of the given `kind`
pub fn load_csv<R: Read>(reader: R, kind: CsvKind, options: &CsvOptions) -> IngestResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    match kind {
        CsvKind::Key => keys_dated_before(&mut reader, options.cutoff),
        CsvKind::TransactionId => confirmed_requests(&mut reader, &options.request_prefix),
    }
}

/// Load identifiers from the CSV file at `path`
pub fn load_csv_path(path: &Path, kind: CsvKind, options: &CsvOptions) -> IngestResult<Vec<String>> {
    load_csv(File::open(path)?, kind, options)
}

fn keys_dated_before<R: Read>(
    reader: &mut csv::Reader<R>,
    cutoff: NaiveDate,
) -> IngestResult<Vec<String>> {
    let rows: Vec<KeyDateRow> = unique_rows(reader)?;
    let mut keys = Vec::new();

    for row in &rows {
        let key = row.key.trim();
        let date = NaiveDateTime::parse_from_str(row.date.trim(), DATE_FORMAT)
            .map_err(|source| IngestError::InvalidDate {
                key: key.to_string(),
                value: row.date.clone(),
                source,
            })?
            .date();

        if date < cutoff {
            keys.push(key.to_string());
        }
    }

    log::info!(
        "Found {} out of {} transactions dated before {cutoff}",
        keys.len(),
        rows.len()
    );
    Ok(keys)
}

fn confirmed_requests<R: Read>(
    reader: &mut csv::Reader<R>,
    prefix: &str,
) -> IngestResult<Vec<String>> {
    let rows: Vec<TransactionIdRow> = unique_rows(reader)?;
    let keys: Vec<String> = rows
        .iter()
        .filter(|row| row.obs.trim() == "OK")
        .map(|row| format!("{prefix}{}", row.transaction_id.trim()))
        .collect();

    log::info!("{} transactions marked 'OK' found in CSV", keys.len());
    Ok(keys)
}

/// Deserialize every row, dropping exact duplicates and keeping first-seen order
fn unique_rows<T, R>(reader: &mut csv::Reader<R>) -> IngestResult<Vec<T>>
where
    T: DeserializeOwned + Eq + Hash + Clone,
    R: Read,
{
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for row in reader.deserialize::<T>() {
        let row = row?;
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(data: &str, kind: CsvKind) -> IngestResult<Vec<String>> {
        load_csv(data.as_bytes(), kind, &CsvOptions::default())
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let keys = load(
            "key,date\n\
             before,2024-08-30T00:00:00.000000Z\n\
             boundary,2024-08-31T00:00:00.000000Z\n\
             after,2024-09-02T10:11:12.5Z\n\
             late_on_eve,2024-08-30T23:59:59.999999Z\n",
            CsvKind::Key,
        )
        .unwrap();

        assert_eq!(keys, vec!["before", "late_on_eve"]);
    }

    #[test]
    fn test_key_rows_are_deduplicated() {
        let keys = load(
            "date,key,extra\n\
             2024-01-01T00:00:00.000Z,request:mvola:1,a\n\
             2024-01-01T00:00:00.000Z,request:mvola:1,b\n\
             2024-01-02T00:00:00.000Z,request:mvola:1,c\n",
            CsvKind::Key,
        )
        .unwrap();

        // same key with a different date is a different row
        assert_eq!(keys, vec!["request:mvola:1", "request:mvola:1"]);
    }

    #[test]
    fn test_invalid_date_fails() {
        let result = load("key,date\nk1,31/08/2024\n", CsvKind::Key);
        assert!(matches!(result, Err(IngestError::InvalidDate { .. })));
    }

    #[test]
    fn test_obs_must_be_ok_after_trimming() {
        let keys = load(
            "transaction_id, obs\n\
             100, OK \n\
             101,ok\n\
             102,KO\n\
             103,OK\n\
             103,OK\n",
            CsvKind::TransactionId,
        )
        .unwrap();

        assert_eq!(keys, vec!["request:mvola:100", "request:mvola:103"]);
    }

    #[test]
    fn test_missing_column_fails() {
        let result = load("transaction_id,status\n1,OK\n", CsvKind::TransactionId);
        assert!(matches!(result, Err(IngestError::Csv(_))));
    }

    #[test]
    fn test_custom_prefix_and_cutoff() {
        let options = CsvOptions {
            cutoff: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            request_prefix: "request:orange:".to_string(),
        };

        let ids = load_csv("transaction_id,obs\n7,OK\n".as_bytes(), CsvKind::TransactionId, &options)
            .unwrap();
        assert_eq!(ids, vec!["request:orange:7"]);

        let keys = load_csv(
            "key,date\nk,2024-08-30T00:00:00.000Z\n".as_bytes(),
            CsvKind::Key,
            &options,
        )
        .unwrap();
        assert!(keys.is_empty());
    }
}
