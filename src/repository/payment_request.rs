//! Payment requests stored under `request:<provider>:<transaction_id>`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{list_prefixed, prefixed_key, read_record};
use crate::traits::*;
use crate::types::*;
use crate::utils::validate_key_id;

/// Provider whose requests are handled when none is given
pub const DEFAULT_PROVIDER: &str = "mvola";

/// Key prefix of payment requests for `provider`
pub fn payment_request_prefix(provider: &str) -> String {
    format!("request:{provider}:")
}

/// Repository for payment requests of a single provider
pub struct PaymentRequestRepository<S: KeyValueStore> {
    storage: S,
    prefix: String,
}

impl<S: KeyValueStore> PaymentRequestRepository<S> {
    /// Repository for the default provider
    pub fn new(storage: S) -> Self {
        Self::for_provider(storage, DEFAULT_PROVIDER)
    }

    /// Repository for the requests of `provider`
    pub fn for_provider(storage: S, provider: &str) -> Self {
        Self {
            storage,
            prefix: payment_request_prefix(provider),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Store key of the request with `transaction_id`
    pub fn key_for(&self, transaction_id: &str) -> String {
        prefixed_key(&self.prefix, transaction_id)
    }

    /// Keys of all stored requests of this provider
    pub async fn list(&self) -> StoreResult<Vec<String>> {
        let keys = list_prefixed(&self.storage, &self.prefix).await?;
        if keys.is_empty() {
            log::info!("No transactions found under {}", self.prefix);
        } else {
            log::info!("{} transactions have been found in the store", keys.len());
        }
        Ok(keys)
    }

    /// Full records for `keys`
    ///
    /// Keys that no longer exist are logged and skipped.
    pub async fn details(&self, keys: &[String]) -> StoreResult<Vec<Record>> {
        if keys.is_empty() {
            log::info!("No transactions to fetch");
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match read_record(&self.storage, key).await? {
                Some(record) => records.push(record),
                None => log::warn!("Transaction ID {key} does not exist"),
            }
        }
        Ok(records)
    }

    /// Write the `key` field of each record to `path`, one per line
    ///
    /// Records without a `key` field are skipped with a warning. Returns
    /// the number of lines written.
    pub fn export_keys(&self, records: &[Record], path: &Path) -> StoreResult<usize> {
        let mut writer = BufWriter::new(File::create(path)?);
        let mut written = 0;

        for (index, record) in records.iter().enumerate() {
            let Some(key) = record.field("key") else {
                log::warn!("'key' not found in transaction details at index {index}");
                continue;
            };
            writeln!(writer, "{key}")?;
            written += 1;
        }
        writer.flush()?;

        log::info!("{written} transaction keys have been written to {}", path.display());
        Ok(written)
    }

    /// Store a fixture request for every transaction id
    ///
    /// Meant for populating development databases before a reconciliation
    /// dry run. Ids that cannot form a key, and ids whose write fails, are
    /// logged and skipped. Returns the number of requests written.
    pub async fn seed(&mut self, transaction_ids: &[String]) -> StoreResult<usize> {
        let mut created = 0;
        for transaction_id in transaction_ids {
            let transaction_id = transaction_id.trim_start_matches(self.prefix.as_str());
            if let Err(e) = validate_key_id(transaction_id) {
                log::error!("Unable to create transaction '{transaction_id}': {e}");
                continue;
            }

            let key = self.key_for(transaction_id);
            let request = PaymentRequest::fixture(key.clone(), transaction_id);
            if let Err(e) = self.storage.hash_set(&key, &request.to_fields()).await {
                log::error!("Unable to create transaction {key}: {e}");
                continue;
            }
            log::info!("Transaction created: {key}");
            created += 1;
        }
        Ok(created)
    }

    /// Delete `keys` in a single bulk call
    ///
    /// Once the delete has succeeded every key is logged and, when
    /// `deletion_log` is given, recorded in that file. Nothing is written or
    /// deleted for an empty list.
    pub async fn delete(
        &mut self,
        keys: &[String],
        deletion_log: Option<&Path>,
    ) -> StoreResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }

        let deleted = self.storage.delete(keys).await?;
        for key in keys {
            log::info!("Deleted transaction: {key}");
        }

        if let Some(path) = deletion_log {
            let mut writer = BufWriter::new(File::create(path)?);
            for key in keys {
                writeln!(writer, "Deleted transaction: {key}")?;
            }
            writer.flush()?;
        }

        log::info!("Deleted {deleted} transactions from the store");
        Ok(deleted)
    }
}
