//! Generic transaction records stored under `transaction:<id>`

use bigdecimal::BigDecimal;

use super::{list_prefixed, prefixed_key, read_record};
use crate::traits::*;
use crate::types::*;
use crate::utils::{now_timestamp, validate_amount, validate_user_id};

/// Key prefix of generic transaction records
pub const TRANSACTION_PREFIX: &str = "transaction:";

/// Repository for handling transaction record operations
pub struct TransactionRepository<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> TransactionRepository<S> {
    /// Create a new repository over `storage`
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying store
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Store key for `id`; full keys are passed through unchanged
    pub fn key_for(id: &str) -> String {
        prefixed_key(TRANSACTION_PREFIX, id)
    }

    /// Create a new transaction under a fresh identifier
    ///
    /// Returns the record exactly as written.
    pub async fn create(
        &mut self,
        amount: BigDecimal,
        user_id: &str,
        status: Option<TransactionStatus>,
    ) -> StoreResult<Record> {
        validate_amount(&amount)?;
        validate_user_id(user_id)?;

        let transaction = TransactionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount,
            status: status.unwrap_or_default(),
            timestamp: now_timestamp(),
        };
        let key = Self::key_for(&transaction.id);
        let fields = transaction.to_fields();

        self.storage.hash_set(&key, &fields).await?;
        log::info!("Created transaction {key} ({})", transaction.status);

        Ok(Record::new(key, fields))
    }

    /// Set a new status on an existing transaction
    ///
    /// Only `status` and `timestamp` are written, every other field is left
    /// as stored. Returns `Ok(None)` if the transaction does not exist. A
    /// read-back missing any required field is logged and still returned.
    pub async fn update(
        &mut self,
        id: &str,
        status: TransactionStatus,
    ) -> StoreResult<Option<Record>> {
        let key = Self::key_for(id);

        if !self.storage.exists(&key).await? {
            log::warn!("Transaction {key} not found");
            return Ok(None);
        }

        let changes = Fields::from([
            ("status".to_string(), status.to_string()),
            ("timestamp".to_string(), now_timestamp().to_string()),
        ]);
        self.storage.hash_set(&key, &changes).await?;

        let Some(record) = read_record(&self.storage, &key).await? else {
            // removed between the write and the read-back
            log::warn!("Transaction {key} disappeared during update");
            return Ok(None);
        };

        let missing = record.missing_fields(&TransactionRecord::REQUIRED_FIELDS);
        if !missing.is_empty() {
            log::error!(
                "Error unpacking transaction {key}: missing {}",
                missing.join(", ")
            );
        }

        log::info!("Updated transaction {key} to {status}");
        Ok(Some(record))
    }

    /// Get a transaction by ID
    pub async fn get(&self, id: &str) -> StoreResult<Option<Record>> {
        let key = Self::key_for(id);
        let record = read_record(&self.storage, &key).await?;
        if record.is_none() {
            log::warn!("Transaction {key} not found");
        }
        Ok(record)
    }

    /// Get a transaction by ID as a typed record
    pub async fn get_typed(&self, id: &str) -> StoreResult<Option<TransactionRecord>> {
        self.get(id)
            .await?
            .map(|record| TransactionRecord::try_from(&record))
            .transpose()
    }

    /// Keys of all stored transactions
    ///
    /// Scans the entire keyspace.
    pub async fn list(&self) -> StoreResult<Vec<String>> {
        let keys = list_prefixed(&self.storage, TRANSACTION_PREFIX).await?;
        if keys.is_empty() {
            log::info!("No transactions found");
        } else {
            log::info!("{} transactions found", keys.len());
        }
        Ok(keys)
    }

    /// Delete every stored transaction in one bulk call
    ///
    /// Issues no delete at all when there is nothing to remove.
    pub async fn delete_all(&mut self) -> StoreResult<usize> {
        let keys = self.list().await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let deleted = self.storage.delete(&keys).await?;
        log::info!("Deleted {deleted} transactions");
        Ok(deleted)
    }
}
