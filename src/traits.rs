//! Traits for storage abstraction

use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::*;

/// Field mapping as the store hands it back, before decoding
pub type RawFields = HashMap<Vec<u8>, Vec<u8>>;

/// Key-value backend the repositories are written against
///
/// The method set mirrors the handful of Redis commands the repositories
/// need, so any backend that can express hashes and key enumeration
/// (Redis, in-memory, ...) can sit underneath.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Write or merge `fields` into the hash stored at `key`
    async fn hash_set(&mut self, key: &str, fields: &Fields) -> StoreResult<()>;

    /// Read the entire hash stored at `key`; empty if the key does not exist
    async fn hash_get_all(&self, key: &str) -> StoreResult<RawFields>;

    /// Whether `key` exists
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Every key in the database, unfiltered
    async fn keys(&self) -> StoreResult<Vec<String>>;

    /// Delete all `keys` in a single call, returning how many were removed
    async fn delete(&mut self, keys: &[String]) -> StoreResult<usize>;
}
