//! In-memory store implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

type Hashes = HashMap<String, RawFields>;

/// In-memory store implementation for testing and development
///
/// Clones share the same data, so a test can keep a handle for inspection
/// while a repository owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    hashes: Arc<RwLock<Hashes>>,
    delete_calls: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create a new, empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of delete calls issued so far
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of keys currently stored
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Hashes>> {
        self.hashes
            .read()
            .map_err(|_| StoreError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Hashes>> {
        self.hashes
            .write()
            .map_err(|_| StoreError::Storage("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn hash_set(&mut self, key: &str, fields: &Fields) -> StoreResult<()> {
        let mut hashes = self.write()?;
        let hash = hashes.entry(key.to_string()).or_default();
        for (name, value) in fields {
            hash.insert(name.as_bytes().to_vec(), value.as_bytes().to_vec());
        }
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<RawFields> {
        Ok(self.read()?.get(key).cloned().unwrap_or_default())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(key))
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn delete(&mut self, keys: &[String]) -> StoreResult<usize> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut hashes = self.write()?;
        Ok(keys.iter().filter(|key| hashes.remove(*key).is_some()).count())
    }
}
