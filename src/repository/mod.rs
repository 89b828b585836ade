//! Repositories over the key-value store, one per key prefix

pub mod payment_request;
pub mod transaction;

pub use payment_request::*;
pub use transaction::*;

use crate::traits::*;
use crate::types::*;
use crate::utils::decode_fields;

/// Prepend `prefix` to `id` unless it is already a full key
pub(crate) fn prefixed_key(prefix: &str, id: &str) -> String {
    if id.starts_with(prefix) {
        id.to_string()
    } else {
        format!("{prefix}{id}")
    }
}

/// All keys in the store carrying `prefix`
///
/// This enumerates the whole keyspace, the store offers no server-side
/// filtering through [`KeyValueStore::keys`].
pub(crate) async fn list_prefixed<S: KeyValueStore>(
    storage: &S,
    prefix: &str,
) -> StoreResult<Vec<String>> {
    let mut keys: Vec<String> = storage
        .keys()
        .await?
        .into_iter()
        .filter(|key| key.starts_with(prefix))
        .collect();
    keys.sort();
    Ok(keys)
}

/// Existence check followed by a full, decoded read
pub(crate) async fn read_record<S: KeyValueStore>(
    storage: &S,
    key: &str,
) -> StoreResult<Option<Record>> {
    if !storage.exists(key).await? {
        return Ok(None);
    }
    let raw = storage.hash_get_all(key).await?;
    Ok(Some(Record::new(key, decode_fields(raw))))
}
