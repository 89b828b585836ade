//! # Transaction Store
//!
//! Transaction records kept as Redis hashes, and the reconciliation of those
//! records against CSV and text exports to find stale entries.
//!
//! ## Features
//!
//! - **Transaction records**: create, update, fetch, list and bulk-delete
//!   records under `transaction:<uuid>`
//! - **Payment requests**: list, export, seed and delete provider requests
//!   under `request:<provider>:<transaction_id>`
//! - **Ingestion**: identifier lists from `key,date` and `transaction_id,obs`
//!   CSV exports or plain-text files
//! - **Reconciliation**: set intersection across sources, with deletion as an
//!   explicit opt-in step
//! - **Storage abstraction**: repositories are generic over [`KeyValueStore`],
//!   with [`RedisStore`] and an in-memory store for tests
//!
//! ## Quick Start
//!
//! ```rust
//! use transaction_store::utils::MemoryStore;
//! use transaction_store::{TransactionRepository, TransactionStatus};
//! use bigdecimal::BigDecimal;
//!
//! # tokio_test_block(async {
//! let mut repository = TransactionRepository::new(MemoryStore::new());
//! let record = repository.create(BigDecimal::from(2500), "user-1", None).await?;
//! assert_eq!(record.field("status"), Some("pending"));
//!
//! let id = record.key.trim_start_matches("transaction:");
//! repository.update(id, TransactionStatus::Completed).await?;
//! # Ok::<(), transaction_store::StoreError>(())
//! # }).unwrap();
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod ingest;
pub mod reconciliation;
pub mod redis_store;
pub mod repository;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use redis_store::*;
pub use repository::*;
pub use traits::*;
pub use types::*;
