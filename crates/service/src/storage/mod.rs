//! Store Adapter: list-shaped persistence addressed by string key.
//!
//! `RedisListStore` is the production backend; `MemoryListStore` keeps the
//! same contract in process for local runs and tests.

pub mod memory_store;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory_store::MemoryListStore;
pub use redis_store::RedisListStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("cannot connect to store at {address}: {reason}")]
    StartupConnect { address: String, reason: String },
}

/// Operations the cart layer needs from the key-value store.
///
/// Implementations must be safe to share between concurrent request handlers.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Append one blob to the list at `key`, creating it if absent.
    async fn append(&self, key: &str, payload: String) -> Result<(), StoreError>;

    /// Full list at `key` in order; empty when the key does not exist.
    async fn read_all(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Remove `key` and its contents. Absent keys are a no-op.
    async fn delete_key(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically replace the list at `key` with the single blob `payload`,
    /// but only if it still equals `expected`. Returns whether the swap happened.
    async fn compare_and_replace(&self, key: &str, expected: &[String], payload: String) -> Result<bool, StoreError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
