//! Runtime wiring helpers
//!
//! Picks the store backend named in configuration so binary crates do not
//! need to know about individual implementations.

use std::sync::Arc;

use configs::{StoreBackend, StoreConfig};
use tracing::warn;

use crate::storage::{ListStore, MemoryListStore, RedisListStore, StoreError};

/// Build the shared store handle. Redis connect failures are returned as
/// `StoreError::StartupConnect` and are meant to abort startup.
pub async fn open_store(cfg: &StoreConfig) -> Result<Arc<dyn ListStore>, StoreError> {
    match cfg.backend {
        StoreBackend::Redis => Ok(Arc::new(RedisListStore::connect(cfg).await?)),
        StoreBackend::Memory => {
            warn!("using in-memory cart store; carts are lost on restart");
            Ok(Arc::new(MemoryListStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_needs_no_server() -> anyhow::Result<()> {
        let cfg = StoreConfig { backend: StoreBackend::Memory, ..StoreConfig::default() };
        let store = open_store(&cfg).await?;
        store.ping().await?;
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_redis_fails_startup() {
        let cfg = StoreConfig {
            backend: StoreBackend::Redis,
            address: "127.0.0.1:1".into(),
            connect_timeout_ms: 500,
            ..StoreConfig::default()
        };
        assert!(matches!(open_store(&cfg).await, Err(StoreError::StartupConnect { .. })));
    }
}
