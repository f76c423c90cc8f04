use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ListStore, StoreError};

/// In-process list store backed by a `RwLock<HashMap>`.
///
/// `set_available(false)` makes every call fail with `Unavailable`, which is
/// how tests simulate a severed store connection.
#[derive(Clone, Default)]
pub struct MemoryListStore {
    inner: Arc<RwLock<HashMap<String, Vec<String>>>>,
    down: Arc<AtomicBool>,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.down.store(!available, Ordering::SeqCst);
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ListStore for MemoryListStore {
    async fn append(&self, key: &str, payload: String) -> Result<(), StoreError> {
        self.check()?;
        let mut map = self.inner.write().await;
        map.entry(key.to_string()).or_default().push(payload);
        Ok(())
    }

    async fn read_all(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.check()?;
        let map = self.inner.read().await;
        Ok(map.get(key).cloned().unwrap_or_default())
    }

    async fn delete_key(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut map = self.inner.write().await;
        map.remove(key);
        Ok(())
    }

    async fn compare_and_replace(&self, key: &str, expected: &[String], payload: String) -> Result<bool, StoreError> {
        self.check()?;
        let mut map = self.inner.write().await;
        let current = map.get(key).map(Vec::as_slice).unwrap_or_default();
        if current != expected {
            return Ok(false);
        }
        map.insert(key.to_string(), vec![payload]);
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_operations() -> Result<(), anyhow::Error> {
        let store = MemoryListStore::new();
        assert!(store.read_all("k").await?.is_empty());

        store.append("k", "a".into()).await?;
        store.append("k", "b".into()).await?;
        assert_eq!(store.read_all("k").await?, vec!["a", "b"]);

        store.delete_key("k").await?;
        assert!(store.read_all("k").await?.is_empty());
        // deleting again is a no-op
        store.delete_key("k").await?;
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn compare_and_replace_checks_whole_list() -> Result<(), anyhow::Error> {
        let store = MemoryListStore::new();
        // absent key matches an empty expectation
        assert!(store.compare_and_replace("k", &[], "one".into()).await?);
        assert_eq!(store.read_all("k").await?, vec!["one"]);

        // stale expectation loses
        assert!(!store.compare_and_replace("k", &[], "two".into()).await?);
        assert_eq!(store.read_all("k").await?, vec!["one"]);

        store.append("k", "extra".into()).await?;
        let current = store.read_all("k").await?;
        assert!(store.compare_and_replace("k", &current, "merged".into()).await?);
        assert_eq!(store.read_all("k").await?, vec!["merged"]);
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryListStore::new();
        store.set_available(false);
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.read_all("k").await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.append("k", "x".into()).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.delete_key("k").await, Err(StoreError::Unavailable(_))));
        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }
}
