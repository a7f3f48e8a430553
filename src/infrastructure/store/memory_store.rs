//! In-memory store implementation.

use super::service::{KeyValueStore, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// A store that keeps values in process memory.
///
/// Values live as long as the store itself. Used for tests and for sessions
/// that should not outlive the process (`STORAGE_BACKEND=memory`).
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty MemoryStore.
    pub fn new() -> Self {
        debug!("Using MemoryStore (values are not persisted across restarts)");
        Self::default()
    }

    /// Creates a store pre-populated with `key` -> `value`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();

        assert_eq!(store.get("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStore::with_entry("k", b"old".to_vec());

        store.set("k", b"new".to_vec()).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"new".to_vec()));
        assert!(store.health_check().await);
    }
}
