#![allow(dead_code)]

use async_trait::async_trait;
use cart_sync::domain::PersistSettings;
use cart_sync::domain::entities::NewCartItem;
use cart_sync::infrastructure::store::{KeyValueStore, MemoryStore, StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Memory-backed store with switchable write failures, a write counter and
/// an optional artificial write latency.
#[derive(Default)]
pub struct ScriptedStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    write_delay: Duration,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(write_delay: Duration) -> Self {
        Self {
            write_delay,
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key).await.unwrap()
    }

    pub async fn put_raw(&self, key: &str, value: &[u8]) {
        self.inner.set(key, value.to_vec()).await.unwrap();
    }
}

#[async_trait]
impl KeyValueStore for ScriptedStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn health_check(&self) -> bool {
        true
    }
}

pub fn fast_settings() -> PersistSettings {
    PersistSettings {
        debounce: Duration::ZERO,
        retry_attempts: 0,
        retry_base: Duration::from_millis(1),
    }
}

pub fn product(id: &str) -> NewCartItem {
    NewCartItem::new(id, format!("Product {id}"), format!("https://img/{id}.png"), 10.0)
}
