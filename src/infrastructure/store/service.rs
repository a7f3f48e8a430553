//! Key-value store trait and error types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid store key: {0:?}")]
    InvalidKey(String),

    #[error("Store operation error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable, byte-oriented key-value store.
///
/// Values are opaque bytes. `set` fully overwrites any prior value under the
/// key. Unlike a cache, implementations must report failures instead of
/// swallowing them: the cart relies on these errors to surface degraded
/// persistence.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::MemoryStore`] - Process-local map, for tests and ephemeral sessions
/// - [`crate::infrastructure::store::FileStore`] - One file per key in a local directory
/// - [`crate::infrastructure::store::RedisStore`] - Redis-backed store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if the key exists
    /// - `Ok(None)` if it does not
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend cannot be read.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend rejects the write.
    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Checks if the store backend is healthy.
    async fn health_check(&self) -> bool;
}
