//! Redis-backed store implementation.

use super::service::{KeyValueStore, StoreError, StoreResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

/// Redis store implementation.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// Values are stored without expiry. Errors propagate to the caller.
pub struct RedisStore {
    client: ConnectionManager,
}

impl RedisStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            StoreError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            StoreError::Connection(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| StoreError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self { client: manager })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.client.clone();

        let value = conn
            .get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|e| StoreError::Backend(format!("Redis GET {} failed: {}", key, e)))?;

        match &value {
            Some(bytes) => debug!("Redis HIT: {} ({} bytes)", key, bytes.len()),
            None => debug!("Redis MISS: {}", key),
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        let mut conn = self.client.clone();
        let len = value.len();

        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| StoreError::Backend(format!("Redis SET {} failed: {}", key, e)))?;

        debug!("Redis SET: {} ({} bytes)", key, len);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
