//! Runtime setup: storage backend selection and cart provider startup.

use crate::application::services::CartProvider;
use crate::config::Config;
use crate::infrastructure::persistence::KvCartRepository;
use crate::infrastructure::store::{FileStore, KeyValueStore, MemoryStore, RedisStore};

use anyhow::{Context, Result};
use std::sync::Arc;

/// Opens the storage backend selected by `config`.
///
/// A Redis connection failure falls back to [`MemoryStore`] with a warning:
/// the cart stays usable, it just does not outlive the process.
///
/// # Errors
///
/// Returns an error if the `file` backend directory cannot be created, or if
/// the opened backend fails its health check.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.storage_backend.as_str() {
        "redis" => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("Redis backend selected without a Redis URL")?;
            match RedisStore::connect(redis_url).await {
                Ok(redis) => {
                    tracing::info!("Storage enabled (Redis)");
                    Arc::new(redis)
                }
                Err(e) => {
                    tracing::warn!("Failed to connect to Redis: {}. Using MemoryStore.", e);
                    Arc::new(MemoryStore::new())
                }
            }
        }
        "file" => {
            let store = FileStore::open(&config.data_dir).await.with_context(|| {
                format!("Failed to open data directory {}", config.data_dir.display())
            })?;
            Arc::new(store)
        }
        _ => {
            tracing::info!("Storage is in-memory only");
            Arc::new(MemoryStore::new())
        }
    };

    ensure_healthy(store, &config.storage_backend).await
}

/// Rejects a backend that fails its health check right after opening.
async fn ensure_healthy(
    store: Arc<dyn KeyValueStore>,
    backend: &str,
) -> Result<Arc<dyn KeyValueStore>> {
    if !store.health_check().await {
        anyhow::bail!("Storage backend '{}' failed its health check", backend);
    }
    Ok(store)
}

/// Connects storage, restores the cart and starts persistence.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be opened.
pub async fn start(config: &Config) -> Result<CartProvider> {
    let store = connect_store(config).await?;
    let repository = Arc::new(KvCartRepository::with_key(store, config.storage_key.clone()));

    let provider = CartProvider::initialize(repository, config.persist_settings()).await;
    tracing::info!(
        items = provider.store().products().len(),
        "Cart ready"
    );

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::MockKeyValueStore;

    #[tokio::test]
    async fn test_ensure_healthy_accepts_healthy_store() {
        let mut store = MockKeyValueStore::new();
        store.expect_health_check().times(1).returning(|| true);

        assert!(ensure_healthy(Arc::new(store), "file").await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_healthy_rejects_unhealthy_store() {
        let mut store = MockKeyValueStore::new();
        store.expect_health_check().times(1).returning(|| false);

        let err = ensure_healthy(Arc::new(store), "file").await.err().unwrap();

        assert!(err.to_string().contains("health check"));
    }

    #[tokio::test]
    async fn test_connect_store_opens_healthy_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_backend: "file".to_string(),
            data_dir: dir.path().join("cart"),
            redis_url: None,
            storage_key: "goMarketPlace@products".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            persist_debounce_ms: 0,
            persist_retry_attempts: 0,
            persist_retry_base_ms: 1,
        };

        let store = connect_store(&config).await.unwrap();

        assert!(store.health_check().await);
        assert!(dir.path().join("cart").is_dir());
    }
}
