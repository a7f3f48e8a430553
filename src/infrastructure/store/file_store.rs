//! Local-directory store implementation.

use super::service::{KeyValueStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// A store that keeps one file per key inside a directory.
///
/// Writes go to a sibling temp file, synced to disk and then renamed over
/// the target, so a crash mid-write leaves either the old or the new value,
/// never a truncated one.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) the store directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        info!("Using FileStore at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a key to its file path, rejecting keys that would escape the directory.
    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0'])
            || key.ends_with(".tmp");
        if invalid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!("FileStore HIT: {} ({} bytes)", key, bytes.len());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("FileStore MISS: {}", key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!("{key}.tmp"));

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&value).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;

        debug!("FileStore SET: {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        fs::metadata(&self.dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        assert_eq!(store.get("shop@products").await.unwrap(), None);

        store.set("shop@products", b"[1]".to_vec()).await.unwrap();
        store.set("shop@products", b"[2]".to_vec()).await.unwrap();

        assert_eq!(store.get("shop@products").await.unwrap(), Some(b"[2]".to_vec()));
        assert!(!dir.path().join("shop@products.tmp").exists());
    }

    #[tokio::test]
    async fn test_set_replaces_leftover_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let value = br#"{"version":1,"items":[]}"#.to_vec();
        std::fs::write(dir.path().join("cart.tmp"), b"{\"version\":1,\"items\":[{\"id\"").unwrap();

        store.set("cart", value.clone()).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("cart")).unwrap(), value);
        assert!(!dir.path().join("cart.tmp").exists());
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let store = FileStore::open(&nested).await.unwrap();

        assert!(store.health_check().await);
        assert_eq!(store.dir(), nested.as_path());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        for key in ["", "..", "../escape", "nested/key", "cart.tmp"] {
            let result = store.set(key, Vec::new()).await;
            assert!(matches!(result, Err(StoreError::InvalidKey(_))), "key {key:?}");
        }
    }
}
