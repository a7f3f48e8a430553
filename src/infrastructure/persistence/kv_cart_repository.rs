//! Key-value implementation of the cart repository.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::CartCollection;
use crate::domain::entities::CartItem;
use crate::domain::repositories::CartRepository;
use crate::error::CartError;
use crate::infrastructure::store::KeyValueStore;

/// Key the cart is stored under unless configured otherwise.
pub const DEFAULT_CART_KEY: &str = "goMarketPlace@products";

/// Version tag written into every stored cart.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredCartRef<'a> {
    version: u32,
    items: &'a [CartItem],
}

/// Accepted layouts when reading.
///
/// `Legacy` is the bare array of records written before the version tag existed.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned { version: u32, items: Vec<CartItem> },
    Legacy(Vec<CartItem>),
}

/// Encodes a cart into its stored JSON form.
///
/// # Errors
///
/// Returns [`CartError::Serialization`] if an item carries a non-finite price,
/// which JSON cannot represent.
pub fn encode_cart(cart: &CartCollection) -> Result<Vec<u8>, CartError> {
    if let Some(item) = cart.iter().find(|item| !item.price.is_finite()) {
        return Err(CartError::Serialization(format!(
            "price of item {:?} is not a finite number",
            item.id
        )));
    }

    serde_json::to_vec(&StoredCartRef {
        version: FORMAT_VERSION,
        items: cart.items(),
    })
    .map_err(|e| CartError::Serialization(e.to_string()))
}

/// Decodes a stored cart, accepting both the versioned and the legacy layout.
///
/// # Errors
///
/// Returns [`CartError::Deserialization`] on malformed JSON, unknown versions,
/// or records that do not describe cart items.
pub fn decode_cart(bytes: &[u8]) -> Result<CartCollection, CartError> {
    let stored: StoredCart =
        serde_json::from_slice(bytes).map_err(|e| CartError::Deserialization(e.to_string()))?;

    let records = match stored {
        StoredCart::Versioned { version, items } if version == FORMAT_VERSION => items,
        StoredCart::Versioned { version, .. } => {
            return Err(CartError::Deserialization(format!(
                "unsupported cart format version {version}"
            )));
        }
        StoredCart::Legacy(items) => {
            debug!("Decoded legacy unversioned cart ({} records)", items.len());
            items
        }
    };

    Ok(CartCollection::from_records(records))
}

/// Cart repository storing the whole cart as one JSON blob under a fixed key.
///
/// `load` and `save` are serialized through an internal lock so that two
/// callers never race on the key.
pub struct KvCartRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
    lock: Mutex<()>,
}

impl KvCartRepository {
    /// Creates a repository using [`DEFAULT_CART_KEY`].
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_CART_KEY)
    }

    /// Creates a repository storing the cart under `key`.
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl CartRepository for KvCartRepository {
    async fn load(&self) -> Result<Option<CartCollection>, CartError> {
        let _guard = self.lock.lock().await;

        let bytes = self
            .store
            .get(&self.key)
            .await
            .map_err(|e| CartError::StorageRead(e.to_string()))?;

        match bytes {
            Some(bytes) => decode_cart(&bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, cart: &CartCollection) -> Result<(), CartError> {
        let bytes = encode_cart(cart)?;
        let _guard = self.lock.lock().await;

        self.store
            .set(&self.key, bytes)
            .await
            .map_err(|e| CartError::StorageWrite(e.to_string()))
    }
}
