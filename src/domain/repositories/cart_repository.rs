//! Repository trait for cart persistence.

use crate::domain::CartCollection;
use crate::error::CartError;
use async_trait::async_trait;

/// Persistence gateway for the cart.
///
/// Serializes the whole cart under a single fixed key and restores it at
/// startup. Implementations must not run `load`/`save` concurrently against
/// the same key.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::KvCartRepository`] - Any [`KeyValueStore`](crate::infrastructure::store::KeyValueStore)
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Loads the last persisted cart.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(cart))` if a cart was persisted
    /// - `Ok(None)` if nothing is stored under the key
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Deserialization`] if the stored bytes cannot be decoded.
    /// Returns [`CartError::StorageRead`] on backend failures.
    async fn load(&self) -> Result<Option<CartCollection>, CartError>;

    /// Overwrites the persisted cart with `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StorageWrite`] on backend failures.
    async fn save(&self, cart: &CartCollection) -> Result<(), CartError>;
}
