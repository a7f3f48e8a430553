//! Cart provider and the context handles handed to consumers.
//!
//! The provider is constructed once per session and owns the [`CartStore`].
//! Components that need the cart receive a [`CartContext`] by injection
//! instead of looking up a global. A context whose provider is gone (or that
//! was never bound to one) reports [`CartError::ContextUnavailable`].

use std::sync::{Arc, Weak};

use tracing::info;

use crate::application::services::cart_store::{CartStore, Mutation};
use crate::domain::entities::NewCartItem;
use crate::domain::repositories::CartRepository;
use crate::domain::{CartCollection, PersistSettings};
use crate::error::CartError;

/// Owns the session's cart store.
pub struct CartProvider {
    store: Arc<CartStore>,
}

impl CartProvider {
    /// Restores the cart and starts persistence.
    ///
    /// See [`CartStore::initialize`] for restore behavior.
    pub async fn initialize<R>(repository: Arc<R>, settings: PersistSettings) -> Self
    where
        R: CartRepository + ?Sized + 'static,
    {
        let store = CartStore::initialize(repository, settings).await;
        Self {
            store: Arc::new(store),
        }
    }

    /// Returns a handle for a consumer of the cart.
    pub fn context(&self) -> CartContext {
        CartContext {
            store: Arc::downgrade(&self.store),
        }
    }

    pub fn store(&self) -> &CartStore {
        &self.store
    }

    /// Writes any pending change and releases the store.
    ///
    /// Contexts handed out by this provider report
    /// [`CartError::ContextUnavailable`] afterwards.
    pub async fn shutdown(self) {
        self.store.shutdown().await;
        info!(revision = self.store.revision(), "Cart provider shut down");
    }
}

/// Consumer-side handle to the cart.
///
/// Cheap to clone. Holds no ownership: the cart lives as long as its
/// [`CartProvider`]. Do not keep the `Arc` returned by [`Self::cart`] beyond
/// the call that needed it.
#[derive(Clone, Default)]
pub struct CartContext {
    store: Weak<CartStore>,
}

impl CartContext {
    /// A context not bound to any provider. Every call fails.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.store.strong_count() > 0
    }

    /// Resolves the store.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ContextUnavailable`] if the provider is gone or the
    /// context was never bound.
    pub fn cart(&self) -> Result<Arc<CartStore>, CartError> {
        self.store.upgrade().ok_or(CartError::ContextUnavailable)
    }

    pub fn products(&self) -> Result<Arc<CartCollection>, CartError> {
        Ok(self.cart()?.products())
    }

    pub fn add_to_cart(&self, item: NewCartItem) -> Result<Mutation, CartError> {
        Ok(self.cart()?.add_to_cart(item))
    }

    pub fn increment(&self, id: &str) -> Result<Mutation, CartError> {
        Ok(self.cart()?.increment(id))
    }

    pub fn decrement(&self, id: &str) -> Result<Mutation, CartError> {
        Ok(self.cart()?.decrement(id))
    }
}
