//! # Cart Sync
//!
//! An in-memory shopping cart kept durably synchronized with an asynchronous
//! key-value store.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Cart entities, mutation rules, repository traits and the persistence worker
//! - **Application Layer** ([`application`]) - The cart store and its provider
//! - **Infrastructure Layer** ([`infrastructure`]) - Key-value backends and the persistence gateway
//!
//! ## Features
//!
//! - Merge-on-duplicate adds, delete-on-zero decrements
//! - Observers receive immutable snapshots of every change
//! - Coalescing background writer: a burst of changes ends in one write of the final state
//! - Bounded retry with backoff for failed writes
//! - Memory, file and Redis storage backends
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cart_sync::prelude::*;
//!
//! let store = Arc::new(MemoryStore::new());
//! let repository = Arc::new(KvCartRepository::new(store));
//! let provider = CartProvider::initialize(repository, PersistSettings::default()).await;
//!
//! let cart = provider.context();
//! cart.add_to_cart(NewCartItem::new("a", "T-shirt", "https://img/a.png", 10.0))?;
//! cart.increment("a")?;
//!
//! provider.store().flush().await?;
//! provider.shutdown().await;
//! ```
//!
//! ## Configuration
//!
//! The `cart` binary loads its configuration from environment variables via
//! [`config::Config`]. See [`config`] module for available options.

pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::CartError;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{CartContext, CartProvider, CartStore, Mutation};
    pub use crate::domain::entities::{CartItem, NewCartItem};
    pub use crate::domain::repositories::CartRepository;
    pub use crate::domain::{
        CartCollection, CartSnapshot, PersistOutcome, PersistSettings, PersistStatus,
    };
    pub use crate::error::CartError;
    pub use crate::infrastructure::persistence::KvCartRepository;
    pub use crate::infrastructure::store::{FileStore, KeyValueStore, MemoryStore, StoreError};
}
