//! Domain layer containing the cart model and its rules.
//!
//! The domain has no dependencies on storage backends or presentation.
//!
//! # Architecture
//!
//! - [`entities`] - Cart item data structures
//! - [`collection`] - The cart collection and its mutation rules
//! - [`repositories`] - Persistence trait definitions
//! - [`persist_worker`] - Asynchronous, coalescing snapshot writer
//!
//! # Persistence Flow
//!
//! 1. A mutation on [`crate::application::services::CartStore`] produces a new [`CartSnapshot`]
//! 2. The snapshot is published to observers
//! 3. The same snapshot replaces the pending write slot
//! 4. [`persist_worker::run_persist_worker`] writes the newest pending snapshot via [`repositories::CartRepository`]

pub mod collection;
pub mod entities;
pub mod persist_worker;
pub mod repositories;

pub use collection::{CartCollection, CartSnapshot};
pub use persist_worker::{PersistOutcome, PersistSettings, PersistStatus};
