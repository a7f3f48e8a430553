//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete storage backends and the cart persistence gateway.
//!
//! # Modules
//!
//! - [`store`] - Key-value storage abstractions (memory, file and Redis implementations)
//! - [`persistence`] - Cart repository on top of a key-value store

pub mod persistence;
pub mod store;
