//! Repository trait definitions for the domain layer.
//!
//! The traits here abstract persistence away from the cart rules. They are
//! implemented in `crate::infrastructure::persistence`, and mock
//! implementations are generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`CartRepository`] - Load and save the whole cart under one key

pub mod cart_repository;

pub use cart_repository::CartRepository;

#[cfg(test)]
pub use cart_repository::MockCartRepository;
