//! Application layer services implementing the cart's behavior.
//!
//! This layer orchestrates the domain rules and the persistence worker, and
//! provides the API consumed by the presentation layer (the `cart` binary or
//! an embedding UI).
//!
//! # Available Services
//!
//! - [`services::cart_store::CartStore`] - Cart state, mutations and persistence
//! - [`services::provider::CartProvider`] - Session owner of the store, hands out [`services::CartContext`] handles

pub mod services;
