//! Business logic services for the application layer.

pub mod cart_store;
pub mod provider;

pub use cart_store::{CartStore, Mutation};
pub use provider::{CartContext, CartProvider};
