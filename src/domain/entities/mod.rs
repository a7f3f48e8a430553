//! Core domain entities representing the cart data model.
//!
//! # Entity Types
//!
//! - [`CartItem`] - A product line held in the cart
//! - [`NewCartItem`] - A product line being added (no quantity yet)

pub mod cart_item;

pub use cart_item::{CartItem, NewCartItem};
