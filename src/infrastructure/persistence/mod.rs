//! Cart repository implementations.
//!
//! # Repositories
//!
//! - [`KvCartRepository`] - Whole-cart JSON blob under a fixed key in any [`crate::infrastructure::store::KeyValueStore`]

pub mod kv_cart_repository;

pub use kv_cart_repository::{
    DEFAULT_CART_KEY, FORMAT_VERSION, KvCartRepository, decode_cart, encode_cart,
};
