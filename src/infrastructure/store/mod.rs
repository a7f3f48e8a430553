//! Durable key-value storage backends.
//!
//! Provides a [`KeyValueStore`] trait with three implementations:
//! - [`MemoryStore`] - Process-local map
//! - [`FileStore`] - One file per key in a local directory
//! - [`RedisStore`] - Redis-backed store

mod file_store;
mod memory_store;
mod redis_store;
mod service;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use service::{KeyValueStore, StoreError, StoreResult};

#[cfg(test)]
pub use service::MockKeyValueStore;
