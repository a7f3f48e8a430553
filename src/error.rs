//! Error taxonomy for cart state and persistence.
//!
//! None of these errors ever invalidate the in-memory cart. Persistence is
//! best-effort relative to the live session: read failures degrade to an
//! empty cart, write failures are reported and the session continues.

use thiserror::Error;

/// Errors surfaced by the cart store and its persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Persisted bytes could not be decoded (corrupt or incompatible format).
    ///
    /// Recovered locally: the store starts with an empty cart.
    #[error("failed to deserialize persisted cart: {0}")]
    Deserialization(String),

    /// The cart could not be encoded for storage (e.g. a non-finite price).
    ///
    /// Non-fatal. The previously persisted value is left untouched.
    #[error("failed to serialize cart: {0}")]
    Serialization(String),

    /// The storage backend failed while reading the persisted cart.
    #[error("failed to read cart from storage: {0}")]
    StorageRead(String),

    /// The storage backend failed while writing the cart.
    ///
    /// Non-fatal. The in-memory cart stays correct and usable.
    #[error("failed to write cart to storage: {0}")]
    StorageWrite(String),

    /// The cart was used without an active provider.
    ///
    /// Indicates a wiring bug in the calling code and is not recoverable.
    #[error("cart used outside of an active CartProvider")]
    ContextUnavailable,
}

impl CartError {
    /// Returns true for errors the session can continue past.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ContextUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CartError::Deserialization("expected value at line 1".to_string()).to_string(),
            "failed to deserialize persisted cart: expected value at line 1"
        );
        assert_eq!(
            CartError::StorageWrite("disk full".to_string()).to_string(),
            "failed to write cart to storage: disk full"
        );
        assert_eq!(
            CartError::ContextUnavailable.to_string(),
            "cart used outside of an active CartProvider"
        );
    }

    #[test]
    fn test_only_context_unavailable_is_fatal() {
        assert!(CartError::Deserialization(String::new()).is_recoverable());
        assert!(CartError::Serialization(String::new()).is_recoverable());
        assert!(CartError::StorageRead(String::new()).is_recoverable());
        assert!(CartError::StorageWrite(String::new()).is_recoverable());
        assert!(!CartError::ContextUnavailable.is_recoverable());
    }
}
