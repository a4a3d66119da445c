//! Error types for the store crate.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while persisting or loading collections.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A collection could not be serialized for the cache.
    #[error("failed to serialize `{key}` for the cache: {source}")]
    Serialize {
        /// Cache key of the collection.
        key: &'static str,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}
