//! Durable keyed-blob cache.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Cache keys used by the sync client.
pub mod keys {
    /// Inventory collection blob.
    pub const INVENTORY: &str = "inventory";
    /// Orders collection blob.
    pub const ORDERS: &str = "orders";
    /// Messages collection blob.
    pub const MESSAGES: &str = "messages";
    /// Prep-sheets collection blob.
    pub const PREP_SHEETS: &str = "prepSheets";
    /// Persisted session blob.
    pub const CURRENT_USER: &str = "currentUser";
}

/// A durable store of keyed JSON blobs.
///
/// The sync client mirrors every collection into the cache after each
/// mutation and reads it back on startup, so the implementation only needs
/// get/set/remove semantics; enumeration and transactions are not required.
pub trait CacheStore: Send + Sync {
    /// Returns the blob stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous blob.
    fn set(&self, key: &str, value: String);

    /// Removes the blob stored under `key`, if any.
    fn remove(&self, key: &str);
}

/// An in-memory cache.
///
/// Suitable for unit tests, integration tests and ephemeral runs that do
/// not need persistence across restarts.
///
/// # Thread Safety
///
/// This cache is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct MemoryCache {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    /// Creates a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    ///
    /// Useful for tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.blobs.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.blobs.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.blobs.write().remove(key);
    }
}
