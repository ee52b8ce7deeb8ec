//! Key-value store abstraction.

use crate::StoreError;

/// A string key-value store.
///
/// Implementations must be safe to share between tasks; every operation is a
/// short synchronous call that never blocks on the network.
pub trait KeyValueStore: Send + Sync {
    /// Get a value from the store.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value in the store, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value from the store.
    ///
    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists in the store.
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Get all keys in the store.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}
