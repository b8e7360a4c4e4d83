//! Durable key-value backend contract

use crate::error::StoreResult;

/// Persistent string key-value store scoped to one user agent
///
/// Reading or removing a missing key is not an error.
pub trait DurableStore: Send + Sync {
    /// Get the value under `key`
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set `key` to `value`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key` if present
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Every key currently stored
    fn keys(&self) -> StoreResult<Vec<String>>;
}
