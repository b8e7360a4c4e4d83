//! Error types for the draft store
//!
//! - [`StoreError`]: failures of the raw key-value backend
//! - [`CacheError`]: failures of the typed draft layer on top of it

use std::path::PathBuf;

/// Errors from a [`DurableStore`](crate::DurableStore) backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Backing file is not a JSON object of strings
    #[error("store file {path} is corrupt: {source}")]
    Corrupt {
        /// Backing file
        path: PathBuf,
        /// Decode error
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the typed [`DraftCache`](crate::DraftCache)
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Stored value is not a draft record
    #[error("malformed record under '{key}': {source}")]
    MalformedRecord {
        /// Offending key
        key: String,
        /// Decode error
        #[source]
        source: serde_json::Error,
    },

    /// Record could not be encoded
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    /// Backend failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CacheError {
    /// Check if the error is a bad stored entry rather than a backend failure
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
