//! Error types for the draft engine
//!
//! Provides error handling for:
//! - Missing storage capability
//! - Ambiguous or unreachable server metadata
//! - Malformed cached drafts
//! - Host form submission failures
//! - Configuration loading
//!
//! Every failure except submission degrades to "do not autosave"; none of
//! them is allowed to interfere with the host's primary submission path.

use crate::reconcile::ReconcileState;
use formdraft_store::CacheError;
use std::path::PathBuf;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum AutosaveError {
    /// No durable storage is available
    #[error("durable storage is not available")]
    CapabilityMissing,

    /// Server state for an existing record is ambiguous
    #[error("server metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// Cached draft does not decode
    #[error("malformed draft under '{key}': {source}")]
    MalformedRecord {
        /// Offending key
        key: String,
        /// Decode error
        #[source]
        source: serde_json::Error,
    },

    /// Host submission failed
    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    /// Metadata fetch failed
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Cache backend failure
    #[error("cache error: {0}")]
    Cache(CacheError),

    /// No draft stored for the page
    #[error("no draft stored for {0}")]
    NoDraft(String),

    /// Conflict action requested while no conflict is shown
    #[error("no draft conflict pending (state {0:?})")]
    NotPrompting(ReconcileState),

    /// Operation not valid in the current reconciliation state
    #[error("illegal state transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: ReconcileState,
        /// Requested state
        to: ReconcileState,
    },
}

impl AutosaveError {
    /// Check if the error only disables autosave and is never shown to the user
    #[inline]
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::CapabilityMissing
                | Self::MetadataUnavailable(_)
                | Self::MalformedRecord { .. }
                | Self::Metadata(_)
                | Self::Cache(_)
        )
    }
}

impl From<CacheError> for AutosaveError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::MalformedRecord { key, source } => Self::MalformedRecord { key, source },
            other => Self::Cache(other),
        }
    }
}

/// Server metadata fetch errors
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Transport failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Body did not carry a last-modified field
    #[error("undecodable response: {0}")]
    Decode(String),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading a config file
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML settings
    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid JSON page config
    #[error("invalid page config: {0}")]
    Json(#[from] serde_json::Error),

    /// Value out of range
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Offending key
        key: &'static str,
        /// What is wrong
        message: String,
    },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Host form submission errors
///
/// Owned by the host; the engine only propagates them.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Host refused the submission
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Result type alias for engine operations
pub type AutosaveResult<T> = Result<T, AutosaveError>;
