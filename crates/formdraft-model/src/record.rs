//! Persisted draft records and server metadata

use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

/// The single persisted autosave entry for a page
///
/// Stored as `{"formValues": [...], "timestamp": <unix secs>, "saveCount": n}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    /// Captured form values
    pub form_values: Snapshot,
    /// Unix seconds of the capture
    pub timestamp: i64,
    /// Page loads that have written this record (diagnostic only)
    #[serde(default)]
    pub save_count: u32,
}

impl DraftRecord {
    /// Create new record
    #[inline]
    #[must_use]
    pub fn new(form_values: Snapshot, timestamp: i64, save_count: u32) -> Self {
        Self {
            form_values,
            timestamp,
            save_count,
        }
    }

    /// Check if the record is older than `horizon` (unix seconds)
    #[inline]
    #[must_use]
    pub fn is_older_than(&self, horizon: i64) -> bool {
        self.timestamp < horizon
    }
}

/// Server's view of the record being edited
///
/// `last_modified_epoch` is `None` when the record does not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    /// Last-modified time in unix seconds
    #[serde(rename = "last_updated_epoch", default)]
    pub last_modified_epoch: Option<i64>,
}

impl ServerMetadata {
    /// Metadata for an existing record
    #[inline]
    #[must_use]
    pub fn modified_at(epoch: i64) -> Self {
        Self {
            last_modified_epoch: Some(epoch),
        }
    }

    /// Metadata for a record that does not exist yet
    #[inline]
    #[must_use]
    pub fn absent() -> Self {
        Self {
            last_modified_epoch: None,
        }
    }
}
