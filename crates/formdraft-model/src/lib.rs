//! Form Draft Model
//!
//! Plain data shared by every layer of the draft-synchronization engine.
//!
//! # Core Concepts
//!
//! - [`Snapshot`]: ordered capture of a form's named fields at one instant
//! - [`Field`] / [`FieldValue`]: one named value, scalar or multi-valued
//! - [`DraftRecord`]: the single persisted autosave entry for a page
//! - [`ServerMetadata`]: the server's last-modified time for the record
//! - [`PageIdentity`]: the logical page path a draft belongs to
//!
//! # Example
//!
//! ```rust,ignore
//! use formdraft_model::{DraftRecord, Snapshot};
//!
//! let current = Snapshot::new().with_field("title", "Live");
//! let record = DraftRecord::new(Snapshot::new().with_field("title", "Draft"), 2000, 1);
//!
//! assert!(record.form_values.differs_from(&current));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod field;
mod page;
mod record;
mod snapshot;

pub use field::{Field, FieldValue};
pub use page::PageIdentity;
pub use record::{DraftRecord, ServerMetadata};
pub use snapshot::Snapshot;

/// Name of the anti-forgery token field, ignored by snapshot comparison
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

/// Marker field appended to a revert submission
pub const RECOVERY_MARKER_FIELD: &str = "is_retrieved_from_autosave";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn record_survives_json_and_compares_equal() {
        let snapshot = Snapshot::new()
            .with_field(CSRF_FIELD, "token-a")
            .with_field("title", "Hello")
            .with_field("tags", vec!["a".to_string(), "b".to_string()]);
        let record = DraftRecord::new(snapshot.clone(), 1_700_000_000, 3);

        let json = serde_json::to_string(&record).unwrap();
        let decoded: DraftRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, record);
        assert!(!decoded.form_values.differs_from(&snapshot));
    }

    #[test]
    fn rotated_token_is_not_a_difference() {
        let saved = Snapshot::new()
            .with_field(CSRF_FIELD, "old")
            .with_field("body", "text");
        let current = Snapshot::new()
            .with_field(CSRF_FIELD, "new")
            .with_field("body", "text");

        assert!(!saved.differs_from(&current));
    }
}
