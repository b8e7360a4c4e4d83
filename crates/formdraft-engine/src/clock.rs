//! Clocks and the staleness policy
//!
//! The policy turns the server's last-modified time into an
//! "effective server time" on the client's clock, padded by a safety margin,
//! so it can be ordered against a locally saved draft.

use crate::error::AutosaveError;
use formdraft_model::ServerMetadata;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current unix time in seconds
pub trait Clock: Send + Sync {
    /// Current unix time in seconds
    fn now_epoch(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create clock fixed at `now`
    #[inline]
    #[must_use]
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Jump to `now`
    #[inline]
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs`
    #[inline]
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Decides how a draft's timestamp orders against server state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    /// The record does not exist on the server yet
    pub is_add_view: bool,
    /// Client minus server clock, in seconds
    pub client_time_offset: i64,
    /// Safety margin in seconds
    pub margin_secs: i64,
}

impl StalenessPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new(is_add_view: bool, client_time_offset: i64, margin_secs: i64) -> Self {
        Self {
            is_add_view,
            client_time_offset,
            margin_secs,
        }
    }

    /// Server's last-modified time on the client clock, plus the margin
    ///
    /// `None` on an add view without a timestamp: there is nothing on the
    /// server to be stale against, so no draft is compared.
    ///
    /// # Errors
    /// [`AutosaveError::MetadataUnavailable`] when an existing record has no
    /// timestamp, or when the shifted timestamp leaves the `i64` range.
    pub fn effective_server_time(
        &self,
        metadata: ServerMetadata,
    ) -> Result<Option<i64>, AutosaveError> {
        match metadata.last_modified_epoch {
            Some(epoch) => epoch
                .checked_add(self.client_time_offset)
                .and_then(|t| t.checked_add(self.margin_secs))
                .map(Some)
                .ok_or_else(|| {
                    AutosaveError::MetadataUnavailable(format!(
                        "last-modified time {epoch} out of range"
                    ))
                }),
            None if self.is_add_view => Ok(None),
            None => Err(AutosaveError::MetadataUnavailable(
                "existing record has no last-modified time".to_string(),
            )),
        }
    }

    /// Check if a draft saved at `draft_timestamp` postdates server state
    ///
    /// Ties favor the server.
    #[inline]
    #[must_use]
    pub fn draft_is_newer(draft_timestamp: i64, effective_server_time: i64) -> bool {
        draft_timestamp > effective_server_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn existing_record_gets_offset_and_margin() {
        let policy = StalenessPolicy::new(false, 0, 15);
        let effective = policy
            .effective_server_time(ServerMetadata::modified_at(1000))
            .unwrap();
        assert_eq!(effective, Some(1015));
    }

    #[test]
    fn offset_shifts_onto_client_clock() {
        let policy = StalenessPolicy::new(false, -40, 15);
        let effective = policy
            .effective_server_time(ServerMetadata::modified_at(1000))
            .unwrap();
        assert_eq!(effective, Some(975));
    }

    #[test]
    fn add_view_without_timestamp_has_nothing_to_compare() {
        let policy = StalenessPolicy::new(true, 99, 15);
        assert_eq!(policy.effective_server_time(ServerMetadata::absent()).unwrap(), None);
    }

    #[test]
    fn out_of_range_timestamp_fails_closed() {
        let policy = StalenessPolicy::new(false, 0, 15);
        let err = policy
            .effective_server_time(ServerMetadata::modified_at(i64::MAX))
            .unwrap_err();
        assert!(matches!(err, AutosaveError::MetadataUnavailable(_)));

        let behind = StalenessPolicy::new(false, i64::MIN, 15);
        assert!(behind
            .effective_server_time(ServerMetadata::modified_at(-1))
            .is_err());
    }

    #[test]
    fn existing_record_without_timestamp_fails_closed() {
        let policy = StalenessPolicy::new(false, 0, 15);
        let err = policy.effective_server_time(ServerMetadata::absent()).unwrap_err();
        assert!(matches!(err, AutosaveError::MetadataUnavailable(_)));
    }

    #[test]
    fn ties_favor_the_server() {
        assert!(!StalenessPolicy::draft_is_newer(100, 100));
        assert!(StalenessPolicy::draft_is_newer(101, 100));
    }

    #[test]
    fn manual_clock_moves_on_request() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now_epoch(), 15);
        clock.set(3);
        assert_eq!(clock.now_epoch(), 3);
    }

    proptest! {
        #[test]
        fn prop_later_server_edits_never_make_a_draft_newer(
            draft in 0i64..10_000,
            server in 0i64..10_000,
            later in 0i64..100,
            offset in -100i64..100,
        ) {
            let policy = StalenessPolicy::new(false, offset, 15);
            let before = policy
                .effective_server_time(ServerMetadata::modified_at(server))
                .unwrap()
                .unwrap();
            let after = policy
                .effective_server_time(ServerMetadata::modified_at(server + later))
                .unwrap()
                .unwrap();
            if !StalenessPolicy::draft_is_newer(draft, before) {
                prop_assert!(!StalenessPolicy::draft_is_newer(draft, after));
            }
        }
    }
}
