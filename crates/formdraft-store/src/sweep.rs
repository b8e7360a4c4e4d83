//! Expiry sweeping
//!
//! Runs once at setup, before reconciliation reads the page's record, so an
//! expired draft never surfaces a prompt.

use crate::cache::DraftCache;
use crate::error::CacheError;

/// Default retention horizon (5 days)
pub const DEFAULT_RETENTION_SECS: i64 = 432_000;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Keys examined
    pub scanned: usize,
    /// Keys removed for being older than the horizon
    pub removed: Vec<String>,
    /// Keys skipped because they did not decode
    pub malformed: Vec<String>,
}

impl PruneReport {
    /// Number of records kept
    #[inline]
    #[must_use]
    pub fn kept(&self) -> usize {
        self.scanned - self.removed.len() - self.malformed.len()
    }
}

impl DraftCache {
    /// Remove every record whose timestamp is older than `now - retention_secs`
    ///
    /// Malformed entries are skipped, not removed and not fatal.
    ///
    /// # Errors
    /// Only backend failures abort the sweep.
    pub fn prune(&self, now: i64, retention_secs: i64) -> Result<PruneReport, CacheError> {
        let horizon = now.saturating_sub(retention_secs);
        let mut report = PruneReport::default();

        for key in self.namespaced_keys()? {
            report.scanned += 1;
            match self.load_key(&key) {
                Ok(Some(record)) if record.is_older_than(horizon) => {
                    self.store().remove(&key)?;
                    tracing::debug!("Pruned draft {} (saved at {})", key, record.timestamp);
                    report.removed.push(key);
                }
                Ok(_) => {}
                Err(CacheError::MalformedRecord { source, .. }) => {
                    tracing::warn!("Skipping malformed draft {}: {}", key, source);
                    report.malformed.push(key);
                }
                Err(e) => return Err(e),
            }
        }

        if !report.removed.is_empty() {
            tracing::info!(
                "Pruned {} expired drafts ({} scanned)",
                report.removed.len(),
                report.scanned
            );
        }
        Ok(report)
    }
}
