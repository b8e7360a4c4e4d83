//! Periodic persistence
//!
//! Captures the form every save interval and overwrites the page's draft
//! record. At most one timer runs per [`PeriodicSaver`].

use crate::capture::capture;
use crate::context::AutosaveContext;
use crate::host::FormHost;
use formdraft_model::DraftRecord;
use formdraft_store::{CacheError, DraftCache};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// One capture-and-write step, shared by the timer and explicit saves
#[derive(Clone)]
pub struct Autosaver {
    ctx: Arc<AutosaveContext>,
    cache: DraftCache,
    form: Arc<dyn FormHost>,
    save_count: u32,
}

impl Autosaver {
    /// Create saver writing records tagged with `save_count`
    #[must_use]
    pub fn new(
        ctx: Arc<AutosaveContext>,
        cache: DraftCache,
        form: Arc<dyn FormHost>,
        save_count: u32,
    ) -> Self {
        Self {
            ctx,
            cache,
            form,
            save_count,
        }
    }

    /// Load counter carried by every record
    #[inline]
    #[must_use]
    pub fn save_count(&self) -> u32 {
        self.save_count
    }

    /// Capture the form and overwrite the stored draft
    pub fn save_once(&self) -> Result<DraftRecord, CacheError> {
        let snapshot = capture(&self.form.controls(), &self.ctx.settings().csrf_field);
        let record = DraftRecord::new(snapshot, self.ctx.now(), self.save_count);
        self.cache.store_record(self.ctx.page(), &record)?;
        tracing::trace!(
            "Saved draft for {} ({} fields)",
            self.ctx.page(),
            record.form_values.len()
        );
        Ok(record)
    }

    async fn run(self) {
        let interval = self.ctx.settings().save_interval();
        tracing::debug!(
            "Autosaving {} every {}s",
            self.ctx.page(),
            interval.as_secs()
        );
        loop {
            sleep(interval).await;
            if let Err(e) = self.save_once() {
                tracing::warn!("Autosave of {} failed: {}", self.ctx.page(), e);
            }
        }
    }
}

impl fmt::Debug for Autosaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autosaver")
            .field("page", self.ctx.page())
            .field("cache", &self.cache)
            .field("save_count", &self.save_count)
            .finish_non_exhaustive()
    }
}

/// Handle to the background save loop
///
/// Dropping the handle stops the loop.
#[derive(Debug, Default)]
pub struct PeriodicSaver {
    handle: Option<JoinHandle<()>>,
}

impl PeriodicSaver {
    /// Create stopped saver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the loop; `false` if one is already running
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, saver: Autosaver) -> bool {
        if self.is_running() {
            tracing::debug!("Autosave already running, ignoring start");
            return false;
        }
        self.handle = Some(tokio::spawn(saver.run()));
        true
    }

    /// Check if the loop is live
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the loop; a no-op when stopped
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for PeriodicSaver {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FormControl;
    use crate::clock::ManualClock;
    use crate::config::{EngineSettings, PageConfig};
    use crate::host::StaticForm;
    use formdraft_model::{PageIdentity, Snapshot};
    use formdraft_store::MemoryStore;
    use std::time::Duration;

    fn setup(now: i64) -> (Autosaver, DraftCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let ctx = Arc::new(AutosaveContext::with_clock(
            PageIdentity::new("/story/1/"),
            PageConfig::new(),
            EngineSettings::default(),
            clock.clone(),
        ));
        let cache = DraftCache::new(Arc::new(MemoryStore::new()));
        let form = Arc::new(StaticForm::new(vec![FormControl::input("title", "Hello")]));
        (Autosaver::new(ctx, cache.clone(), form, 3), cache, clock)
    }

    #[test]
    fn save_once_writes_snapshot_time_and_count() {
        let (saver, cache, _clock) = setup(500);
        let record = saver.save_once().unwrap();

        assert_eq!(record.timestamp, 500);
        assert_eq!(record.save_count, 3);
        assert_eq!(record.form_values, Snapshot::new().with_field("title", "Hello"));
        assert_eq!(cache.load(&PageIdentity::new("/story/1/")).unwrap(), Some(record));
    }

    #[tokio::test(start_paused = true)]
    async fn loop_saves_once_per_interval() {
        let (saver, cache, clock) = setup(0);
        let page = PageIdentity::new("/story/1/");
        let mut periodic = PeriodicSaver::new();
        assert!(periodic.start(saver));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(cache.load(&page).unwrap().is_none());

        clock.set(5);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(cache.load(&page).unwrap().unwrap().timestamp, 5);

        clock.set(10);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cache.load(&page).unwrap().unwrap().timestamp, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_ignored() {
        let (saver, _cache, _clock) = setup(0);
        let mut periodic = PeriodicSaver::new();
        assert!(periodic.start(saver.clone()));
        assert!(!periodic.start(saver));
        assert!(periodic.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_saving() {
        let (saver, cache, _clock) = setup(0);
        let page = PageIdentity::new("/story/1/");
        let mut periodic = PeriodicSaver::new();
        periodic.start(saver);
        periodic.cancel();
        assert!(!periodic.is_running());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(cache.load(&page).unwrap().is_none());
    }
}
