//! Per-page context
//!
//! Built once at setup and shared by every component, in place of ambient
//! process-wide state.

use crate::clock::{Clock, StalenessPolicy, SystemClock};
use crate::config::{EngineSettings, PageConfig};
use formdraft_model::PageIdentity;
use std::fmt;
use std::sync::Arc;

/// Everything a component needs to know about the current page load
#[derive(Clone)]
pub struct AutosaveContext {
    page: PageIdentity,
    config: PageConfig,
    settings: EngineSettings,
    clock: Arc<dyn Clock>,
    client_time_offset: i64,
}

impl AutosaveContext {
    /// Create context on the wall clock
    #[must_use]
    pub fn new(page: PageIdentity, config: PageConfig, settings: EngineSettings) -> Self {
        Self::with_clock(page, config, settings, Arc::new(SystemClock))
    }

    /// Create context on a caller-supplied clock
    ///
    /// The clock offset is resolved once, against the clock's current time.
    #[must_use]
    pub fn with_clock(
        page: PageIdentity,
        config: PageConfig,
        settings: EngineSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let client_time_offset = config.resolve_client_time_offset(clock.now_epoch());
        Self {
            page,
            config,
            settings,
            clock,
            client_time_offset,
        }
    }

    /// Page the draft belongs to
    #[inline]
    #[must_use]
    pub fn page(&self) -> &PageIdentity {
        &self.page
    }

    /// Host-supplied page config
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Engine tunables
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Current unix time
    #[inline]
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now_epoch()
    }

    /// Resolved client minus server clock offset
    #[inline]
    #[must_use]
    pub fn client_time_offset(&self) -> i64 {
        self.client_time_offset
    }

    /// Staleness policy for this page
    #[inline]
    #[must_use]
    pub fn staleness_policy(&self) -> StalenessPolicy {
        StalenessPolicy::new(
            self.config.is_add_view,
            self.client_time_offset,
            self.settings.margin_secs,
        )
    }
}

impl fmt::Debug for AutosaveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutosaveContext")
            .field("page", &self.page)
            .field("config", &self.config)
            .field("settings", &self.settings)
            .field("client_time_offset", &self.client_time_offset)
            .finish_non_exhaustive()
    }
}
