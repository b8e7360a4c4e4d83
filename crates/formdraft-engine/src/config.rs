//! Engine configuration
//!
//! Two layers:
//! - [`PageConfig`]: per-page values the host embeds as JSON
//! - [`EngineSettings`]: deployment tunables, loaded from TOML

use crate::error::ConfigError;
use formdraft_model::{PageIdentity, CSRF_FIELD, RECOVERY_MARKER_FIELD};
use formdraft_store::{DEFAULT_NAMESPACE, DEFAULT_RETENTION_SECS};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

/// Accept an epoch as an integer or a float, rounding to whole seconds
///
/// Out-of-range floats saturate; the arithmetic downstream is checked.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn lenient_epoch<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|secs| secs.round() as i64))
}

/// Per-page configuration supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// The record does not exist yet; no server timestamp is expected
    pub is_add_view: bool,
    /// Server's last-modified time for the record
    #[serde(deserialize_with = "lenient_epoch")]
    pub last_updated_epoch: Option<i64>,
    /// Clock-skew correction, client minus server, in seconds
    pub client_time_offset: Option<i64>,
    /// Server clock at render time; used to derive the offset when absent
    #[serde(deserialize_with = "lenient_epoch")]
    pub server_time_epoch: Option<i64>,
    /// This page was rendered from a draft recovery submission
    pub is_recovered_autosave: bool,
    /// Page path override for the draft key
    pub autosave_url: Option<String>,
    /// The server confirmed a save of this page since the draft was written
    pub save_acknowledged: bool,
}

impl PageConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the host's JSON config
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load the host's JSON config from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_json(&text)
    }

    /// Mark as an add view
    #[inline]
    #[must_use]
    pub fn add_view(mut self) -> Self {
        self.is_add_view = true;
        self
    }

    /// With last-modified time
    #[inline]
    #[must_use]
    pub fn with_last_updated(mut self, epoch: i64) -> Self {
        self.last_updated_epoch = Some(epoch);
        self
    }

    /// With explicit clock offset
    #[inline]
    #[must_use]
    pub fn with_client_time_offset(mut self, offset: i64) -> Self {
        self.client_time_offset = Some(offset);
        self
    }

    /// Mark as rendered from a recovery submission
    #[inline]
    #[must_use]
    pub fn recovered(mut self) -> Self {
        self.is_recovered_autosave = true;
        self
    }

    /// Mark the page's last save as confirmed by the server
    #[inline]
    #[must_use]
    pub fn acknowledged(mut self) -> Self {
        self.save_acknowledged = true;
        self
    }

    /// Last-modified time, never before the unix epoch
    #[inline]
    #[must_use]
    pub fn last_updated(&self) -> Option<i64> {
        self.last_updated_epoch.map(|epoch| epoch.max(0))
    }

    /// Clock offset, derived from the server render time if not given
    ///
    /// A render time too far from `client_now` to subtract counts as no offset.
    #[must_use]
    pub fn resolve_client_time_offset(&self, client_now: i64) -> i64 {
        match (self.client_time_offset, self.server_time_epoch) {
            (Some(offset), _) => offset,
            (None, Some(server_now)) => client_now.checked_sub(server_now).unwrap_or(0),
            (None, None) => 0,
        }
    }

    /// Page identity, preferring the configured URL over the fallback path
    #[must_use]
    pub fn page_identity(&self, fallback_path: &str) -> PageIdentity {
        PageIdentity::new(self.autosave_url.as_deref().unwrap_or(fallback_path))
    }
}

/// Deployment tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Seconds between periodic saves
    pub save_interval_secs: u64,
    /// Clock-sync safety margin added to the server time
    pub margin_secs: i64,
    /// Drafts older than this are pruned
    pub retention_secs: i64,
    /// Ceiling on the editor-ready wait
    pub editor_ready_timeout_secs: u64,
    /// Key prefix for draft records
    pub namespace: String,
    /// Anti-forgery field name
    pub csrf_field: String,
    /// Field appended to recovery submissions
    pub recovery_marker_field: String,
}

impl EngineSettings {
    /// Create default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML settings; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load TOML settings from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "save_interval_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.retention_secs < 0 {
            return Err(ConfigError::InvalidValue {
                key: "retention_secs",
                message: "must not be negative".to_string(),
            });
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "namespace",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// With save interval
    #[inline]
    #[must_use]
    pub fn with_save_interval(mut self, interval: Duration) -> Self {
        self.save_interval_secs = interval.as_secs().max(1);
        self
    }

    /// With retention horizon
    #[inline]
    #[must_use]
    pub fn with_retention_secs(mut self, secs: i64) -> Self {
        self.retention_secs = secs;
        self
    }

    /// With editor-ready ceiling
    #[inline]
    #[must_use]
    pub fn with_editor_ready_timeout(mut self, timeout: Duration) -> Self {
        self.editor_ready_timeout_secs = timeout.as_secs();
        self
    }

    /// Save interval as a duration
    #[inline]
    #[must_use]
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }

    /// Editor-ready ceiling as a duration
    #[inline]
    #[must_use]
    pub fn editor_ready_timeout(&self) -> Duration {
        Duration::from_secs(self.editor_ready_timeout_secs)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            save_interval_secs: 5,
            margin_secs: 15,
            retention_secs: DEFAULT_RETENTION_SECS,
            editor_ready_timeout_secs: 15,
            namespace: DEFAULT_NAMESPACE.to_string(),
            csrf_field: CSRF_FIELD.to_string(),
            recovery_marker_field: RECOVERY_MARKER_FIELD.to_string(),
        }
    }
}
