//! Testing utilities for the formdraft workspace
//!
//! Shared form doubles, fixtures, and snapshot builders.

#![allow(missing_docs)]

use formdraft_engine::{
    AutosaveContext, EngineSettings, FormControl, FormHost, ManualClock, PageConfig,
    RecoveryForm, RichTextWidget, SubmissionError,
};
use formdraft_model::{DraftRecord, FieldValue, PageIdentity, Snapshot};
use formdraft_store::{DraftCache, DurableStore, MemoryStore};
use parking_lot::Mutex;
use std::sync::Arc;

pub const TEST_PAGE: &str = "/admin/stories/story/1/change/";

/// Form whose controls can be edited between captures
#[derive(Debug, Default)]
pub struct FakeForm {
    controls: Mutex<Vec<FormControl>>,
    submitted: Mutex<Vec<RecoveryForm>>,
    reloads: Mutex<usize>,
    reject_submissions: Mutex<bool>,
}

impl FakeForm {
    pub fn new(controls: Vec<FormControl>) -> Self {
        Self {
            controls: Mutex::new(controls),
            ..Self::default()
        }
    }

    pub fn set_controls(&self, controls: Vec<FormControl>) {
        *self.controls.lock() = controls;
    }

    /// Replace the value of every control named `name`
    pub fn set_value(&self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        for control in self.controls.lock().iter_mut().filter(|c| c.is_named(name)) {
            control.source = formdraft_engine::ValueSource::Native(value.clone());
        }
    }

    pub fn reject_submissions(&self) {
        *self.reject_submissions.lock() = true;
    }

    pub fn submitted(&self) -> Vec<RecoveryForm> {
        self.submitted.lock().clone()
    }

    pub fn last_submitted(&self) -> Option<RecoveryForm> {
        self.submitted.lock().last().cloned()
    }

    pub fn reloads(&self) -> usize {
        *self.reloads.lock()
    }
}

impl FormHost for FakeForm {
    fn controls(&self) -> Vec<FormControl> {
        self.controls.lock().clone()
    }

    fn submit(&self, form: RecoveryForm) -> Result<(), SubmissionError> {
        if *self.reject_submissions.lock() {
            return Err(SubmissionError::Rejected("403 Forbidden".to_string()));
        }
        self.submitted.lock().push(form);
        Ok(())
    }

    fn reload(&self) {
        *self.reloads.lock() += 1;
    }
}

/// Rich-text widget double
#[derive(Debug, Default)]
pub struct FakeEditor {
    content: Mutex<String>,
}

impl FakeEditor {
    pub fn new(content: &str) -> Arc<Self> {
        Arc::new(Self {
            content: Mutex::new(content.to_string()),
        })
    }

    pub fn type_text(&self, content: &str) {
        *self.content.lock() = content.to_string();
    }
}

impl RichTextWidget for FakeEditor {
    fn current_value(&self) -> String {
        self.content.lock().clone()
    }
}

pub fn test_page() -> PageIdentity {
    PageIdentity::new(TEST_PAGE)
}

/// Snapshot of single-valued fields, in order
pub fn snapshot(fields: &[(&str, &str)]) -> Snapshot {
    fields
        .iter()
        .fold(Snapshot::new(), |s, (name, value)| s.with_field(*name, *value))
}

pub fn draft(fields: &[(&str, &str)], timestamp: i64) -> DraftRecord {
    DraftRecord::new(snapshot(fields), timestamp, 1)
}

/// Plain text inputs for each field, in order
pub fn inputs(fields: &[(&str, &str)]) -> Vec<FormControl> {
    fields
        .iter()
        .map(|(name, value)| FormControl::input(*name, *value))
        .collect()
}

pub fn memory_store() -> Arc<dyn DurableStore> {
    Arc::new(MemoryStore::new())
}

/// Cache over `store` in the default namespace
pub fn cache(store: &Arc<dyn DurableStore>) -> DraftCache {
    DraftCache::new(store.clone())
}

pub fn context(config: PageConfig, clock: &Arc<ManualClock>) -> Arc<AutosaveContext> {
    context_with_settings(config, EngineSettings::default(), clock)
}

pub fn context_with_settings(
    config: PageConfig,
    settings: EngineSettings,
    clock: &Arc<ManualClock>,
) -> Arc<AutosaveContext> {
    Arc::new(AutosaveContext::with_clock(
        test_page(),
        config,
        settings,
        clock.clone(),
    ))
}

/// Config of an existing record last modified at `epoch`, clocks in sync
pub fn change_view(epoch: i64) -> PageConfig {
    PageConfig::new()
        .with_last_updated(epoch)
        .with_client_time_offset(0)
}
