//! Host form integration
//!
//! The host page owns rendering and submission; the engine only reads its
//! controls and hands it a rebuilt form to submit.

use crate::capture::{FormControl, ValueSource};
use crate::error::SubmissionError;
use crate::revert::RecoveryForm;
use formdraft_model::{FieldValue, Snapshot};
use parking_lot::Mutex;

/// The page's primary form
pub trait FormHost: Send + Sync {
    /// Current controls in document order
    fn controls(&self) -> Vec<FormControl>;

    /// Submit a rebuilt form natively (full page navigation)
    fn submit(&self, form: RecoveryForm) -> Result<(), SubmissionError>;

    /// Reload the page from the server
    fn reload(&self);

    /// Current anti-forgery token, read from the named hidden field
    fn csrf_token(&self, field: &str) -> Option<String> {
        self.controls()
            .into_iter()
            .find(|c| c.is_named(field))
            .and_then(|c| match c.source {
                ValueSource::Native(FieldValue::Single(token)) => Some(token),
                _ => None,
            })
    }
}

/// Form with a fixed set of controls that records what it is asked to do
#[derive(Debug, Default)]
pub struct StaticForm {
    controls: Vec<FormControl>,
    submitted: Mutex<Vec<RecoveryForm>>,
    reloads: Mutex<usize>,
}

impl StaticForm {
    /// Create form from controls
    #[inline]
    #[must_use]
    pub fn new(controls: Vec<FormControl>) -> Self {
        Self {
            controls,
            ..Self::default()
        }
    }

    /// Form whose controls submit exactly `snapshot`
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::new(
            snapshot
                .fields()
                .iter()
                .map(|f| match &f.value {
                    FieldValue::Single(v) => FormControl::input(f.name.clone(), v.clone()),
                    FieldValue::Multi(vs) => FormControl::select_multiple(f.name.clone(), vs.clone()),
                })
                .collect(),
        )
    }

    /// Forms submitted so far
    #[must_use]
    pub fn submitted(&self) -> Vec<RecoveryForm> {
        self.submitted.lock().clone()
    }

    /// Reloads requested so far
    #[must_use]
    pub fn reloads(&self) -> usize {
        *self.reloads.lock()
    }
}

impl FormHost for StaticForm {
    fn controls(&self) -> Vec<FormControl> {
        self.controls.clone()
    }

    fn submit(&self, form: RecoveryForm) -> Result<(), SubmissionError> {
        self.submitted.lock().push(form);
        Ok(())
    }

    fn reload(&self) {
        *self.reloads.lock() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::capture;
    use formdraft_model::CSRF_FIELD;

    #[test]
    fn csrf_token_is_read_from_the_named_field() {
        let form = StaticForm::new(vec![
            FormControl::input("title", "x"),
            FormControl::hidden(CSRF_FIELD, "abc"),
        ]);
        assert_eq!(form.csrf_token(CSRF_FIELD).as_deref(), Some("abc"));
        assert!(form.csrf_token("missing").is_none());
    }

    #[test]
    fn from_snapshot_captures_back_to_the_snapshot() {
        let snapshot = Snapshot::new()
            .with_field("title", "x")
            .with_field("tags", vec!["a".to_string()]);
        let form = StaticForm::from_snapshot(&snapshot);
        assert_eq!(capture(&form.controls(), CSRF_FIELD), snapshot);
    }
}
