//! Recovery form reconstruction
//!
//! Rebuilds a submittable form from a stored snapshot. Current controls are
//! disabled (so they no longer submit), the anti-forgery field is refreshed
//! to the page's current token, one control is appended per stored field and
//! a marker field tells the server this is a draft recovery, not a save.

use crate::capture::{ControlKind, FormControl, ValueSource};
use crate::config::EngineSettings;
use formdraft_model::{FieldValue, Snapshot};

/// Form ready to be submitted as a draft recovery
#[derive(Debug, Clone)]
pub struct RecoveryForm {
    controls: Vec<FormControl>,
    marker_field: String,
}

impl RecoveryForm {
    /// Rebuild the page's form around a stored snapshot
    ///
    /// `csrf_token` is the page's current token. If the page has no
    /// anti-forgery control and a token is known, one is appended.
    #[must_use]
    pub fn build(
        current: Vec<FormControl>,
        draft: &Snapshot,
        csrf_token: Option<&str>,
        settings: &EngineSettings,
    ) -> Self {
        let csrf_field = settings.csrf_field.as_str();
        let mut has_csrf = false;

        let mut controls: Vec<FormControl> = current
            .into_iter()
            .map(|mut control| {
                if control.is_named(csrf_field) {
                    has_csrf = true;
                    if let Some(token) = csrf_token {
                        control.source = ValueSource::Native(FieldValue::from(token));
                    }
                    control.disabled = false;
                    control
                } else {
                    control.disabled()
                }
            })
            .collect();

        if !has_csrf {
            if let Some(token) = csrf_token {
                controls.push(FormControl::hidden(csrf_field, token));
            }
        }

        for field in draft.fields().iter().filter(|f| f.name != csrf_field) {
            let control = match &field.value {
                FieldValue::Single(value) => FormControl::hidden(field.name.clone(), value.clone()),
                FieldValue::Multi(values) => {
                    FormControl::new(field.name.clone(), ControlKind::SelectMultiple, values.clone())
                }
            };
            controls.push(control);
        }

        controls.push(FormControl::hidden(settings.recovery_marker_field.clone(), "1"));

        Self {
            controls,
            marker_field: settings.recovery_marker_field.clone(),
        }
    }

    /// Every control, including the disabled originals
    #[inline]
    #[must_use]
    pub fn controls(&self) -> &[FormControl] {
        &self.controls
    }

    /// Name of the recovery marker field
    #[inline]
    #[must_use]
    pub fn marker_field(&self) -> &str {
        &self.marker_field
    }

    /// Name/value pairs a native submission would post, in order
    #[must_use]
    pub fn payload(&self) -> Vec<(String, String)> {
        self.controls
            .iter()
            .filter_map(FormControl::submitted_field)
            .flat_map(|field| {
                field
                    .value
                    .values()
                    .into_iter()
                    .map(|v| (field.name.clone(), v.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Check if the submission carries the recovery marker
    #[must_use]
    pub fn is_recovery(&self) -> bool {
        self.controls
            .iter()
            .any(|c| c.is_named(&self.marker_field) && !c.disabled)
    }
}
