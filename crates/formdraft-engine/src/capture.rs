//! Form snapshot capture
//!
//! Turns the host's live controls into an ordered [`Snapshot`]. Each control
//! carries the [`ValueSource`] the surrounding UI reads it through, chosen
//! once when the host describes the control.

use formdraft_model::{Field, FieldValue, Snapshot};
use std::fmt;
use std::sync::Arc;

/// A rich-text widget that shadows a native control's value
pub trait RichTextWidget: Send + Sync {
    /// Content as the widget currently holds it
    fn current_value(&self) -> String;
}

/// Where a control's value is read from
#[derive(Clone)]
pub enum ValueSource {
    /// The native control's own value
    Native(FieldValue),
    /// A rich-text widget layered over the control
    RichText(Arc<dyn RichTextWidget>),
}

impl ValueSource {
    /// Read the value through this source
    #[must_use]
    pub fn read(&self) -> FieldValue {
        match self {
            Self::Native(value) => value.clone(),
            Self::RichText(widget) => FieldValue::Single(widget.current_value()),
        }
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(value) => f.debug_tuple("Native").field(value).finish(),
            Self::RichText(_) => f.write_str("RichText(..)"),
        }
    }
}

/// Control type, as far as capture cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Single-line input
    Input,
    /// Multi-line text
    TextArea,
    /// Hidden input
    Hidden,
    /// Checkbox
    Checkbox,
    /// Radio button
    Radio,
    /// Single select
    Select,
    /// Multiple select
    SelectMultiple,
}

impl ControlKind {
    /// Check if the control only submits while checked
    #[inline]
    #[must_use]
    pub fn is_checkable(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }
}

/// One control of the host form, in document order
#[derive(Debug, Clone)]
pub struct FormControl {
    /// Name attribute; unnamed controls are never captured
    pub name: Option<String>,
    /// Control type
    pub kind: ControlKind,
    /// Value access
    pub source: ValueSource,
    /// Checked state (checkable controls only)
    pub checked: bool,
    /// Disabled controls do not submit and are not captured
    pub disabled: bool,
}

impl FormControl {
    /// Create a control reading its native value
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ControlKind, value: impl Into<FieldValue>) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            source: ValueSource::Native(value.into()),
            checked: false,
            disabled: false,
        }
    }

    /// Single-line text input
    #[inline]
    #[must_use]
    pub fn input(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Input, value.into())
    }

    /// Textarea
    #[inline]
    #[must_use]
    pub fn textarea(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlKind::TextArea, value.into())
    }

    /// Hidden input
    #[inline]
    #[must_use]
    pub fn hidden(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Hidden, value.into())
    }

    /// Checkbox submitting `value` while checked
    #[inline]
    #[must_use]
    pub fn checkbox(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        let mut control = Self::new(name, ControlKind::Checkbox, value.into());
        control.checked = checked;
        control
    }

    /// Radio button submitting `value` while checked
    #[inline]
    #[must_use]
    pub fn radio(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        let mut control = Self::new(name, ControlKind::Radio, value.into());
        control.checked = checked;
        control
    }

    /// Single select
    #[inline]
    #[must_use]
    pub fn select(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Select, value.into())
    }

    /// Multiple select with the given selected values
    #[inline]
    #[must_use]
    pub fn select_multiple(name: impl Into<String>, selected: Vec<String>) -> Self {
        Self::new(name, ControlKind::SelectMultiple, selected)
    }

    /// Textarea whose content lives in a rich-text widget
    #[must_use]
    pub fn rich_text(name: impl Into<String>, widget: Arc<dyn RichTextWidget>) -> Self {
        Self {
            name: Some(name.into()),
            kind: ControlKind::TextArea,
            source: ValueSource::RichText(widget),
            checked: false,
            disabled: false,
        }
    }

    /// Control without a name attribute
    #[must_use]
    pub fn unnamed(kind: ControlKind, value: impl Into<FieldValue>) -> Self {
        Self {
            name: None,
            kind,
            source: ValueSource::Native(value.into()),
            checked: false,
            disabled: false,
        }
    }

    /// Mark disabled
    #[inline]
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Check if the control has the given name
    #[inline]
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// The field this control submits right now, if any
    #[must_use]
    pub fn submitted_field(&self) -> Option<Field> {
        let name = self.name.as_ref()?;
        if self.disabled || (self.kind.is_checkable() && !self.checked) {
            return None;
        }
        let value = match (self.kind, self.source.read()) {
            (ControlKind::SelectMultiple, FieldValue::Single(v)) => FieldValue::Multi(vec![v]),
            (_, value) => value,
        };
        Some(Field::new(name.clone(), value))
    }
}

/// Capture every submitting control except `csrf_field`, in document order
///
/// Unchecked checkables contribute no field at all.
#[must_use]
pub fn capture(controls: &[FormControl], csrf_field: &str) -> Snapshot {
    controls
        .iter()
        .filter(|c| !c.is_named(csrf_field))
        .filter_map(FormControl::submitted_field)
        .collect()
}
