//! Named form values
//!
//! A [`Field`] is what one submitted control contributes to a snapshot.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Value of a captured control
///
/// Serializes as a bare JSON string or a JSON array of strings, so stored
/// records read as `{"name": "tags", "value": ["a", "b"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single-valued control (text, textarea, hidden, checked box)
    Single(String),
    /// Multi-valued control (multiple select)
    Multi(Vec<String>),
}

impl FieldValue {
    /// Every value this field submits, in order
    #[inline]
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Check if the value is multi-valued
    #[inline]
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// Scalar view, if single-valued
    #[inline]
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multi(_) => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => write!(f, "{value}"),
            Self::Multi(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

/// One named value in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Control name attribute
    pub name: String,
    /// Captured value
    pub value: FieldValue,
}

impl Field {
    /// Create new field
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_serializes_as_string() {
        let field = Field::new("title", "Hello");
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, r#"{"name":"title","value":"Hello"}"#);
    }

    #[test]
    fn multi_value_serializes_as_array() {
        let field = Field::new("tags", vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, r#"{"name":"tags","value":["a","b"]}"#);
    }

    #[test]
    fn array_decodes_as_multi() {
        let field: Field = serde_json::from_str(r#"{"name":"tags","value":["x"]}"#).unwrap();
        assert!(field.value.is_multi());
        assert_eq!(field.value.values(), vec!["x"]);
    }

    #[test]
    fn display_joins_multi() {
        let value = FieldValue::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(value.to_string(), "[a, b]");
        assert_eq!(FieldValue::from("x").to_string(), "x");
    }
}
