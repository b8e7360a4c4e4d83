//! Ordered form snapshots
//!
//! Field order is stable across captures of the same unmodified form, so two
//! snapshots are compared position by position rather than by structural diff.

use crate::field::{Field, FieldValue};
use crate::CSRF_FIELD;
use serde::{Deserialize, Serialize};

/// Ordered capture of a form's named values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<Field>);

impl Snapshot {
    /// Create empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create from fields in captured order
    #[inline]
    #[must_use]
    pub fn from_fields(fields: Vec<Field>) -> Self {
        Self(fields)
    }

    /// Append a field (builder style)
    #[inline]
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(Field::new(name, value));
        self
    }

    /// Append a field
    #[inline]
    pub fn push(&mut self, field: Field) {
        self.0.push(field);
    }

    /// Fields in captured order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.0
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing was captured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First value captured under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Copy of this snapshot with every field named `name` dropped
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        Self(self.0.iter().filter(|f| f.name != name).cloned().collect())
    }

    /// Compare against another snapshot, ignoring the anti-forgery field
    ///
    /// See [`Snapshot::differs_from_ignoring`].
    #[inline]
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.differs_from_ignoring(other, CSRF_FIELD)
    }

    /// Positional comparison that skips the volatile field
    ///
    /// Snapshots of different length always differ. Otherwise a position is
    /// skipped when either side carries `ignored`, and every other position
    /// must agree on both name and value. Skipping on either side keeps the
    /// relation symmetric.
    #[must_use]
    pub fn differs_from_ignoring(&self, other: &Self, ignored: &str) -> bool {
        if self.len() != other.len() {
            return true;
        }
        self.0.iter().zip(other.0.iter()).any(|(a, b)| {
            if a.name == ignored || b.name == ignored {
                return false;
            }
            a != b
        })
    }
}

impl FromIterator<Field> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Snapshot {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn length_mismatch_differs() {
        let a = Snapshot::new().with_field("a", "1");
        let b = Snapshot::new().with_field("a", "1").with_field("b", "2");
        assert!(a.differs_from(&b));
    }

    #[test]
    fn value_mismatch_differs() {
        let a = Snapshot::new().with_field("title", "Draft");
        let b = Snapshot::new().with_field("title", "Live");
        assert!(a.differs_from(&b));
    }

    #[test]
    fn reordered_fields_differ() {
        let a = Snapshot::new().with_field("a", "1").with_field("b", "1");
        let b = Snapshot::new().with_field("b", "1").with_field("a", "1");
        assert!(a.differs_from(&b));
    }

    #[test]
    fn multi_and_single_differ() {
        let a = Snapshot::new().with_field("tags", "x");
        let b = Snapshot::new().with_field("tags", vec!["x".to_string()]);
        assert!(a.differs_from(&b));
    }

    #[test]
    fn csrf_position_is_skipped() {
        let a = Snapshot::new().with_field(CSRF_FIELD, "a").with_field("x", "1");
        let b = Snapshot::new().with_field(CSRF_FIELD, "b").with_field("x", "1");
        assert!(!a.differs_from(&b));
    }

    #[test]
    fn without_drops_every_match() {
        let s = Snapshot::new()
            .with_field("a", "1")
            .with_field("b", "2")
            .with_field("a", "3");
        let trimmed = s.without("a");
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed.get("b"), Some(&FieldValue::from("2")));
    }

    #[test]
    fn empty_snapshots_are_equal() {
        assert!(!Snapshot::new().differs_from(&Snapshot::new()));
    }

    fn arb_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            "[a-c]{0,2}".prop_map(FieldValue::Single),
            prop::collection::vec("[a-c]{0,2}", 0..3).prop_map(FieldValue::Multi),
        ]
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        let name = prop_oneof![
            Just(CSRF_FIELD.to_string()),
            "[a-c]",
        ];
        prop::collection::vec((name, arb_value()), 0..5)
            .prop_map(|pairs| {
                pairs
                    .into_iter()
                    .map(|(n, v)| Field::new(n, v))
                    .collect::<Snapshot>()
            })
    }

    proptest! {
        #[test]
        fn prop_comparison_is_symmetric(a in arb_snapshot(), b in arb_snapshot()) {
            prop_assert_eq!(a.differs_from(&b), b.differs_from(&a));
        }

        #[test]
        fn prop_snapshot_never_differs_from_itself(a in arb_snapshot()) {
            prop_assert!(!a.differs_from(&a));
        }
    }
}
