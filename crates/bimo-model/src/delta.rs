#![forbid(unsafe_code)]

//! Per-field change history and change payloads.

use std::collections::BTreeMap;

use crate::path;
use crate::value::Value;

/// Value history of one field since the last reset.
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    /// Value before the first change since the last reset.
    pub original: Value,
    /// Value before the most recent change.
    pub previous: Value,
    /// Current value.
    pub actual: Value,
}

impl Delta {
    pub(crate) fn first(previous: Value, actual: Value) -> Self {
        Self {
            original: previous.clone(),
            previous,
            actual,
        }
    }

    pub(crate) fn advance(&mut self, previous: Value, actual: Value) {
        self.previous = previous;
        self.actual = actual;
    }

    /// The field is back at its original value.
    #[must_use]
    pub fn is_reverted(&self) -> bool {
        self.actual == self.original
    }
}

/// A change payload handed to watchers, and the shape of [`Model::delta`].
///
/// Field deltas of the model itself live next to the payloads of nested
/// models, keyed by the nested field name.
///
/// [`Model::delta`]: crate::Model::delta
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    fields: BTreeMap<String, Delta>,
    nested: BTreeMap<String, Changes>,
    refresh: bool,
}

impl Changes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn single(key: &str, delta: Delta) -> Self {
        let mut out = Self::new();
        out.fields.insert(key.to_owned(), delta);
        out
    }

    pub(crate) fn from_fields(fields: BTreeMap<String, Delta>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub(crate) fn with_refresh(mut self) -> Self {
        self.refresh = true;
        self
    }

    pub(crate) fn insert_nested(&mut self, key: &str, changes: Changes) {
        self.nested.insert(key.to_owned(), changes);
    }

    /// Delta of a field; dotted or bracket paths walk into nested payloads.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Delta> {
        let segments = path::segments(key);
        let (leaf, parents) = segments.split_last()?;
        let mut level = self;
        for segment in parents {
            level = level.nested.get(segment)?;
        }
        level.fields.get(leaf)
    }

    /// Whether a field of this level is part of the payload.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Payload of a nested model.
    #[must_use]
    pub fn nested(&self, key: &str) -> Option<&Changes> {
        self.nested.get(key)
    }

    /// Field names of this level, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Delta)> {
        self.fields.iter().map(|(k, d)| (k.as_str(), d))
    }

    pub fn nested_iter(&self) -> impl Iterator<Item = (&str, &Changes)> {
        self.nested.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Number of field entries at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// No field changed here or in any nested payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.nested.values().all(Changes::is_empty)
    }

    /// Set by [`Model::refresh`](crate::Model::refresh): bindings push the
    /// value even when the control already shows it.
    #[must_use]
    pub fn is_refresh(&self) -> bool {
        self.refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_change_copies_previous_into_original() {
        let d = Delta::first("Kamino".into(), "Geonosis".into());
        assert_eq!(d.original, Value::from("Kamino"));
        assert_eq!(d.previous, Value::from("Kamino"));
        assert_eq!(d.actual, Value::from("Geonosis"));
        assert!(!d.is_reverted());
    }

    #[test]
    fn advance_keeps_original() {
        let mut d = Delta::first(35.into(), 105.into());
        d.advance(105.into(), 35.into());
        assert_eq!(d.previous, Value::from(105));
        assert!(d.is_reverted());
    }

    #[test]
    fn nested_lookup_by_path() {
        let mut inner = Changes::new();
        inner.fields.insert(
            "city".into(),
            Delta::first("San Jose".into(), "Fresno".into()),
        );
        let mut outer = Changes::single("age", Delta::first(1.into(), 2.into()));
        outer.insert_nested("address", inner);

        assert!(outer.get("age").is_some());
        assert_eq!(
            outer.get("address.city").map(|d| &d.actual),
            Some(&Value::from("Fresno"))
        );
        assert!(outer.get("address.zip").is_none());
        assert!(outer.get("missing.city").is_none());
        assert!(!outer.contains("address"));
    }

    #[test]
    fn empty_nested_payloads_do_not_count() {
        let mut c = Changes::new();
        c.insert_nested("address", Changes::new());
        assert!(c.is_empty());
    }
}
