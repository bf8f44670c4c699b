use std::collections::BTreeMap;

use super::calculated::ComputedWrite;
use super::Value;

/// A snapshot of form values keyed by dot-separated field paths.
///
/// Nested paths like `"address.country"` are stored as nested [`Value::Object`]s,
/// so a lookup of `"address"` yields the whole object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    data: BTreeMap<String, Value>,
}

impl FieldValues {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value at a dot-separated path. Creates intermediate objects as needed.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value.into());
        self
    }

    /// Insert a value at a dot-separated path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        Self::insert_recursive(&mut self.data, &segments, value);
    }

    /// Look up a value by dot-separated path.
    ///
    /// Returns `None` when any segment is missing or an intermediate segment is
    /// not an object.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        Self::get_recursive(&self.data, &segments)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fold a proposed write into this snapshot.
    ///
    /// The engine never calls this itself; hosts use it to update their own copy.
    pub fn apply(&mut self, write: &ComputedWrite) {
        self.insert(&write.target, write.value.clone());
    }

    /// Top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn insert_recursive(map: &mut BTreeMap<String, Value>, segments: &[&str], value: Value) {
        match segments {
            [] => {}
            [last] => {
                map.insert((*last).to_owned(), value);
            }
            [first, rest @ ..] => {
                let entry = map
                    .entry((*first).to_owned())
                    .or_insert_with(|| Value::Object(BTreeMap::new()));
                if !matches!(entry, Value::Object(_)) {
                    *entry = Value::Object(BTreeMap::new());
                }
                if let Value::Object(nested) = entry {
                    Self::insert_recursive(nested, rest, value);
                }
            }
        }
    }

    fn get_recursive<'a>(map: &'a BTreeMap<String, Value>, segments: &[&str]) -> Option<&'a Value> {
        match segments {
            [] => None,
            [last] => map.get(*last),
            [first, rest @ ..] => match map.get(*first)? {
                Value::Object(nested) => Self::get_recursive(nested, rest),
                _ => None,
            },
        }
    }
}

impl From<BTreeMap<String, Value>> for FieldValues {
    fn from(data: BTreeMap<String, Value>) -> Self {
        Self { data }
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (path, value) in iter {
            values.insert(path.as_ref(), value.into());
        }
        values
    }
}
