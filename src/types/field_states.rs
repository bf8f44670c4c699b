use std::collections::BTreeSet;
use std::fmt;

use super::schema::ConditionKind;

/// Result of one rule pass: which fields are hidden, conditionally required
/// and read-only for a given snapshot.
///
/// `required` holds only fields whose `requiredWhen` condition holds; use
/// [`merged_required`](Self::merged_required) to fold in the fields a schema
/// marks as always required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[must_use]
pub struct FieldStates {
    #[cfg_attr(feature = "serde", serde(rename = "hiddenFields"))]
    hidden: BTreeSet<String>,
    #[cfg_attr(feature = "serde", serde(rename = "requiredFields"))]
    required: BTreeSet<String>,
    #[cfg_attr(feature = "serde", serde(rename = "readOnlyFields"))]
    read_only: BTreeSet<String>,
}

impl FieldStates {
    pub(crate) fn mark(&mut self, kind: ConditionKind, path: &str) {
        let set = match kind {
            ConditionKind::Hidden => &mut self.hidden,
            ConditionKind::Required => &mut self.required,
            ConditionKind::ReadOnly => &mut self.read_only,
        };
        set.insert(path.to_owned());
    }

    #[must_use]
    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    #[must_use]
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    #[must_use]
    pub fn read_only(&self) -> &BTreeSet<String> {
        &self.read_only
    }

    #[must_use]
    pub fn is_hidden(&self, path: &str) -> bool {
        self.hidden.contains(path)
    }

    #[must_use]
    pub fn is_required(&self, path: &str) -> bool {
        self.required.contains(path)
    }

    #[must_use]
    pub fn is_read_only(&self, path: &str) -> bool {
        self.read_only.contains(path)
    }

    /// Conditionally required fields plus `base`.
    #[must_use]
    pub fn merged_required<I, S>(&self, base: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged = self.required.clone();
        merged.extend(base.into_iter().map(|p| p.as_ref().to_owned()));
        merged
    }
}

fn write_set(f: &mut fmt::Formatter<'_>, label: &str, set: &BTreeSet<String>) -> fmt::Result {
    let items: Vec<&str> = set.iter().map(String::as_str).collect();
    write!(f, "{label}: [{}]", items.join(", "))
}

impl fmt::Display for FieldStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_set(f, "hidden", &self.hidden)?;
        f.write_str(", ")?;
        write_set(f, "required", &self.required)?;
        f.write_str(", ")?;
        write_set(f, "read-only", &self.read_only)
    }
}
