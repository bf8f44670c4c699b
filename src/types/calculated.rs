use std::fmt;

use super::Value;

/// A field whose value is derived by a formula over other fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CalculatedField {
    /// Path that receives the computed value.
    pub target: String,
    /// Paths the formula reads. Only these identifiers may appear in `formula`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub depends_on: Vec<String>,
    pub formula: String,
}

impl CalculatedField {
    #[must_use]
    pub fn new<I, S>(target: &str, depends_on: I, formula: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.to_owned(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
            formula: formula.to_owned(),
        }
    }
}

/// Who produced a value write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOrigin {
    /// An edit made by the person filling in the form.
    User,
    /// A value derived by the engine. Must not mark the field dirty or touched,
    /// and must not trigger a rule pass of its own.
    System,
}

/// A proposed update to the host's value store.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ComputedWrite {
    pub target: String,
    pub value: Value,
    pub origin: WriteOrigin,
}

impl ComputedWrite {
    pub(crate) fn system(target: impl Into<String>, value: Value) -> Self {
        Self {
            target: target.into(),
            value,
            origin: WriteOrigin::System,
        }
    }

    #[must_use]
    pub fn is_user_edit(&self) -> bool {
        self.origin == WriteOrigin::User
    }
}

impl fmt::Display for ComputedWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} := {}", self.target, self.value)
    }
}
