use thiserror::Error;

use crate::parse::ParseError;

/// A circular dependency among calculated fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circular dependency at calculated field '{target}': {}", path.join(" -> "))]
pub struct CycleError {
    /// The calculated field whose dependency closes the cycle.
    pub target: String,
    /// The cycle, starting and ending at the same target.
    pub path: Vec<String>,
}

/// Errors that make a schema unusable. Raised once, when the schema is compiled.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid {kind} condition on field '{path}': {source}")]
    Parse {
        path: String,
        kind: &'static str,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("duplicate field path '{path}'")]
    DuplicateField { path: String },

    #[error("calculated field '{target}' is defined more than once")]
    DuplicateTarget { target: String },
}

/// A `dependsOn` entry that names no known field. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MissingDependency {
    pub target: String,
    pub dependency: String,
}

impl std::fmt::Display for MissingDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "calculated field '{}' depends on unknown field '{}'",
            self.target, self.dependency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message() {
        let err = CycleError {
            target: "a".into(),
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "circular dependency at calculated field 'a': a -> b -> a"
        );
    }

    #[test]
    fn cycle_converts_into_schema_error() {
        let err: SchemaError = CycleError {
            target: "x".into(),
            path: vec!["x".into(), "x".into()],
        }
        .into();
        assert!(matches!(err, SchemaError::Cycle(ref c) if c.target == "x"));
        assert_eq!(
            err.to_string(),
            "circular dependency at calculated field 'x': x -> x"
        );
    }

    #[test]
    fn duplicate_field_message() {
        let err = SchemaError::DuplicateField {
            path: "email".into(),
        };
        assert_eq!(err.to_string(), "duplicate field path 'email'");
    }

    #[test]
    fn duplicate_target_message() {
        let err = SchemaError::DuplicateTarget {
            target: "total".into(),
        };
        assert_eq!(
            err.to_string(),
            "calculated field 'total' is defined more than once"
        );
    }

    #[test]
    fn missing_dependency_message() {
        let warning = MissingDependency {
            target: "tax".into(),
            dependency: "subtotl".into(),
        };
        assert_eq!(
            warning.to_string(),
            "calculated field 'tax' depends on unknown field 'subtotl'"
        );
    }
}
