use thiserror::Error;

/// Failure to compile or evaluate a formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("identifier '{0}' is not a declared dependency")]
    UnknownIdentifier(String),

    #[error("function '{0}' is not allowed")]
    UnknownFunction(String),

    #[error("function '{function}' takes {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("cannot apply '{op}' to {operand}")]
    UnaryTypeMismatch {
        op: &'static str,
        operand: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),

    #[error("result is not a finite number")]
    NonFinite,
}

/// A formula failure attributed to the calculated field it was computing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("formula for '{target}' failed: {source}")]
pub struct FormulaEvaluationError {
    pub target: String,
    #[source]
    pub source: FormulaError,
}
