use std::fmt;

use thiserror::Error;

/// What went wrong while reading a condition expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("parentheses nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Errors produced when tokenizing or parsing a condition expression.
///
/// Carries the offending expression and the character offset of the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    expression: String,
    offset: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self {
            expression: String::new(),
            offset,
            kind,
        }
    }

    pub(crate) fn in_expression(mut self, expression: &str) -> Self {
        expression.clone_into(&mut self.expression);
        self
    }

    /// The expression that failed to parse.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Character offset into [`expression()`](Self::expression) where parsing failed.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at offset {} in `{}`: {}",
            self.offset, self.expression, self.kind
        )
    }
}

impl std::error::Error for ParseError {}
