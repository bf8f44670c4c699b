//! Formulas for calculated fields.
//!
//! A formula is compiled once into an expression tree and interpreted against
//! each snapshot. Compilation only resolves identifiers listed in the
//! calculated field's `dependsOn` and the functions `round`, `floor`, `ceil`
//! and `abs`; anything else is rejected, so a formula is data and never
//! arbitrary code.

mod error;
mod eval;
mod lexer;
mod parser;

use std::fmt;

pub use error::{FormulaError, FormulaEvaluationError};

use crate::{FieldValues, Value};

/// A compiled formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: parser::Expr,
    fields: Vec<String>,
}

impl Formula {
    /// Compile `source`, allowing only the identifiers in `depends_on`.
    ///
    /// # Errors
    ///
    /// [`FormulaError::Syntax`] for malformed text,
    /// [`FormulaError::UnknownIdentifier`] for a name not in `depends_on`,
    /// [`FormulaError::UnknownFunction`] / [`FormulaError::Arity`] for bad calls.
    pub fn compile<S: AsRef<str>>(source: &str, depends_on: &[S]) -> Result<Self, FormulaError> {
        let tokens = lexer::lex(source)?;
        let (expr, fields) = parser::parse(&tokens, depends_on)?;
        Ok(Formula {
            source: source.to_owned(),
            expr,
            fields,
        })
    }

    /// Evaluate against a snapshot. Referenced fields missing from `ctx` read as null.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError`] on division by zero, integer overflow, a
    /// non-finite result (including a NaN or infinite field read straight
    /// through), or operands of the wrong kind.
    pub fn evaluate(&self, ctx: &FieldValues) -> Result<Value, FormulaError> {
        match eval::eval(&self.expr, ctx)? {
            Value::Float(f) if !f.is_finite() => Err(FormulaError::NonFinite),
            value => Ok(value),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Field paths the formula actually reads, in first-seen order.
    #[must_use]
    pub fn referenced_fields(&self) -> &[String] {
        &self.fields
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile and evaluate `formula` in one step.
///
/// Prefer [`Formula::compile`] when the same formula runs more than once.
///
/// # Errors
///
/// Any compile or evaluation [`FormulaError`].
pub fn evaluate_formula<S: AsRef<str>>(
    formula: &str,
    context: &FieldValues,
    depends_on: &[S],
) -> Result<Value, FormulaError> {
    Formula::compile(formula, depends_on)?.evaluate(context)
}
