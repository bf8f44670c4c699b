//! Declarative rules for forms.
//!
//! A [`FormSchema`] declares, per field, when it is hidden, required or
//! read-only, and which fields are calculated from others. Compile it once
//! into a [`CompiledSchema`], then for each snapshot of form values:
//!
//! - [`CompiledSchema::evaluate`] returns the hidden, required and read-only
//!   field sets;
//! - a [`Recomputer`] proposes [`ComputedWrite`]s for calculated fields whose
//!   value changed.
//!
//! ```
//! use formrules::{FieldValues, FormSchema, Value};
//!
//! let schema = FormSchema::builder()
//!     .field("hasOtherIncome", |f| f)
//!     .field("otherIncomeAmount", |f| f.hidden_when("hasOtherIncome == false"))
//!     .field("quantity", |f| f)
//!     .field("pricePerUnit", |f| f)
//!     .calculated("totalPrice", ["quantity", "pricePerUnit"], "quantity * pricePerUnit")
//!     .compile()
//!     .unwrap();
//!
//! let values = FieldValues::new()
//!     .set("hasOtherIncome", false)
//!     .set("quantity", 3_i64)
//!     .set("pricePerUnit", 10_i64);
//!
//! assert!(schema.evaluate(&values).is_hidden("otherIncomeAmount"));
//!
//! let writes = schema.recomputer().on_change(["quantity"], &values);
//! assert_eq!(writes[0].target, "totalPrice");
//! assert_eq!(writes[0].value, Value::Int(30));
//! ```

mod compile;
mod error;
mod evaluate;
pub mod formula;
pub mod graph;
pub mod parse;
mod recompute;
#[cfg(feature = "serde")]
mod serial;
mod types;

pub use error::Error;
pub use evaluate::evaluate;
pub use formula::{evaluate_formula, Formula, FormulaError, FormulaEvaluationError};
pub use graph::{
    affected_calculations, build_dependency_graph, evaluation_order, validate_dependencies,
    DependencyGraph,
};
pub use parse::{extract_dependencies, parse, tokenize, validate, ParseError, ParseErrorKind};
pub use recompute::Recomputer;
pub use types::{
    all, any, field, CalculatedField, CompiledSchema, ComputedWrite, Condition, ConditionKind,
    ConditionOperator, CycleError, FieldBuilder, FieldCondition, FieldSchema, FieldStates,
    FieldValues, FormSchema, MissingDependency, RecomputeReport, Rule, SchemaBuilder, SchemaError,
    Value, WriteOrigin,
};
