mod calculated;
mod error;
mod field_states;
mod field_values;
mod report;
mod rule;
mod schema;
mod value;

pub use calculated::{CalculatedField, ComputedWrite, WriteOrigin};
pub use error::{CycleError, MissingDependency, SchemaError};
pub use field_states::FieldStates;
pub use field_values::FieldValues;
pub use report::RecomputeReport;
pub use rule::{all, any, field, ConditionOperator, FieldCondition, Rule};
pub use schema::{
    CompiledSchema, Condition, ConditionKind, FieldBuilder, FieldSchema, FormSchema, SchemaBuilder,
};
pub use value::Value;

pub(crate) use schema::CompiledField;
