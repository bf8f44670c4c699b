use std::collections::BTreeSet;
use std::fmt;

use super::calculated::CalculatedField;
use super::error::{MissingDependency, SchemaError};
use super::field_states::FieldStates;
use super::field_values::FieldValues;
use super::rule::Rule;
use crate::formula::{Formula, FormulaError};
use crate::graph::DependencyGraph;
use crate::parse::ParseError;

/// A rule as written in a schema: either a structured rule or a condition
/// expression such as `"hasOtherIncome == false"` that is parsed at compile time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Condition {
    Expression(String),
    Rule(Rule),
}

impl Condition {
    pub(crate) fn to_rule(&self) -> Result<Rule, ParseError> {
        match self {
            Condition::Expression(text) => crate::parse::parse(text),
            Condition::Rule(rule) => Ok(rule.clone()),
        }
    }
}

impl From<Rule> for Condition {
    fn from(rule: Rule) -> Self {
        Condition::Rule(rule)
    }
}

impl From<&str> for Condition {
    fn from(expression: &str) -> Self {
        Condition::Expression(expression.to_owned())
    }
}

impl From<String> for Condition {
    fn from(expression: String) -> Self {
        Condition::Expression(expression)
    }
}

/// The three conditional states a field can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Hidden,
    Required,
    ReadOnly,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 3] = [
        ConditionKind::Hidden,
        ConditionKind::Required,
        ConditionKind::ReadOnly,
    ];

    /// The schema key that holds this kind of condition.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionKind::Hidden => "hiddenWhen",
            ConditionKind::Required => "requiredWhen",
            ConditionKind::ReadOnly => "readOnlyWhen",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One form field as declared in a schema.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldSchema {
    pub path: String,
    /// Always required, regardless of `required_when`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: bool,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub hidden_when: Option<Condition>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub required_when: Option<Condition>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub read_only_when: Option<Condition>,
}

impl FieldSchema {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn condition(&self, kind: ConditionKind) -> Option<&Condition> {
        match kind {
            ConditionKind::Hidden => self.hidden_when.as_ref(),
            ConditionKind::Required => self.required_when.as_ref(),
            ConditionKind::ReadOnly => self.read_only_when.as_ref(),
        }
    }
}

/// A form schema: fields with their conditions, and calculated fields.
///
/// Compile it once with [`compile()`](Self::compile) and reuse the
/// [`CompiledSchema`] for every evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FormSchema {
    #[cfg_attr(feature = "serde", serde(default))]
    pub fields: Vec<FieldSchema>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub calculated: Vec<CalculatedField>,
}

impl FormSchema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Parse conditions, order calculated fields and compile their formulas.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] for a malformed condition expression, a
    /// duplicate field path or calculated target, or a dependency cycle.
    /// Formulas that fail to compile and unknown dependencies are not errors:
    /// they are logged and kept on the compiled schema.
    pub fn compile(&self) -> Result<CompiledSchema, SchemaError> {
        crate::compile::compile(self)
    }
}

/// Builder for constructing a [`FormSchema`].
///
/// Fields are described via closures, mirroring how the schema reads.
///
/// # Example
///
/// ```
/// use formrules::{FormSchema, field};
///
/// let schema = FormSchema::builder()
///     .field("hasOtherIncome", |f| f.required())
///     .field("otherIncomeAmount", |f| {
///         f.hidden_when(field("hasOtherIncome").eq(false))
///             .required_when("hasOtherIncome == true")
///     })
///     .field("quantity", |f| f)
///     .field("pricePerUnit", |f| f)
///     .calculated("totalPrice", ["quantity", "pricePerUnit"], "quantity * pricePerUnit")
///     .compile()
///     .unwrap();
///
/// assert_eq!(schema.evaluation_order(), vec!["totalPrice"]);
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct SchemaBuilder {
    fields: Vec<FieldSchema>,
    calculated: Vec<CalculatedField>,
}

/// Intermediate builder passed to the field definition closure.
#[derive(Debug)]
#[must_use]
pub struct FieldBuilder {
    schema: FieldSchema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. The closure may attach conditions; `|f| f` declares a
    /// plain input field.
    pub fn field(mut self, path: &str, f: impl FnOnce(FieldBuilder) -> FieldBuilder) -> Self {
        let builder = f(FieldBuilder {
            schema: FieldSchema::new(path),
        });
        self.fields.push(builder.schema);
        self
    }

    /// Declare a calculated field.
    pub fn calculated<I, S>(mut self, target: &str, depends_on: I, formula: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.calculated
            .push(CalculatedField::new(target, depends_on, formula));
        self
    }

    #[must_use]
    pub fn build(self) -> FormSchema {
        FormSchema {
            fields: self.fields,
            calculated: self.calculated,
        }
    }

    /// Build and compile in one step.
    ///
    /// # Errors
    ///
    /// See [`FormSchema::compile()`].
    pub fn compile(self) -> Result<CompiledSchema, SchemaError> {
        self.build().compile()
    }
}

impl FieldBuilder {
    /// Mark the field as always required.
    pub fn required(mut self) -> Self {
        self.schema.required = true;
        self
    }

    pub fn hidden_when(mut self, condition: impl Into<Condition>) -> Self {
        self.schema.hidden_when = Some(condition.into());
        self
    }

    pub fn required_when(mut self, condition: impl Into<Condition>) -> Self {
        self.schema.required_when = Some(condition.into());
        self
    }

    pub fn read_only_when(mut self, condition: impl Into<Condition>) -> Self {
        self.schema.read_only_when = Some(condition.into());
        self
    }
}

/// A field with its conditions parsed.
#[derive(Debug, Clone)]
pub(crate) struct CompiledField {
    pub(crate) path: String,
    pub(crate) required: bool,
    pub(crate) hidden_when: Option<Rule>,
    pub(crate) required_when: Option<Rule>,
    pub(crate) read_only_when: Option<Rule>,
}

impl CompiledField {
    pub(crate) fn condition(&self, kind: ConditionKind) -> Option<&Rule> {
        match kind {
            ConditionKind::Hidden => self.hidden_when.as_ref(),
            ConditionKind::Required => self.required_when.as_ref(),
            ConditionKind::ReadOnly => self.read_only_when.as_ref(),
        }
    }
}

/// A compiled, immutable schema. Thread-safe and designed to live behind `Arc`.
///
/// Conditions are parsed once and the calculated fields are stored in
/// evaluation order, each with its compiled formula.
#[derive(Debug)]
pub struct CompiledSchema {
    pub(crate) fields: Vec<CompiledField>,
    /// Calculated fields in evaluation order.
    pub(crate) calculated: Vec<CalculatedField>,
    /// Compiled formula for `calculated[i]`; a compile failure is kept and
    /// reported on every pass that schedules the field.
    pub(crate) formulas: Vec<Result<Formula, FormulaError>>,
    pub(crate) graph: DependencyGraph,
    pub(crate) watched: BTreeSet<String>,
    pub(crate) warnings: Vec<MissingDependency>,
}

impl CompiledSchema {
    /// Run every field condition against `values`.
    pub fn evaluate(&self, values: &FieldValues) -> FieldStates {
        tracing::trace!(fields = self.fields.len(), "evaluating field conditions");
        let mut states = FieldStates::default();
        for field in &self.fields {
            for kind in ConditionKind::ALL {
                if crate::evaluate::evaluate(field.condition(kind), values) {
                    states.mark(kind, &field.path);
                }
            }
        }
        states
    }

    /// Calculated-field targets in evaluation order.
    ///
    /// Every target appears after the calculated fields it depends on.
    #[must_use]
    pub fn evaluation_order(&self) -> Vec<&str> {
        self.calculated.iter().map(|c| c.target.as_str()).collect()
    }

    /// Calculated fields in evaluation order.
    pub fn calculated_fields(&self) -> impl Iterator<Item = &CalculatedField> {
        self.calculated.iter()
    }

    /// Declared dependencies of a calculated field, in declaration order.
    ///
    /// Returns `None` if `target` is not a calculated field.
    #[must_use]
    pub fn dependencies_of(&self, target: &str) -> Option<Vec<&str>> {
        self.calculated
            .iter()
            .find(|c| c.target == target)
            .map(|c| c.depends_on.iter().map(String::as_str).collect())
    }

    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Every path any calculated field depends on. A change to one of these
    /// triggers recomputation.
    #[must_use]
    pub fn watched_paths(&self) -> &BTreeSet<String> {
        &self.watched
    }

    /// Fields the schema marks as always required.
    #[must_use]
    pub fn base_required(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.path.as_str())
            .collect()
    }

    /// Declared field paths, in schema order.
    pub fn field_paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.path.as_str())
    }

    /// The parsed condition of `kind` on the field at `path`.
    #[must_use]
    pub fn condition_for(&self, path: &str, kind: ConditionKind) -> Option<&Rule> {
        self.fields
            .iter()
            .find(|f| f.path == path)
            .and_then(|f| f.condition(kind))
    }

    /// Dependencies that name no declared field or calculated target.
    #[must_use]
    pub fn warnings(&self) -> &[MissingDependency] {
        &self.warnings
    }

    /// A recomputation controller bound to this schema.
    #[must_use]
    pub fn recomputer(&self) -> crate::Recomputer<'_> {
        crate::Recomputer::new(self)
    }
}

#[cfg(feature = "serde")]
impl FormSchema {
    /// Deserialize a schema from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the text is not a valid schema document.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        crate::serial::schema_from_json(input)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        crate::serial::schema_to_json(self)
    }
}

#[cfg(feature = "serde")]
impl CompiledSchema {
    /// Parse a JSON schema document and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`Error`](crate::Error) on JSON or schema failure.
    pub fn from_json(input: &str) -> Result<Self, crate::Error> {
        let schema = FormSchema::from_json(input)?;
        Ok(schema.compile()?)
    }

    /// Read a JSON schema file and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`Error`](crate::Error) on I/O, JSON, or schema failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::Error> {
        let input = std::fs::read_to_string(path)?;
        Self::from_json(&input)
    }
}

impl fmt::Display for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompiledSchema({} fields, {} calculated, {} watched paths)",
            self.fields.len(),
            self.calculated.len(),
            self.watched.len(),
        )
    }
}
