use std::fmt;

use super::Value;

/// Operators a leaf condition can apply to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    In,
    NotIn,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    IsEmpty,
    IsNotEmpty,
    /// An operator this version does not recognize. Only produced when loading
    /// schemas; always evaluates to `false`.
    #[cfg_attr(feature = "serde", serde(other))]
    Unknown,
}

impl ConditionOperator {
    /// Whether the operator expects a comparison value.
    #[must_use]
    pub fn takes_value(self) -> bool {
        !matches!(
            self,
            ConditionOperator::IsEmpty | ConditionOperator::IsNotEmpty
        )
    }

    /// The schema (wire) name of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "notEquals",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "notIn",
            ConditionOperator::GreaterThan => "greaterThan",
            ConditionOperator::GreaterThanOrEqual => "greaterThanOrEqual",
            ConditionOperator::LessThan => "lessThan",
            ConditionOperator::LessThanOrEqual => "lessThanOrEqual",
            ConditionOperator::IsEmpty => "isEmpty",
            ConditionOperator::IsNotEmpty => "isNotEmpty",
            ConditionOperator::Unknown => "unknown",
        }
    }

    /// The spelling used in condition expressions.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "==",
            ConditionOperator::NotEquals => "!=",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "not in",
            ConditionOperator::GreaterThan => ">",
            ConditionOperator::GreaterThanOrEqual => ">=",
            ConditionOperator::LessThan => "<",
            ConditionOperator::LessThanOrEqual => "<=",
            ConditionOperator::IsEmpty => "is empty",
            ConditionOperator::IsNotEmpty => "not empty",
            ConditionOperator::Unknown => "<unknown>",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conditional rule: a leaf comparison on one field, or an `and`/`or`
/// combination of nested rules.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "crate::serial::RawRule", into = "crate::serial::RawRule")
)]
pub enum Rule {
    Condition {
        field: String,
        operator: ConditionOperator,
        value: Option<Value>,
    },
    /// True iff every child is true. An empty list is false.
    And(Vec<Rule>),
    /// True iff any child is true. An empty list is false.
    Or(Vec<Rule>),
}

impl Rule {
    /// Combine with another rule under `and`, extending an existing `and` list.
    #[must_use]
    pub fn and(self, other: Rule) -> Rule {
        match self {
            Rule::And(mut children) => {
                children.push(other);
                Rule::And(children)
            }
            leaf => Rule::And(vec![leaf, other]),
        }
    }

    /// Combine with another rule under `or`, extending an existing `or` list.
    #[must_use]
    pub fn or(self, other: Rule) -> Rule {
        match self {
            Rule::Or(mut children) => {
                children.push(other);
                Rule::Or(children)
            }
            leaf => Rule::Or(vec![leaf, other]),
        }
    }

    /// Field paths referenced anywhere in the tree, first occurrence first,
    /// without duplicates.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_fields(self, &mut out);
        out
    }
}

fn collect_fields<'a>(rule: &'a Rule, out: &mut Vec<&'a str>) {
    match rule {
        Rule::Condition { field, .. } => {
            if !out.contains(&field.as_str()) {
                out.push(field);
            }
        }
        Rule::And(children) | Rule::Or(children) => {
            for child in children {
                collect_fields(child, out);
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Condition {
                field,
                operator,
                value: Some(value),
            } if operator.takes_value() => write!(f, "{field} {} {value}", operator.symbol()),
            Rule::Condition {
                field, operator, ..
            } => write!(f, "{field} {}", operator.symbol()),
            Rule::And(children) => write_group(f, children, "&&", "and"),
            Rule::Or(children) => write_group(f, children, "||", "or"),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, children: &[Rule], sep: &str, name: &str) -> fmt::Result {
    if children.is_empty() {
        return write!(f, "{name}[]");
    }
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

/// Intermediate builder for leaf conditions.
/// Created by [`field()`]; requires an operator method to produce a [`Rule`].
#[derive(Debug, Clone)]
pub struct FieldCondition {
    path: String,
}

impl FieldCondition {
    fn with(self, operator: ConditionOperator, value: Option<Value>) -> Rule {
        Rule::Condition {
            field: self.path,
            operator,
            value,
        }
    }

    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> Rule {
        self.with(ConditionOperator::Equals, Some(value.into()))
    }

    #[must_use]
    pub fn neq(self, value: impl Into<Value>) -> Rule {
        self.with(ConditionOperator::NotEquals, Some(value.into()))
    }

    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> Rule {
        self.with(ConditionOperator::GreaterThan, Some(value.into()))
    }

    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> Rule {
        self.with(ConditionOperator::GreaterThanOrEqual, Some(value.into()))
    }

    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Rule {
        self.with(ConditionOperator::LessThan, Some(value.into()))
    }

    #[must_use]
    pub fn lte(self, value: impl Into<Value>) -> Rule {
        self.with(ConditionOperator::LessThanOrEqual, Some(value.into()))
    }

    /// Membership in a list (`in`).
    #[must_use]
    pub fn one_of<I, V>(self, values: I) -> Rule
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = values.into_iter().map(Into::into).collect();
        self.with(ConditionOperator::In, Some(Value::Array(list)))
    }

    /// Non-membership in a list (`not in`).
    #[must_use]
    pub fn none_of<I, V>(self, values: I) -> Rule
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = values.into_iter().map(Into::into).collect();
        self.with(ConditionOperator::NotIn, Some(Value::Array(list)))
    }

    #[must_use]
    pub fn empty(self) -> Rule {
        self.with(ConditionOperator::IsEmpty, None)
    }

    #[must_use]
    pub fn not_empty(self) -> Rule {
        self.with(ConditionOperator::IsNotEmpty, None)
    }
}

#[must_use]
pub fn field(path: &str) -> FieldCondition {
    FieldCondition {
        path: path.to_owned(),
    }
}

/// An `and` over the given rules.
#[must_use]
pub fn all(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::And(rules.into_iter().collect())
}

/// An `or` over the given rules.
#[must_use]
pub fn any(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Or(rules.into_iter().collect())
}
