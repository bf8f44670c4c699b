use std::cmp::Ordering;

use crate::{ConditionOperator, FieldValues, Rule, Value};

/// Evaluate an optional rule against a value snapshot.
///
/// A missing rule means "no condition", which never applies: the result is `false`.
#[must_use]
pub fn evaluate(rule: Option<&Rule>, values: &FieldValues) -> bool {
    rule.is_some_and(|r| r.evaluate(values))
}

impl Rule {
    /// Evaluate this rule against a value snapshot.
    ///
    /// Empty `And`/`Or` lists are both `false`.
    #[must_use]
    pub fn evaluate(&self, values: &FieldValues) -> bool {
        match self {
            Rule::Condition {
                field,
                operator,
                value,
            } => eval_condition(field, values.get(field), *operator, value.as_ref()),
            Rule::And(children) => {
                !children.is_empty() && children.iter().all(|c| c.evaluate(values))
            }
            Rule::Or(children) => children.iter().any(|c| c.evaluate(values)),
        }
    }
}

fn eval_condition(
    field: &str,
    actual: Option<&Value>,
    op: ConditionOperator,
    expected: Option<&Value>,
) -> bool {
    match op {
        ConditionOperator::Equals => strictly_equal(actual, expected),
        ConditionOperator::NotEquals => !strictly_equal(actual, expected),
        ConditionOperator::In => match expected {
            Some(Value::Array(items)) => contains(items, actual),
            _ => false,
        },
        ConditionOperator::NotIn => match expected {
            Some(Value::Array(items)) => !contains(items, actual),
            _ => true,
        },
        ConditionOperator::GreaterThan => numeric(actual, expected, Ordering::is_gt),
        ConditionOperator::GreaterThanOrEqual => numeric(actual, expected, Ordering::is_ge),
        ConditionOperator::LessThan => numeric(actual, expected, Ordering::is_lt),
        ConditionOperator::LessThanOrEqual => numeric(actual, expected, Ordering::is_le),
        ConditionOperator::IsEmpty => actual.map_or(true, Value::is_blank),
        ConditionOperator::IsNotEmpty => !actual.map_or(true, Value::is_blank),
        ConditionOperator::Unknown => {
            tracing::warn!(field, "unrecognized condition operator; condition treated as false");
            false
        }
    }
}

/// Absent on both sides counts as equal; absent against a value never does.
fn strictly_equal(actual: Option<&Value>, expected: Option<&Value>) -> bool {
    match (actual, expected) {
        (Some(a), Some(e)) => a.strict_eq(e),
        (None, None) => true,
        _ => false,
    }
}

fn contains(items: &[Value], actual: Option<&Value>) -> bool {
    actual.is_some_and(|a| items.iter().any(|item| item.strict_eq(a)))
}

fn numeric(actual: Option<&Value>, expected: Option<&Value>, test: fn(Ordering) -> bool) -> bool {
    match (actual, expected) {
        (Some(a), Some(e)) => a.cmp_numeric(e).is_some_and(test),
        _ => false,
    }
}
