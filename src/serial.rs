//! JSON mapping for form schemas.
//!
//! ## Document Format
//!
//! ```text
//! {
//!   "fields": [
//!     { "path": "otherIncomeAmount",
//!       "required": false,
//!       "hiddenWhen": { "field": "hasOtherIncome", "operator": "equals", "value": false },
//!       "requiredWhen": "hasOtherIncome == true" }
//!   ],
//!   "calculated": [
//!     { "target": "totalPrice",
//!       "dependsOn": ["quantity", "pricePerUnit"],
//!       "formula": "quantity * pricePerUnit" }
//!   ]
//! }
//! ```
//!
//! A condition is a rule object or an expression string. A rule object has
//! exactly one shape: `{field, operator, value?}`, `{and: [...]}` or
//! `{or: [...]}`. Unrecognized operators load as
//! [`ConditionOperator::Unknown`] and evaluate to `false`.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::{ConditionOperator, FormSchema, Rule, Value};

/// The wire shape of a [`Rule`]: every key optional, validated on conversion.
#[doc(hidden)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<ConditionOperator>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    and: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    or: Option<Vec<Rule>>,
}

/// Keeps an explicit `"value": null` distinct from an absent value.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[doc(hidden)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleShapeError {
    #[error("rule object must have `field` + `operator`, `and`, or `or`")]
    Empty,

    #[error("rule object mixes `field`/`operator`, `and` and `or`; use exactly one")]
    Ambiguous,

    #[error("condition on `{0}` is missing `operator`")]
    MissingOperator(String),

    #[error("condition with operator `{0}` is missing `field`")]
    MissingField(ConditionOperator),
}

impl TryFrom<RawRule> for Rule {
    type Error = RuleShapeError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let is_condition = raw.field.is_some() || raw.operator.is_some();
        let shapes = [is_condition, raw.and.is_some(), raw.or.is_some()]
            .into_iter()
            .filter(|&present| present)
            .count();
        if shapes > 1 {
            return Err(RuleShapeError::Ambiguous);
        }

        match raw {
            RawRule { and: Some(children), .. } => Ok(Rule::And(children)),
            RawRule { or: Some(children), .. } => Ok(Rule::Or(children)),
            RawRule {
                field: Some(field),
                operator: Some(operator),
                value,
                ..
            } => Ok(Rule::Condition {
                field,
                operator,
                value,
            }),
            RawRule {
                field: Some(field), ..
            } => Err(RuleShapeError::MissingOperator(field)),
            RawRule {
                operator: Some(operator),
                ..
            } => Err(RuleShapeError::MissingField(operator)),
            _ => Err(RuleShapeError::Empty),
        }
    }
}

impl From<Rule> for RawRule {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Condition {
                field,
                operator,
                value,
            } => RawRule {
                field: Some(field),
                operator: Some(operator),
                value,
                ..RawRule::default()
            },
            Rule::And(children) => RawRule {
                and: Some(children),
                ..RawRule::default()
            },
            Rule::Or(children) => RawRule {
                or: Some(children),
                ..RawRule::default()
            },
        }
    }
}

pub(crate) fn schema_from_json(input: &str) -> Result<FormSchema, serde_json::Error> {
    serde_json::from_str(input)
}

pub(crate) fn schema_to_json(schema: &FormSchema) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field, Condition};

    fn rule(json: &str) -> Result<Rule, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn condition_object() {
        assert_eq!(
            rule(r#"{"field": "hasOtherIncome", "operator": "equals", "value": false}"#).unwrap(),
            field("hasOtherIncome").eq(false)
        );
    }

    #[test]
    fn nested_combinators() {
        let parsed = rule(
            r#"{"and": [
                {"field": "age", "operator": "greaterThanOrEqual", "value": 18},
                {"or": [
                    {"field": "country", "operator": "in", "value": ["NZ", "AU"]},
                    {"field": "notes", "operator": "isNotEmpty"}
                ]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            Rule::And(vec![
                field("age").gte(18_i64),
                Rule::Or(vec![
                    field("country").one_of(["NZ", "AU"]),
                    field("notes").not_empty(),
                ]),
            ])
        );
    }

    #[test]
    fn explicit_null_value_is_kept() {
        assert_eq!(
            rule(r#"{"field": "x", "operator": "equals", "value": null}"#).unwrap(),
            field("x").eq(Value::Null)
        );
    }

    #[test]
    fn unknown_operator_loads() {
        let parsed = rule(r#"{"field": "x", "operator": "matchesRegex", "value": "a+"}"#).unwrap();
        assert!(matches!(
            parsed,
            Rule::Condition {
                operator: ConditionOperator::Unknown,
                ..
            }
        ));
    }

    #[test]
    fn mixed_shapes_rejected() {
        let err = rule(r#"{"field": "x", "operator": "isEmpty", "and": []}"#).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn empty_object_rejected() {
        assert!(rule("{}").is_err());
        assert!(rule(r#"{"field": "x"}"#).is_err());
        assert!(rule(r#"{"operator": "equals", "value": 1}"#).is_err());
    }

    #[test]
    fn rule_serializes_to_wire_shape() {
        let json = serde_json::to_value(field("age").gte(18_i64)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"field": "age", "operator": "greaterThanOrEqual", "value": 18})
        );
        let json = serde_json::to_value(Rule::Or(vec![field("a").empty()])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"or": [{"field": "a", "operator": "isEmpty"}]})
        );
    }

    #[test]
    fn schema_document() {
        let schema = schema_from_json(
            r#"{
                "fields": [
                    {"path": "hasOtherIncome", "required": true},
                    {"path": "otherIncomeAmount",
                     "hiddenWhen": {"field": "hasOtherIncome", "operator": "equals", "value": false},
                     "requiredWhen": "hasOtherIncome == true"}
                ],
                "calculated": [
                    {"target": "totalPrice", "dependsOn": ["quantity", "pricePerUnit"],
                     "formula": "quantity * pricePerUnit"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(schema.fields.len(), 2);
        assert!(schema.fields[0].required);
        assert_eq!(
            schema.fields[1].hidden_when,
            Some(Condition::Rule(field("hasOtherIncome").eq(false)))
        );
        assert_eq!(
            schema.fields[1].required_when,
            Some(Condition::Expression("hasOtherIncome == true".into()))
        );
        assert_eq!(
            schema.calculated[0].depends_on,
            vec!["quantity", "pricePerUnit"]
        );
    }

    #[test]
    fn schema_survives_json() {
        let schema = FormSchema::builder()
            .field("a", |f| f.hidden_when(field("b").one_of([1_i64, 2])))
            .calculated("c", ["a"], "a + 1")
            .build();
        let text = schema_to_json(&schema).unwrap();
        assert_eq!(schema_from_json(&text).unwrap(), schema);
    }
}
