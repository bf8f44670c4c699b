use std::collections::{BTreeSet, HashSet};

use crate::formula::{Formula, FormulaError};
use crate::graph::{build_dependency_graph, evaluation_order, validate_dependencies};
use crate::types::{CompiledField, ConditionKind, FieldSchema};
use crate::{CalculatedField, CompiledSchema, FormSchema, Rule, SchemaError};

pub(crate) fn compile(schema: &FormSchema) -> Result<CompiledSchema, SchemaError> {
    check_duplicate_fields(&schema.fields)?;
    check_duplicate_targets(&schema.calculated)?;

    let fields = schema
        .fields
        .iter()
        .map(compile_field)
        .collect::<Result<Vec<_>, _>>()?;

    let calculated: Vec<CalculatedField> = evaluation_order(&schema.calculated)?
        .into_iter()
        .cloned()
        .collect();

    let formulas: Vec<Result<Formula, FormulaError>> =
        calculated.iter().map(compile_formula).collect();

    let known = schema
        .fields
        .iter()
        .map(|f| f.path.as_str())
        .chain(calculated.iter().map(|c| c.target.as_str()));
    let warnings = validate_dependencies(&calculated, known);
    for warning in &warnings {
        tracing::warn!(
            field = %warning.target,
            dependency = %warning.dependency,
            "calculated field depends on an unknown field"
        );
    }

    let graph = build_dependency_graph(&calculated);
    let watched: BTreeSet<String> = calculated
        .iter()
        .flat_map(|c| c.depends_on.iter().cloned())
        .collect();

    tracing::debug!(
        fields = fields.len(),
        calculated = calculated.len(),
        watched = watched.len(),
        warnings = warnings.len(),
        "schema compiled"
    );

    Ok(CompiledSchema {
        fields,
        calculated,
        formulas,
        graph,
        watched,
        warnings,
    })
}

fn check_duplicate_fields(fields: &[FieldSchema]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.path.as_str()) {
            return Err(SchemaError::DuplicateField {
                path: field.path.clone(),
            });
        }
    }
    Ok(())
}

fn check_duplicate_targets(calculated: &[CalculatedField]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for spec in calculated {
        if !seen.insert(spec.target.as_str()) {
            return Err(SchemaError::DuplicateTarget {
                target: spec.target.clone(),
            });
        }
    }
    Ok(())
}

fn compile_field(field: &FieldSchema) -> Result<CompiledField, SchemaError> {
    let rule = |kind: ConditionKind| -> Result<Option<Rule>, SchemaError> {
        field
            .condition(kind)
            .map(|condition| {
                condition.to_rule().map_err(|source| SchemaError::Parse {
                    path: field.path.clone(),
                    kind: kind.as_str(),
                    source,
                })
            })
            .transpose()
    };

    Ok(CompiledField {
        path: field.path.clone(),
        required: field.required,
        hidden_when: rule(ConditionKind::Hidden)?,
        required_when: rule(ConditionKind::Required)?,
        read_only_when: rule(ConditionKind::ReadOnly)?,
    })
}

fn compile_formula(spec: &CalculatedField) -> Result<Formula, FormulaError> {
    Formula::compile(&spec.formula, &spec.depends_on).inspect_err(|error| {
        tracing::warn!(
            field = %spec.target,
            formula = %spec.formula,
            %error,
            "formula failed to compile; field will not be calculated"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParseErrorKind;
    use crate::{field, CycleError};

    fn calc(target: &str, deps: &[&str], formula: &str) -> CalculatedField {
        CalculatedField::new(target, deps.iter().copied(), formula)
    }

    #[test]
    fn duplicate_field_rejected() {
        let schema = FormSchema::builder()
            .field("email", |f| f)
            .field("email", |f| f.required())
            .build();
        assert!(matches!(
            compile(&schema),
            Err(SchemaError::DuplicateField { path }) if path == "email"
        ));
    }

    #[test]
    fn duplicate_target_rejected() {
        let schema = FormSchema {
            fields: vec![],
            calculated: vec![calc("t", &["a"], "a"), calc("t", &["b"], "b")],
        };
        assert!(matches!(
            compile(&schema),
            Err(SchemaError::DuplicateTarget { target }) if target == "t"
        ));
    }

    #[test]
    fn bad_expression_names_field_and_kind() {
        let schema = FormSchema::builder()
            .field("amount", |f| f.required_when("income >"))
            .build();
        match compile(&schema) {
            Err(SchemaError::Parse { path, kind, source }) => {
                assert_eq!(path, "amount");
                assert_eq!(kind, "requiredWhen");
                assert_eq!(source.expression(), "income >");
                assert!(matches!(source.kind(), ParseErrorKind::UnexpectedToken { .. }));
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn cycle_rejected() {
        let schema = FormSchema {
            fields: vec![],
            calculated: vec![calc("A", &["B"], "B + 1"), calc("B", &["A"], "A + 1")],
        };
        match compile(&schema) {
            Err(SchemaError::Cycle(CycleError { target, path })) => {
                assert_eq!(target, "A");
                assert_eq!(path, vec!["A", "B", "A"]);
            }
            other => panic!("expected Cycle error, got {other:?}"),
        }
    }

    #[test]
    fn calculated_fields_are_ordered() {
        let schema = FormSchema::builder()
            .field("qty", |f| f)
            .field("price", |f| f)
            .calculated("tax", ["subtotal"], "subtotal * 0.1")
            .calculated("subtotal", ["qty", "price"], "qty * price")
            .build();
        let compiled = compile(&schema).unwrap();
        assert_eq!(compiled.evaluation_order(), vec!["subtotal", "tax"]);
        assert!(compiled.warnings().is_empty());
        assert_eq!(
            compiled.watched_paths().iter().collect::<Vec<_>>(),
            vec!["price", "qty", "subtotal"]
        );
    }

    #[test]
    fn missing_dependency_is_a_warning_not_an_error() {
        let schema = FormSchema::builder()
            .field("qty", |f| f)
            .calculated("total", ["qty", "prise"], "qty * prise")
            .build();
        let compiled = compile(&schema).unwrap();
        assert_eq!(compiled.warnings().len(), 1);
        assert_eq!(compiled.warnings()[0].dependency, "prise");
    }

    #[test]
    fn bad_formula_is_kept_as_failure() {
        let schema = FormSchema::builder()
            .field("a", |f| f)
            .calculated("b", ["a"], "a +")
            .build();
        let compiled = compile(&schema).unwrap();
        assert!(matches!(compiled.formulas[0], Err(FormulaError::Syntax { .. })));
    }

    #[test]
    fn rule_conditions_pass_through() {
        let rule = field("x").gt(3_i64);
        let schema = FormSchema::builder()
            .field("y", |f| f.hidden_when(rule.clone()))
            .build();
        let compiled = compile(&schema).unwrap();
        assert_eq!(compiled.condition_for("y", ConditionKind::Hidden), Some(&rule));
    }
}
