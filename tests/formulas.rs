use formrules::{evaluate_formula, FieldValues, Formula, FormulaError, Value};

fn eval(formula: &str, values: &FieldValues, deps: &[&str]) -> Result<Value, FormulaError> {
    evaluate_formula(formula, values, deps)
}

#[test]
fn order_total() {
    let values = FieldValues::new()
        .set("quantity", 3_i64)
        .set("pricePerUnit", 10_i64);
    assert_eq!(
        eval("quantity * pricePerUnit", &values, &["quantity", "pricePerUnit"]),
        Ok(Value::Int(30))
    );
}

#[test]
fn discount_threshold() {
    let formula = Formula::compile("subtotal >= 1000 ? subtotal * 0.9 : subtotal", &["subtotal"])
        .unwrap();
    let at = FieldValues::new().set("subtotal", 1000_i64);
    let below = FieldValues::new().set("subtotal", 999_i64);
    assert_eq!(formula.evaluate(&at), Ok(Value::Float(900.0)));
    assert_eq!(formula.evaluate(&below), Ok(Value::Int(999)));
}

#[test]
fn precedence_and_grouping() {
    let values = FieldValues::new().set("a", 2_i64).set("b", 3_i64);
    let deps = ["a", "b"];
    assert_eq!(eval("a + b * 4", &values, &deps), Ok(Value::Int(14)));
    assert_eq!(eval("(a + b) * 4", &values, &deps), Ok(Value::Int(20)));
    assert_eq!(eval("a - b - 1", &values, &deps), Ok(Value::Int(-2)));
    assert_eq!(eval("-a * b", &values, &deps), Ok(Value::Int(-6)));
    assert_eq!(eval("b % a", &values, &deps), Ok(Value::Int(1)));
}

#[test]
fn nested_ternaries_associate_right() {
    let deps = ["score"];
    let grade = |score: i64| {
        eval(
            "score >= 90 ? 'A' : score >= 75 ? 'B' : 'C'",
            &FieldValues::new().set("score", score),
            &deps,
        )
    };
    assert_eq!(grade(95), Ok(Value::from("A")));
    assert_eq!(grade(80), Ok(Value::from("B")));
    assert_eq!(grade(10), Ok(Value::from("C")));
}

#[test]
fn rounding_money() {
    let values = FieldValues::new().set("subtotal", 199.99_f64);
    assert_eq!(
        eval("round(subtotal * 0.15 * 100) / 100", &values, &["subtotal"]),
        Ok(Value::Int(30))
    );
    assert_eq!(eval("floor(subtotal)", &values, &["subtotal"]), Ok(Value::Int(199)));
    assert_eq!(eval("ceil(subtotal)", &values, &["subtotal"]), Ok(Value::Int(200)));
    assert_eq!(eval("abs(0 - subtotal)", &values, &["subtotal"]), Ok(Value::Float(199.99)));
}

#[test]
fn nested_paths_are_identifiers() {
    let values = FieldValues::new()
        .set("order.lines", 4_i64)
        .set("order.unit", 2.5_f64);
    assert_eq!(
        eval("order.lines * order.unit", &values, &["order.lines", "order.unit"]),
        Ok(Value::Float(10.0))
    );
}

#[test]
fn missing_dependency_value_reads_as_null() {
    let values = FieldValues::new();
    assert_eq!(eval("x == null", &values, &["x"]), Ok(Value::Bool(true)));
    assert_eq!(eval("x ? 1 : 2", &values, &["x"]), Ok(Value::Int(2)));
    assert_eq!(
        eval("x + 1", &values, &["x"]),
        Err(FormulaError::TypeMismatch {
            op: "+",
            left: "null",
            right: "number",
        })
    );
}

#[test]
fn string_comparison() {
    let values = FieldValues::new().set("tier", "gold");
    assert_eq!(eval("tier == 'gold'", &values, &["tier"]), Ok(Value::Bool(true)));
    assert_eq!(eval("tier < 'silver'", &values, &["tier"]), Ok(Value::Bool(true)));
    assert!(matches!(
        eval("tier > 3", &values, &["tier"]),
        Err(FormulaError::TypeMismatch { op: ">", .. })
    ));
}

#[test]
fn logical_operators_yield_booleans() {
    let values = FieldValues::new().set("a", 5_i64).set("b", 0_i64);
    let deps = ["a", "b"];
    assert_eq!(eval("a && b", &values, &deps), Ok(Value::Bool(false)));
    assert_eq!(eval("a || b", &values, &deps), Ok(Value::Bool(true)));
    assert_eq!(eval("!b", &values, &deps), Ok(Value::Bool(true)));
    // The right side is never reached.
    assert_eq!(eval("b != 0 && a / b > 1", &values, &deps), Ok(Value::Bool(false)));
}

#[test]
fn undeclared_identifiers_are_rejected_at_compile_time() {
    assert_eq!(
        Formula::compile("quantity * price", &["quantity"]).unwrap_err(),
        FormulaError::UnknownIdentifier("price".into())
    );
    assert_eq!(
        Formula::compile("constructor", &["quantity"]).unwrap_err(),
        FormulaError::UnknownIdentifier("constructor".into())
    );
}

#[test]
fn only_whitelisted_functions() {
    assert_eq!(
        Formula::compile("eval(x)", &["x"]).unwrap_err(),
        FormulaError::UnknownFunction("eval".into())
    );
    assert_eq!(
        Formula::compile("x(1)", &["x"]).unwrap_err(),
        FormulaError::UnknownFunction("x".into())
    );
    assert!(matches!(
        Formula::compile("round(x, 2)", &["x"]).unwrap_err(),
        FormulaError::Arity {
            function: "round",
            expected: 1,
            found: 2,
        }
    ));
}

#[test]
fn syntax_errors() {
    for bad in ["", "a +", "(a", "a b", "a ? 1", "a = 1", "a; b", "1 +* 2"] {
        assert!(
            matches!(Formula::compile(bad, &["a", "b"]), Err(FormulaError::Syntax { .. })),
            "{bad:?} should be a syntax error"
        );
    }
}

#[test]
fn arithmetic_failures() {
    let values = FieldValues::new()
        .set("zero", 0_i64)
        .set("big", i64::MAX)
        .set("huge", 1e308_f64);
    let deps = ["zero", "big", "huge"];
    assert_eq!(eval("1 / zero", &values, &deps), Err(FormulaError::DivisionByZero));
    assert_eq!(eval("1.5 % zero", &values, &deps), Err(FormulaError::DivisionByZero));
    assert_eq!(eval("big * 2", &values, &deps), Err(FormulaError::Overflow("*")));
    assert_eq!(eval("huge * 10", &values, &deps), Err(FormulaError::NonFinite));
}

#[test]
fn non_finite_inputs_never_reach_a_result() {
    let values = FieldValues::new()
        .set("nan", f64::NAN)
        .set("inf", f64::INFINITY)
        .set("max", f64::MAX)
        .set("ok", true);
    let deps = ["nan", "inf", "max", "ok"];
    for formula in ["nan", "inf", "-inf", "round(nan)", "floor(inf)", "ceil(-inf)", "abs(nan)", "ok ? nan : 1"] {
        assert_eq!(
            eval(formula, &values, &deps),
            Err(FormulaError::NonFinite),
            "{formula}"
        );
    }
    assert_eq!(eval("-max", &values, &deps), Ok(Value::Float(-f64::MAX)));
    assert_eq!(eval("nan > 1 ? 1 : 2", &values, &deps), Ok(Value::Int(2)));
}

#[test]
fn compiled_formula_reports_what_it_reads() {
    let formula = Formula::compile("a * a + c", &["a", "b", "c"]).unwrap();
    assert_eq!(formula.referenced_fields(), ["a", "c"]);
    assert_eq!(formula.source(), "a * a + c");
}
