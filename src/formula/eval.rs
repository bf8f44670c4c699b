use std::cmp::Ordering;

use super::error::FormulaError;
use super::parser::{BinaryOp, Expr, Function, UnaryOp};
use crate::{FieldValues, Value};

pub(crate) fn eval(expr: &Expr, ctx: &FieldValues) -> Result<Value, FormulaError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Field(path) => Ok(ctx.get(path).cloned().unwrap_or(Value::Null)),
        Expr::Unary(op, operand) => unary(*op, eval(operand, ctx)?),
        Expr::Binary(BinaryOp::And, left, right) => {
            if !eval(left, ctx)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(right, ctx)?.is_truthy()))
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            if eval(left, ctx)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(right, ctx)?.is_truthy()))
        }
        Expr::Binary(op, left, right) => binary(*op, eval(left, ctx)?, eval(right, ctx)?),
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, ctx)?.is_truthy() {
                eval(then, ctx)
            } else {
                eval(otherwise, ctx)
            }
        }
        Expr::Call(function, arg) => call(*function, eval(arg, ctx)?),
    }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, FormulaError> {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or(FormulaError::Overflow("-")),
        (UnaryOp::Neg, Value::Float(f)) => finite(-f),
        (UnaryOp::Neg, other) => Err(FormulaError::UnaryTypeMismatch {
            op: "-",
            operand: other.kind(),
        }),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, FormulaError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left.strict_eq(&right))),
        BinaryOp::Neq => Ok(Value::Bool(!left.strict_eq(&right))),
        BinaryOp::Gt => compare(op, &left, &right, Ordering::is_gt),
        BinaryOp::Gte => compare(op, &left, &right, Ordering::is_ge),
        BinaryOp::Lt => compare(op, &left, &right, Ordering::is_lt),
        BinaryOp::Lte => compare(op, &left, &right, Ordering::is_le),
        BinaryOp::Add => arithmetic(Arith::Add, left, right),
        BinaryOp::Sub => arithmetic(Arith::Sub, left, right),
        BinaryOp::Mul => arithmetic(Arith::Mul, left, right),
        BinaryOp::Div => arithmetic(Arith::Div, left, right),
        BinaryOp::Rem => arithmetic(Arith::Rem, left, right),
        // `eval` short-circuits these before both sides are computed.
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
    }
}

#[derive(Clone, Copy)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Arith {
    fn symbol(self) -> &'static str {
        match self {
            Arith::Add => "+",
            Arith::Sub => "-",
            Arith::Mul => "*",
            Arith::Div => "/",
            Arith::Rem => "%",
        }
    }
}

fn compare(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    test: fn(Ordering) -> bool,
) -> Result<Value, FormulaError> {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) if a.is_number() && b.is_number() => a.cmp_numeric(b),
        (a, b) => return Err(mismatch(op.symbol(), a, b)),
    };
    // NaN compares false both ways.
    Ok(Value::Bool(ordering.is_some_and(test)))
}

fn arithmetic(op: Arith, left: Value, right: Value) -> Result<Value, FormulaError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => float_arithmetic(op, a, b),
            _ => Err(mismatch(op.symbol(), &left, &right)),
        },
    }
}

fn int_arithmetic(op: Arith, a: i64, b: i64) -> Result<Value, FormulaError> {
    let result = match op {
        Arith::Add => a.checked_add(b),
        Arith::Sub => a.checked_sub(b),
        Arith::Mul => a.checked_mul(b),
        Arith::Div => {
            if b == 0 {
                return Err(FormulaError::DivisionByZero);
            }
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b),
                Some(_) => return finite(a as f64 / b as f64),
                None => None,
            }
        }
        Arith::Rem => {
            if b == 0 {
                return Err(FormulaError::DivisionByZero);
            }
            a.checked_rem(b)
        }
    };
    result
        .map(Value::Int)
        .ok_or(FormulaError::Overflow(op.symbol()))
}

fn float_arithmetic(op: Arith, a: f64, b: f64) -> Result<Value, FormulaError> {
    let result = match op {
        Arith::Add => a + b,
        Arith::Sub => a - b,
        Arith::Mul => a * b,
        Arith::Div | Arith::Rem if b == 0.0 => return Err(FormulaError::DivisionByZero),
        Arith::Div => a / b,
        Arith::Rem => a % b,
    };
    finite(result)
}

fn finite(v: f64) -> Result<Value, FormulaError> {
    if v.is_finite() {
        Ok(Value::Float(v))
    } else {
        Err(FormulaError::NonFinite)
    }
}

fn mismatch(op: &'static str, left: &Value, right: &Value) -> FormulaError {
    FormulaError::TypeMismatch {
        op,
        left: left.kind(),
        right: right.kind(),
    }
}

/// Rounding functions return an `Int` when the result fits, so
/// `round(2.6) == 3` holds under strict equality either way.
fn call(function: Function, arg: Value) -> Result<Value, FormulaError> {
    let x = match arg {
        Value::Int(i) => {
            return match function {
                Function::Abs => i
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or(FormulaError::Overflow("abs")),
                Function::Round | Function::Floor | Function::Ceil => Ok(Value::Int(i)),
            };
        }
        Value::Float(f) if f.is_finite() => f,
        Value::Float(_) => return Err(FormulaError::NonFinite),
        other => {
            return Err(FormulaError::UnaryTypeMismatch {
                op: function.name(),
                operand: other.kind(),
            })
        }
    };

    let result = match function {
        Function::Round => x.round(),
        Function::Floor => x.floor(),
        Function::Ceil => x.ceil(),
        Function::Abs => return finite(x.abs()),
    };
    Ok(integral(result))
}

fn integral(v: f64) -> Value {
    if v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Value::Int(v as i64)
    } else {
        Value::Float(v)
    }
}

#[cfg(test)]
mod tests {
    use crate::formula::{evaluate_formula, FormulaError};
    use crate::{FieldValues, Value};

    fn eval_with(source: &str, ctx: &FieldValues, deps: &[&str]) -> Result<Value, FormulaError> {
        evaluate_formula(source, ctx, deps)
    }

    fn eval_const(source: &str) -> Result<Value, FormulaError> {
        eval_with(source, &FieldValues::new(), &[])
    }

    #[test]
    fn product_of_two_fields() {
        let ctx = FieldValues::new().set("quantity", 5_i64).set("price", 10_i64);
        assert_eq!(
            eval_with("quantity * price", &ctx, &["quantity", "price"]),
            Ok(Value::Int(50))
        );
    }

    #[test]
    fn ternary_boundary() {
        let at = FieldValues::new().set("total", 1000_i64);
        let below = FieldValues::new().set("total", 999_i64);
        let formula = "total >= 1000 ? 10 : 5";
        assert_eq!(eval_with(formula, &at, &["total"]), Ok(Value::Int(10)));
        assert_eq!(eval_with(formula, &below, &["total"]), Ok(Value::Int(5)));
    }

    #[test]
    fn division_stays_integral_when_exact() {
        assert_eq!(eval_const("10 / 2"), Ok(Value::Int(5)));
        assert_eq!(eval_const("7 / 2"), Ok(Value::Float(3.5)));
        assert_eq!(eval_const("7 % 4"), Ok(Value::Int(3)));
    }

    #[test]
    fn mixed_numbers_promote_to_float() {
        assert_eq!(eval_const("2 * 1.5"), Ok(Value::Float(3.0)));
        assert_eq!(eval_const("0.5 + 1"), Ok(Value::Float(1.5)));
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(eval_const("2 + 3 * 4"), Ok(Value::Int(14)));
        assert_eq!(eval_const("(2 + 3) * 4"), Ok(Value::Int(20)));
        assert_eq!(eval_const("-2 * -3"), Ok(Value::Int(6)));
        assert_eq!(eval_const("10 - 4 - 3"), Ok(Value::Int(3)));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(eval_const("1 / 0"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval_const("1.5 / 0"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval_const("5 % 0"), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn overflow_is_an_error() {
        assert_eq!(
            eval_const("9223372036854775807 + 1"),
            Err(FormulaError::Overflow("+"))
        );
        let ctx = FieldValues::new().set("a", i64::MIN).set("b", -1_i64);
        assert_eq!(
            eval_with("a / b", &ctx, &["a", "b"]),
            Err(FormulaError::Overflow("/"))
        );
        assert_eq!(
            eval_with("a % b", &ctx, &["a", "b"]),
            Err(FormulaError::Overflow("%"))
        );
        assert_eq!(eval_with("-a", &ctx, &["a"]), Err(FormulaError::Overflow("-")));
    }

    #[test]
    fn arithmetic_on_non_numbers() {
        let ctx = FieldValues::new().set("name", "bob");
        assert_eq!(
            eval_with("name * 2", &ctx, &["name"]),
            Err(FormulaError::TypeMismatch {
                op: "*",
                left: "string",
                right: "number",
            })
        );
        assert!(matches!(
            eval_with("missing + 1", &ctx, &["missing"]),
            Err(FormulaError::TypeMismatch { left: "null", .. })
        ));
    }

    #[test]
    fn logic_yields_booleans() {
        assert_eq!(eval_const("1 && 'x'"), Ok(Value::Bool(true)));
        assert_eq!(eval_const("0 || ''"), Ok(Value::Bool(false)));
        assert_eq!(eval_const("!0"), Ok(Value::Bool(true)));
        assert_eq!(eval_const("!null"), Ok(Value::Bool(true)));
    }

    #[test]
    fn logic_short_circuits() {
        assert_eq!(eval_const("false && 1 / 0"), Ok(Value::Bool(false)));
        assert_eq!(eval_const("true || 1 / 0"), Ok(Value::Bool(true)));
        assert_eq!(eval_const("true ? 1 : 1 / 0"), Ok(Value::Int(1)));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval_const("2 > 1.5"), Ok(Value::Bool(true)));
        assert_eq!(eval_const("'abc' < 'abd'"), Ok(Value::Bool(true)));
        assert_eq!(eval_const("1 == 1.0"), Ok(Value::Bool(true)));
        assert_eq!(eval_const("'1' == 1"), Ok(Value::Bool(false)));
        assert_eq!(eval_const("null != 0"), Ok(Value::Bool(true)));
        assert!(matches!(
            eval_const("'a' > 1"),
            Err(FormulaError::TypeMismatch { op: ">", .. })
        ));
    }

    #[test]
    fn whitelisted_functions() {
        assert_eq!(eval_const("round(2.5)"), Ok(Value::Int(3)));
        assert_eq!(eval_const("round(-2.5)"), Ok(Value::Int(-3)));
        assert_eq!(eval_const("floor(2.7)"), Ok(Value::Int(2)));
        assert_eq!(eval_const("ceil(2.1)"), Ok(Value::Int(3)));
        assert_eq!(eval_const("abs(-4)"), Ok(Value::Int(4)));
        assert_eq!(eval_const("abs(-0.5)"), Ok(Value::Float(0.5)));
        assert_eq!(eval_const("round(7)"), Ok(Value::Int(7)));
    }

    #[test]
    fn function_argument_must_be_numeric() {
        assert_eq!(
            eval_const("round('x')"),
            Err(FormulaError::UnaryTypeMismatch {
                op: "round",
                operand: "string",
            })
        );
    }

    #[test]
    fn missing_field_reads_as_null() {
        let ctx = FieldValues::new();
        assert_eq!(eval_with("discount", &ctx, &["discount"]), Ok(Value::Null));
        assert_eq!(
            eval_with("discount ? discount : 0", &ctx, &["discount"]),
            Ok(Value::Int(0))
        );
    }

    #[test]
    fn nested_paths() {
        let ctx = FieldValues::new().set("order.subtotal", 200_i64);
        assert_eq!(
            eval_with("order.subtotal * 0.15", &ctx, &["order.subtotal"]),
            Ok(Value::Float(30.0))
        );
    }

    #[test]
    fn string_concatenation_is_not_supported() {
        assert!(matches!(
            eval_const("'a' + 'b'"),
            Err(FormulaError::TypeMismatch { op: "+", .. })
        ));
    }
}
