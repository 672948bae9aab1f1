//! Comparison functions

use crate::error::EvalError;
use crate::evaluator::EvaluationContext;
use fieldcalc_core::value::{parse_date, parse_number};
use fieldcalc_core::Value;
use std::cmp::Ordering;

/// Order two values of the same coarse type
///
/// Numbers compare with numeric-looking text, dates with date-looking text,
/// and text with text (by code point). Any other pairing is a type error.
fn compare(function: &str, a: &Value, b: &Value) -> Result<Option<Ordering>, EvalError> {
    let mismatch = || EvalError::Type {
        function: function.to_string(),
        expected: "相同类型的值",
        actual: if matches!(a, Value::Number(_) | Value::Text(_) | Value::Date(_)) {
            b.type_name()
        } else {
            a.type_name()
        },
    };

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(x.partial_cmp(y)),
        (Value::Number(x), Value::Text(s)) => {
            let y = parse_number(s.as_str()).ok_or_else(mismatch)?;
            Ok(x.partial_cmp(&y))
        }
        (Value::Text(s), Value::Number(y)) => {
            let x = parse_number(s.as_str()).ok_or_else(mismatch)?;
            Ok(x.partial_cmp(y))
        }
        (Value::Text(x), Value::Text(y)) => Ok(Some(x.as_str().cmp(y.as_str()))),
        (Value::Date(x), Value::Date(y)) => Ok(Some(x.cmp(y))),
        (Value::Date(x), Value::Text(s)) => {
            let y = parse_date(s.as_str()).ok_or_else(mismatch)?;
            Ok(Some(x.cmp(&y)))
        }
        (Value::Text(s), Value::Date(y)) => {
            let x = parse_date(s.as_str()).ok_or_else(mismatch)?;
            Ok(Some(x.cmp(y)))
        }
        _ => Err(mismatch()),
    }
}

fn ordered(
    function: &str,
    args: &[Value],
    accept: fn(Ordering) -> bool,
) -> Result<Value, EvalError> {
    let ordering = compare(function, &args[0], &args[1])?;
    Ok(Value::Boolean(ordering.map_or(false, accept)))
}

/// EQ(value1, value2) - loose equality
pub fn fn_eq(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Boolean(args[0].loose_eq(&args[1])))
}

/// NE(value1, value2)
pub fn fn_ne(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Boolean(!args[0].loose_eq(&args[1])))
}

/// GT(value1, value2)
pub fn fn_gt(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    ordered("GT", args, Ordering::is_gt)
}

/// LT(value1, value2)
pub fn fn_lt(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    ordered("LT", args, Ordering::is_lt)
}

/// GTE(value1, value2)
pub fn fn_gte(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    ordered("GTE", args, Ordering::is_ge)
}

/// LTE(value1, value2)
pub fn fn_lte(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    ordered("LTE", args, Ordering::is_le)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvalOptions;
    use crate::functions::{FunctionImpl, FunctionRegistry};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn call(f: FunctionImpl, a: Value, b: Value) -> Result<Value, EvalError> {
        let registry = FunctionRegistry::new();
        let bindings: HashMap<String, Value> = HashMap::new();
        let options = EvalOptions::default();
        let ctx = EvaluationContext::new(&registry, &bindings, &options);
        f(&[a, b], &ctx)
    }

    #[test]
    fn test_eq_is_loose() {
        assert_eq!(call(fn_eq, Value::from(10), Value::from("10")), Ok(Value::Boolean(true)));
        assert_eq!(call(fn_eq, Value::from("a"), Value::from("a")), Ok(Value::Boolean(true)));
        assert_eq!(call(fn_eq, Value::from(1), Value::from(true)), Ok(Value::Boolean(false)));
        assert_eq!(call(fn_ne, Value::from(1), Value::from("2")), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(call(fn_gt, Value::from(7), Value::from(5)), Ok(Value::Boolean(true)));
        assert_eq!(call(fn_lt, Value::from(7), Value::from(5)), Ok(Value::Boolean(false)));
        assert_eq!(call(fn_gte, Value::from(5), Value::from("5")), Ok(Value::Boolean(true)));
        assert_eq!(call(fn_lte, Value::from("4.5"), Value::from(5)), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_text_and_date_ordering() {
        assert_eq!(call(fn_lt, Value::from("apple"), Value::from("banana")), Ok(Value::Boolean(true)));

        let d1 = Value::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let d2 = Value::from(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(call(fn_gt, d2.clone(), d1.clone()), Ok(Value::Boolean(true)));
        assert_eq!(call(fn_gt, d2, Value::from("2024-03-01")), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_mixed_types_are_errors() {
        assert_eq!(
            call(fn_gt, Value::from(1), Value::from("abc")),
            Err(EvalError::Type {
                function: "GT".to_string(),
                expected: "相同类型的值",
                actual: "text",
            })
        );
        assert!(matches!(
            call(fn_lt, Value::Boolean(true), Value::from(1)),
            Err(EvalError::Type { .. })
        ));
    }
}
