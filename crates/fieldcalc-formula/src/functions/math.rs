//! Arithmetic functions

use super::flatten_args;
use crate::error::EvalError;
use crate::evaluator::EvaluationContext;
use fieldcalc_core::Value;
use log::warn;

/// Strict numeric argument: numbers and numeric-looking text only
pub(crate) fn number_arg(function: &str, value: &Value) -> Result<f64, EvalError> {
    value.as_number().ok_or_else(|| EvalError::Type {
        function: function.to_string(),
        expected: "数字",
        actual: value.type_name(),
    })
}

/// Accumulation argument: non-numeric values count as 0 in lenient mode
fn accumulate_arg(function: &str, value: &Value, ctx: &EvaluationContext) -> Result<f64, EvalError> {
    match value.as_number() {
        Some(n) => Ok(n),
        None if ctx.options.lenient_numbers => {
            warn!(
                "{}: non-numeric {} argument {:?} treated as 0",
                function,
                value.type_name(),
                value.to_string()
            );
            Ok(0.0)
        }
        None => number_arg(function, value),
    }
}

/// Numeric values among the arguments, skipping everything else
fn numeric_values(args: &[Value]) -> impl Iterator<Item = f64> + '_ {
    flatten_args(args).filter_map(Value::as_number)
}

/// ADD(number1, ...)
pub fn fn_add(args: &[Value], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let mut total = 0.0;
    for arg in flatten_args(args) {
        total += accumulate_arg("ADD", arg, ctx)?;
    }
    Ok(Value::Number(total))
}

/// SUM(number1, ...)
pub fn fn_sum(args: &[Value], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let mut total = 0.0;
    for arg in flatten_args(args) {
        total += accumulate_arg("SUM", arg, ctx)?;
    }
    Ok(Value::Number(total))
}

/// SUBTRACT(number1, number2)
pub fn fn_subtract(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let a = number_arg("SUBTRACT", &args[0])?;
    let b = number_arg("SUBTRACT", &args[1])?;
    Ok(Value::Number(a - b))
}

/// MULTIPLY(number1, number2, ...)
pub fn fn_multiply(args: &[Value], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let mut product = 1.0;
    for arg in flatten_args(args) {
        product *= accumulate_arg("MULTIPLY", arg, ctx)?;
    }
    Ok(Value::Number(product))
}

/// DIVIDE(number1, number2)
pub fn fn_divide(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let a = number_arg("DIVIDE", &args[0])?;
    let b = number_arg("DIVIDE", &args[1])?;
    if b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Number(a / b))
}

/// AVERAGE(number1, ...) - non-numeric values are ignored; no numbers gives 0
pub fn fn_average(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let (sum, count) = numeric_values(args).fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
    if count == 0 {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(sum / count as f64))
}

/// MAX(number1, ...)
pub fn fn_max(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let max = numeric_values(args).fold(None, |m: Option<f64>, n| Some(m.map_or(n, |m| m.max(n))));
    Ok(Value::Number(max.unwrap_or(0.0)))
}

/// MIN(number1, ...)
pub fn fn_min(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let min = numeric_values(args).fold(None, |m: Option<f64>, n| Some(m.map_or(n, |m| m.min(n))));
    Ok(Value::Number(min.unwrap_or(0.0)))
}

/// COUNT(value1, ...) - numbers and numeric-looking text
pub fn fn_count(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Number(numeric_values(args).count() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{EvalOptions, EvaluationContext};
    use crate::functions::{FunctionImpl, FunctionRegistry};
    use std::collections::HashMap;

    fn call(f: FunctionImpl, args: &[Value]) -> Result<Value, EvalError> {
        call_with(f, args, EvalOptions::default())
    }

    fn call_with(
        f: FunctionImpl,
        args: &[Value],
        options: EvalOptions,
    ) -> Result<Value, EvalError> {
        let registry = FunctionRegistry::new();
        let bindings: HashMap<String, Value> = HashMap::new();
        let ctx = EvaluationContext::new(&registry, &bindings, &options);
        f(args, &ctx)
    }

    #[test]
    fn test_add_and_sum() {
        let args = [Value::from(1), Value::from(2.5), Value::from("3")];
        assert_eq!(call(fn_add, &args), Ok(Value::Number(6.5)));
        assert_eq!(call(fn_sum, &args), Ok(Value::Number(6.5)));
    }

    #[test]
    fn test_lenient_accumulation() {
        let args = [Value::from(4), Value::from("abc"), Value::Null];
        assert_eq!(call(fn_add, &args), Ok(Value::Number(4.0)));
        assert_eq!(call(fn_multiply, &args), Ok(Value::Number(0.0)));

        let strict = EvalOptions {
            lenient_numbers: false,
            ..EvalOptions::default()
        };
        assert_eq!(
            call_with(fn_sum, &args, strict),
            Err(EvalError::Type {
                function: "SUM".to_string(),
                expected: "数字",
                actual: "text",
            })
        );
    }

    #[test]
    fn test_subtract_is_strict() {
        assert_eq!(
            call(fn_subtract, &[Value::from(30), Value::from(10)]),
            Ok(Value::Number(20.0))
        );
        assert!(matches!(
            call(fn_subtract, &[Value::from("x"), Value::from(1)]),
            Err(EvalError::Type { .. })
        ));
    }

    #[test]
    fn test_divide() {
        assert_eq!(
            call(fn_divide, &[Value::from(10), Value::from(4)]),
            Ok(Value::Number(2.5))
        );
        assert_eq!(
            call(fn_divide, &[Value::from(10), Value::from(0)]),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(
            call(fn_divide, &[Value::from(10), Value::from("0")]),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn test_average() {
        assert_eq!(
            call(fn_average, &[Value::from(80), Value::from(90), Value::from("n/a")]),
            Ok(Value::Number(85.0))
        );
        assert_eq!(call(fn_average, &[Value::from("x")]), Ok(Value::Number(0.0)));
    }

    #[test]
    fn test_max_min_count() {
        let args = [
            Value::from(3),
            Value::List(vec![Value::from(9), Value::from("-2")]),
            Value::from("x"),
        ];
        assert_eq!(call(fn_max, &args), Ok(Value::Number(9.0)));
        assert_eq!(call(fn_min, &args), Ok(Value::Number(-2.0)));
        assert_eq!(call(fn_count, &args), Ok(Value::Number(3.0)));
        assert_eq!(call(fn_max, &[Value::Null]), Ok(Value::Number(0.0)));
    }
}
