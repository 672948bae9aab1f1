//! Text functions
//!
//! Lengths and positions count characters, not bytes.

use super::math::number_arg;
use crate::error::EvalError;
use crate::evaluator::EvaluationContext;
use fieldcalc_core::Value;

/// Character count argument; fractions truncate and negatives clamp to 0
fn count_arg(function: &str, value: &Value) -> Result<usize, EvalError> {
    let n = number_arg(function, value)?.trunc();
    Ok(if n <= 0.0 { 0 } else { n as usize })
}

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

fn take_mid(s: &str, start_1based: usize, n: usize) -> String {
    let start0 = start_1based.saturating_sub(1);
    s.chars().skip(start0).take(n).collect()
}

/// CONCATENATE(value1, ...)
pub fn fn_concatenate(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let joined: String = args.iter().map(|v| v.to_string()).collect();
    Ok(Value::text(joined))
}

/// LEN(text)
pub fn fn_len(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].to_string().chars().count() as f64))
}

/// LEFT(text, num_chars)
pub fn fn_left(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let n = count_arg("LEFT", &args[1])?;
    Ok(Value::text(take_left(&args[0].to_string(), n)))
}

/// RIGHT(text, num_chars)
pub fn fn_right(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let n = count_arg("RIGHT", &args[1])?;
    Ok(Value::text(take_right(&args[0].to_string(), n)))
}

/// MID(text, start_num, num_chars) - `start_num` is 1-based
pub fn fn_mid(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let start = count_arg("MID", &args[1])?.max(1);
    let n = count_arg("MID", &args[2])?;
    Ok(Value::text(take_mid(&args[0].to_string(), start, n)))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::text(args[0].to_string().to_lowercase()))
}

/// UPPER(text)
pub fn fn_upper(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::text(args[0].to_string().to_uppercase()))
}

/// TRIM(text)
pub fn fn_trim(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::text(args[0].to_string().trim()))
}
