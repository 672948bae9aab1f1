//! Date functions

use super::math::number_arg;
use crate::error::EvalError;
use crate::evaluator::EvaluationContext;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use fieldcalc_core::Value;

/// Date argument: date values or date-looking text
fn date_arg(function: &str, value: &Value) -> Result<NaiveDateTime, EvalError> {
    value.as_date().ok_or_else(|| EvalError::InvalidDate {
        function: function.to_string(),
    })
}

/// TODAY() - the evaluation's current date at midnight
pub fn fn_today(_args: &[Value], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Date(ctx.now().date().and_time(NaiveTime::MIN)))
}

/// NOW() - the evaluation's current date and time
pub fn fn_now(_args: &[Value], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Date(ctx.now()))
}

/// YEAR(date)
pub fn fn_year(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let date = date_arg("YEAR", &args[0])?;
    Ok(Value::Number(date.year() as f64))
}

/// MONTH(date)
pub fn fn_month(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let date = date_arg("MONTH", &args[0])?;
    Ok(Value::Number(date.month() as f64))
}

/// DAY(date)
pub fn fn_day(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let date = date_arg("DAY", &args[0])?;
    Ok(Value::Number(date.day() as f64))
}

/// DATE(year, month, day)
pub fn fn_date(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let year = number_arg("DATE", &args[0])?.trunc();
    let month = number_arg("DATE", &args[1])?.trunc();
    let day = number_arg("DATE", &args[2])?.trunc();

    let invalid = || EvalError::InvalidDate {
        function: "DATE".to_string(),
    };
    if month < 1.0 || day < 1.0 || year.abs() > 9999.0 {
        return Err(invalid());
    }
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).ok_or_else(invalid)?;
    Ok(Value::from(date))
}
