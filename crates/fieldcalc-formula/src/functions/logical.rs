//! Logical functions
//!
//! Conditions use value truthiness: `false`, `0`, empty text and null are
//! false, everything else is true.

use crate::error::EvalError;
use crate::evaluator::EvaluationContext;
use fieldcalc_core::Value;

/// IF(condition, value_if_true, value_if_false)
pub fn fn_if(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    if args[0].is_truthy() {
        Ok(args[1].clone())
    } else {
        Ok(args[2].clone())
    }
}

/// AND(logical1, ...)
pub fn fn_and(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Boolean(args.iter().all(Value::is_truthy)))
}

/// OR(logical1, ...)
pub fn fn_or(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Boolean(args.iter().any(Value::is_truthy)))
}

/// NOT(logical)
pub fn fn_not(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Boolean(!args[0].is_truthy()))
}

/// ISEMPTY(value) - null, empty text, empty list or empty object
pub fn fn_isempty(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(Value::Boolean(args[0].is_empty_value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvalOptions;
    use crate::functions::{FunctionImpl, FunctionRegistry};
    use std::collections::{BTreeMap, HashMap};

    fn call(f: FunctionImpl, args: &[Value]) -> Value {
        let registry = FunctionRegistry::new();
        let bindings: HashMap<String, Value> = HashMap::new();
        let options = EvalOptions::default();
        let ctx = EvaluationContext::new(&registry, &bindings, &options);
        f(args, &ctx).unwrap()
    }

    #[test]
    fn test_if_truthiness() {
        let branches = |cond: Value| [cond, Value::from("yes"), Value::from("no")];
        assert_eq!(call(fn_if, &branches(Value::Boolean(true))), Value::from("yes"));
        assert_eq!(call(fn_if, &branches(Value::Number(0.0))), Value::from("no"));
        assert_eq!(call(fn_if, &branches(Value::from("x"))), Value::from("yes"));
        assert_eq!(call(fn_if, &branches(Value::from(""))), Value::from("no"));
        assert_eq!(call(fn_if, &branches(Value::Null)), Value::from("no"));
    }

    #[test]
    fn test_and_or_not() {
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);
        assert_eq!(call(fn_and, &[t.clone(), Value::from(1)]), Value::Boolean(true));
        assert_eq!(call(fn_and, &[t.clone(), f.clone()]), Value::Boolean(false));
        assert_eq!(call(fn_or, &[f.clone(), Value::from(0)]), Value::Boolean(false));
        assert_eq!(call(fn_or, &[f.clone(), t.clone()]), Value::Boolean(true));
        assert_eq!(call(fn_not, &[f]), Value::Boolean(true));
        assert_eq!(call(fn_not, &[Value::from("text")]), Value::Boolean(false));
    }

    #[test]
    fn test_isempty() {
        assert_eq!(call(fn_isempty, &[Value::Null]), Value::Boolean(true));
        assert_eq!(call(fn_isempty, &[Value::from("")]), Value::Boolean(true));
        assert_eq!(call(fn_isempty, &[Value::List(vec![])]), Value::Boolean(true));
        assert_eq!(
            call(fn_isempty, &[Value::Object(BTreeMap::new())]),
            Value::Boolean(true)
        );
        assert_eq!(call(fn_isempty, &[Value::from(0)]), Value::Boolean(false));
    }
}
