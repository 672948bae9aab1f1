//! Formula evaluator
//!
//! Walks the AST, resolving variables against a [`Bindings`] environment and
//! applying each call's implementation from the [`FunctionRegistry`].

use crate::ast::FormulaExpr;
use crate::error::EvalError;
use crate::functions::{FunctionDef, FunctionRegistry};
use ahash::AHashMap;
use chrono::{Local, NaiveDateTime};
use fieldcalc_core::Value;
use log::trace;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read-only variable environment for one evaluation
pub trait Bindings {
    /// Look up a variable by its exact name
    fn get(&self, name: &str) -> Option<&Value>;
}

impl<S: BuildHasher> Bindings for HashMap<String, Value, S> {
    fn get(&self, name: &str) -> Option<&Value> {
        HashMap::get(self, name)
    }
}

impl<S: BuildHasher> Bindings for AHashMap<String, Value, S> {
    fn get(&self, name: &str) -> Option<&Value> {
        (**self).get(name)
    }
}

impl Bindings for BTreeMap<String, Value> {
    fn get(&self, name: &str) -> Option<&Value> {
        BTreeMap::get(self, name)
    }
}

/// An object value binds its members
impl Bindings for Value {
    fn get(&self, name: &str) -> Option<&Value> {
        Value::get(self, name)
    }
}

impl<B: Bindings + ?Sized> Bindings for &B {
    fn get(&self, name: &str) -> Option<&Value> {
        (**self).get(name)
    }
}

/// Evaluation options
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOptions {
    /// Evaluate only the taken IF branch and stop AND/OR at the first decisive
    /// argument. Off by default: every argument is evaluated.
    pub short_circuit: bool,
    /// Treat non-numeric values as 0 in ADD/SUM/MULTIPLY instead of failing
    pub lenient_numbers: bool,
    /// Fixed clock for TODAY()/NOW(); the local time when `None`
    pub now: Option<NaiveDateTime>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            short_circuit: false,
            lenient_numbers: true,
            now: None,
        }
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    pub registry: &'a FunctionRegistry,
    pub bindings: &'a dyn Bindings,
    pub options: &'a EvalOptions,
    /// Clock reading shared by every TODAY()/NOW() in one evaluation
    now: NaiveDateTime,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(
        registry: &'a FunctionRegistry,
        bindings: &'a dyn Bindings,
        options: &'a EvalOptions,
    ) -> Self {
        Self {
            registry,
            bindings,
            options,
            now: options.now.unwrap_or_else(|| Local::now().naive_local()),
        }
    }

    /// Current date and time for this evaluation
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Resolve a variable
    ///
    /// An exact binding wins. Otherwise a dotted name (`user.address.city`)
    /// is split at the longest bound prefix and the rest is walked through
    /// object members.
    pub fn resolve_variable(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.bindings.get(name) {
            return Ok(value.clone());
        }

        for (i, _) in name.rmatch_indices('.') {
            if let Some(root) = self.bindings.get(&name[..i]) {
                return root
                    .get_path(&name[i + 1..])
                    .cloned()
                    .ok_or_else(|| undefined(name));
            }
        }

        Err(undefined(name))
    }
}

fn undefined(name: &str) -> EvalError {
    EvalError::UndefinedVariable {
        name: name.to_string(),
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> Result<Value, EvalError> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(Value::Number(*n)),
        FormulaExpr::String(s) => Ok(Value::text(s)),
        FormulaExpr::Boolean(b) => Ok(Value::Boolean(*b)),

        // === Variables ===
        FormulaExpr::Variable(name) => ctx.resolve_variable(name),

        // === Function call ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> Result<Value, EvalError> {
    let func = ctx
        .registry
        .lookup(name)
        .ok_or_else(|| EvalError::UnknownFunction {
            name: name.to_string(),
        })?;

    // Check argument count
    if !func.accepts_arg_count(args.len()) {
        return Err(EvalError::ArgumentCount {
            function: func.name.to_string(),
            expected: func.arity_label(),
            actual: args.len(),
        });
    }

    if ctx.options.short_circuit {
        if let Some(result) = evaluate_lazily(func, args, ctx) {
            return result;
        }
    }

    // Evaluate arguments, left to right
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    trace!("apply {} to {} argument(s)", func.name, evaluated_args.len());

    // Call the function
    (func.implementation)(&evaluated_args, ctx)
}

/// Lazy forms of IF/AND/OR; `None` for every other function
fn evaluate_lazily(
    func: &FunctionDef,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> Option<Result<Value, EvalError>> {
    match func.name {
        "IF" => Some(evaluate(&args[0], ctx).and_then(|condition| {
            let branch = if condition.is_truthy() { &args[1] } else { &args[2] };
            evaluate(branch, ctx)
        })),
        "AND" => Some(evaluate_until(args, ctx, false)),
        "OR" => Some(evaluate_until(args, ctx, true)),
        _ => None,
    }
}

/// Evaluate arguments until one has truthiness `decisive`
fn evaluate_until(
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
    decisive: bool,
) -> Result<Value, EvalError> {
    for arg in args {
        if evaluate(arg, ctx)?.is_truthy() == decisive {
            return Ok(Value::Boolean(decisive));
        }
    }
    Ok(Value::Boolean(!decisive))
}

/// Whether the expression calls a volatile function such as TODAY()
pub fn contains_volatile_function(expr: &FormulaExpr, registry: &FunctionRegistry) -> bool {
    match expr {
        FormulaExpr::Function { name, args } => {
            registry.lookup(name).map_or(false, |def| def.volatile)
                || args
                    .iter()
                    .any(|arg| contains_volatile_function(arg, registry))
        }
        _ => false,
    }
}
