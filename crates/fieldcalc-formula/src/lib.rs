//! # fieldcalc-formula
//!
//! Formula language for computed fields.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Validation against a field catalog (arity, argument types, result type)
//! - Evaluation against variable bindings
//! - Built-in functions grouped by category
//! - Translation between display and source field names
//!
//! ## Example
//!
//! ```rust
//! use fieldcalc_formula::{evaluate, parse_formula, EvalOptions, EvaluationContext, FunctionRegistry};
//! use fieldcalc_core::Value;
//! use std::collections::HashMap;
//!
//! let registry = FunctionRegistry::new();
//! let mut bindings = HashMap::new();
//! bindings.insert("age".to_string(), Value::from(20));
//! let options = EvalOptions::default();
//! let ctx = EvaluationContext::new(&registry, &bindings, &options);
//!
//! let ast = parse_formula("IF(GT(age, 18), \"adult\", \"minor\")").unwrap();
//! assert_eq!(evaluate(&ast, &ctx).unwrap(), Value::from("adult"));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod translator;
pub mod validator;
pub mod variables;

pub use ast::FormulaExpr;
pub use error::{EvalError, FormulaError, FormulaResult, ParenExcess, ParseError, ValidationError};
pub use evaluator::{contains_volatile_function, evaluate, Bindings, EvalOptions, EvaluationContext};
pub use functions::{
    FunctionCategory, FunctionDef, FunctionImpl, FunctionRegistry, ParamSpec, ReturnType,
};
pub use parser::{parse_formula, MAX_NESTED_CALLS};
pub use translator::{to_display, to_source, NameMapping, Translator};
pub use validator::{check_arity, validate_formula, ValidationOutcome, Validator};
pub use variables::collect_variables;
