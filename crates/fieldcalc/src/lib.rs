//! # fieldcalc
//!
//! A small formula language for computed fields.
//!
//! Formulas are function calls over field references and literals, such as
//! `IF(GT(年龄, 18), "成年", "未成年")`. Users write them with display names;
//! they are stored and evaluated with source names.
//!
//! ## Features
//!
//! - Recursive-descent parser producing a typed AST
//! - Validation of arity and argument types against a field catalog
//! - Evaluation against variable bindings, with nested object access
//! - Whole-token translation between display and source names
//! - Prepared formulas and per-row batch evaluation
//!
//! ## Example
//!
//! ```rust
//! use fieldcalc::prelude::*;
//! use std::collections::HashMap;
//!
//! let mut vars = HashMap::new();
//! vars.insert("x".to_string(), Value::from(7));
//!
//! let result = calculate_formula(
//!     "IF(GT(x, 10), \"大于10\", IF(GT(x, 5), \"大于5\", \"小于等于5\"))",
//!     &vars,
//! )
//! .unwrap();
//! assert_eq!(result, Value::from("大于5"));
//! ```

pub mod prelude;
pub mod session;

pub use session::{
    calculate_formula, calculate_formula_display, default_registry, BatchStats, EngineOptions,
    FormulaSession, PreparedFormula, TranslatedFormula, DEFAULT_ERROR_MARKER,
};

// Re-export core types
pub use fieldcalc_core::{
    // Error types
    Error,
    // Fields
    FieldCatalog,
    FieldDescriptor,
    FieldType,
    Result,
    SharedString,
    // Values
    Value,
    ValueType,
};

// Re-export formula types
pub use fieldcalc_formula::{
    check_arity, collect_variables, evaluate, parse_formula, to_display, to_source,
    validate_formula, Bindings, EvalError, EvalOptions, EvaluationContext, FormulaError,
    FormulaExpr, FormulaResult, FunctionCategory, FunctionDef, FunctionRegistry, NameMapping,
    ParseError, Translator, ValidationError, ValidationOutcome, Validator,
};
