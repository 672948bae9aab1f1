//! Prelude module - common imports for fieldcalc users
//!
//! ```rust
//! use fieldcalc::prelude::*;
//! ```

pub use crate::{
    // Facade
    calculate_formula,
    BatchStats,
    // Evaluation
    Bindings,
    EngineOptions,
    EvalOptions,
    // Fields
    FieldCatalog,
    FieldDescriptor,
    FieldType,
    // Errors
    FormulaError,
    FormulaExpr,
    FormulaResult,
    FormulaSession,
    FunctionRegistry,
    PreparedFormula,
    ValidationError,
    // Values
    Value,
    ValueType,
};
