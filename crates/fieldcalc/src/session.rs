//! Formula sessions
//!
//! A [`FormulaSession`] bundles what one editing session works against: the
//! function registry, the field catalog and the engine options. Formulas are
//! written with display names; data is usually keyed by source names.
//!
//! # Example
//!
//! ```rust
//! use fieldcalc::prelude::*;
//! use std::collections::HashMap;
//!
//! let catalog = FieldCatalog::from_fields([
//!     FieldDescriptor::new("年龄", "age", FieldType::Number),
//! ])
//! .unwrap();
//! let session = FormulaSession::new(catalog);
//!
//! let prepared = session.prepare("IF(GT(年龄, 17), \"成年\", \"未成年\")").unwrap();
//! assert_eq!(prepared.source_text(), "IF(GT(age, 17), \"成年\", \"未成年\")");
//!
//! let row: HashMap<String, Value> = [("age".to_string(), Value::from(30))].into();
//! assert_eq!(prepared.evaluate_source(&row).unwrap(), Value::from("成年"));
//! ```

use fieldcalc_core::{FieldCatalog, Value, ValueType};
use fieldcalc_formula::{
    check_arity, collect_variables, contains_volatile_function, evaluate, parse_formula,
    Bindings, EvalOptions, EvaluationContext, FormulaError, FormulaExpr, FormulaResult,
    FunctionRegistry, ValidationError, ValidationOutcome, Validator, Translator,
};
use log::debug;
use once_cell::sync::Lazy;

/// Marker prefixed to rendered errors
pub const DEFAULT_ERROR_MARKER: &str = "错误: ";

static DEFAULT_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// The built-in function registry, constructed on first use
pub fn default_registry() -> &'static FunctionRegistry {
    &DEFAULT_REGISTRY
}

/// Options for a formula session
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Evaluation behavior
    pub eval: EvalOptions,
    /// Prefix of rendered error strings
    pub error_marker: String,
    /// Rewrite field names inside quoted literals when translating
    pub translate_string_literals: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            eval: EvalOptions::default(),
            error_marker: DEFAULT_ERROR_MARKER.to_string(),
            translate_string_literals: false,
        }
    }
}

/// A validated formula together with its source-scheme translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedFormula {
    /// Formula as written, in display names
    pub original: String,
    /// Formula in source names
    pub translated: String,
    /// Top-level function name
    pub function: String,
    /// Top-level arguments in canonical text
    pub arguments: Vec<String>,
    /// Referenced variables (display names) in order of first appearance
    pub variables: Vec<String>,
    /// Static result type
    pub result_type: ValueType,
}

/// Outcome counts of a batch evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub rows: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Registry, field catalog and options for one editing session
#[derive(Debug, Clone)]
pub struct FormulaSession<'r> {
    registry: &'r FunctionRegistry,
    catalog: FieldCatalog,
    translator: Translator,
    options: EngineOptions,
}

impl FormulaSession<'static> {
    /// Session over the built-in functions
    pub fn new(catalog: FieldCatalog) -> Self {
        Self::with_registry(default_registry(), catalog)
    }
}

impl<'r> FormulaSession<'r> {
    /// Session over a caller-supplied registry
    pub fn with_registry(registry: &'r FunctionRegistry, catalog: FieldCatalog) -> Self {
        let options = EngineOptions::default();
        let translator = Translator::from_catalog(&catalog)
            .with_string_literals(options.translate_string_literals);
        Self {
            registry,
            catalog,
            translator,
            options,
        }
    }

    /// Replace the session options
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.translator = self
            .translator
            .with_string_literals(options.translate_string_literals);
        self.options = options;
        self
    }

    pub fn registry(&self) -> &'r FunctionRegistry {
        self.registry
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Validate display-scheme formula text against the catalog
    pub fn validate(&self, text: &str) -> Result<ValidationOutcome, ValidationError> {
        let result = Validator::new(self.registry, &self.catalog).validate_text(text);
        match &result {
            Ok(outcome) => debug!(
                "validated {:?}: {} -> {}",
                text, outcome.function, outcome.result_type
            ),
            Err(e) => debug!("rejected {:?}: {}", text, e),
        }
        result
    }

    /// Validate, then translate to source names
    pub fn validate_and_translate(&self, text: &str) -> Result<TranslatedFormula, ValidationError> {
        let outcome = self.validate(text)?;
        Ok(TranslatedFormula {
            original: text.to_string(),
            translated: self.translator.to_source(text),
            variables: collect_variables(&outcome.ast),
            function: outcome.function,
            arguments: outcome.arguments,
            result_type: outcome.result_type,
        })
    }

    /// Display names to source names, without validating
    pub fn to_source(&self, text: &str) -> String {
        self.translator.to_source(text)
    }

    /// Source names to display names, without validating
    pub fn to_display(&self, text: &str) -> String {
        self.translator.to_display(text)
    }

    /// Evaluate formula text against bindings keyed by the names it uses
    ///
    /// Variables are not checked against the catalog, so bindings may carry
    /// values the catalog does not declare.
    pub fn evaluate<B: Bindings>(&self, text: &str, bindings: &B) -> FormulaResult<Value> {
        debug!("evaluating {:?}", text);
        let ast = parse_formula(text)?;
        check_arity(&ast, self.registry)?;
        self.evaluate_ast(&ast, bindings)
    }

    /// Evaluate display-scheme text against bindings keyed by source names
    pub fn evaluate_source<B: Bindings>(&self, text: &str, bindings: &B) -> FormulaResult<Value> {
        self.evaluate(&self.translator.to_source(text), bindings)
    }

    /// Evaluate and render the outcome as text, errors prefixed by the marker
    pub fn evaluate_display<B: Bindings>(&self, text: &str, bindings: &B) -> String {
        match self.evaluate(text, bindings) {
            Ok(value) => value.to_string(),
            Err(e) => self.render_error(&e),
        }
    }

    pub fn render_error(&self, error: &FormulaError) -> String {
        error.render(&self.options.error_marker)
    }

    /// Validate once for repeated evaluation
    pub fn prepare(&self, text: &str) -> Result<PreparedFormula<'r>, ValidationError> {
        let outcome = self.validate(text)?;
        let source_text = self.translator.to_source(text);
        let source_ast = parse_formula(&source_text)?;

        Ok(PreparedFormula {
            registry: self.registry,
            options: self.options.eval.clone(),
            volatile: contains_volatile_function(&outcome.ast, self.registry),
            result_type: outcome.result_type,
            text: text.to_string(),
            source_text,
            ast: outcome.ast,
            source_ast,
        })
    }

    fn evaluate_ast<B: Bindings>(&self, ast: &FormulaExpr, bindings: &B) -> FormulaResult<Value> {
        let ctx = EvaluationContext::new(self.registry, bindings, &self.options.eval);
        let value = evaluate(ast, &ctx)?;
        debug!("evaluated to {}", value);
        Ok(value)
    }
}

/// A validated formula, parsed in both naming schemes
#[derive(Debug, Clone)]
pub struct PreparedFormula<'r> {
    registry: &'r FunctionRegistry,
    options: EvalOptions,
    volatile: bool,
    result_type: ValueType,
    text: String,
    source_text: String,
    ast: FormulaExpr,
    source_ast: FormulaExpr,
}

impl<'r> PreparedFormula<'r> {
    /// Display-scheme text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source-scheme text
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn ast(&self) -> &FormulaExpr {
        &self.ast
    }

    pub fn source_ast(&self) -> &FormulaExpr {
        &self.source_ast
    }

    pub fn result_type(&self) -> ValueType {
        self.result_type
    }

    /// Whether the result depends on the clock (TODAY/NOW)
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// Evaluate against bindings keyed by display names
    pub fn evaluate<B: Bindings>(&self, bindings: &B) -> FormulaResult<Value> {
        self.run(&self.ast, bindings)
    }

    /// Evaluate against bindings keyed by source names
    pub fn evaluate_source<B: Bindings>(&self, bindings: &B) -> FormulaResult<Value> {
        self.run(&self.source_ast, bindings)
    }

    /// Evaluate once per data row; rows are keyed by source names
    ///
    /// A failing row does not stop the batch.
    pub fn evaluate_rows<B: Bindings>(&self, rows: &[B]) -> (Vec<FormulaResult<Value>>, BatchStats) {
        let mut stats = BatchStats {
            rows: rows.len(),
            ..BatchStats::default()
        };

        let results: Vec<FormulaResult<Value>> = rows
            .iter()
            .map(|row| self.evaluate_source(row))
            .inspect(|result| match result {
                Ok(_) => stats.succeeded += 1,
                Err(_) => stats.failed += 1,
            })
            .collect();

        debug!(
            "evaluated {:?} over {} rows: {} ok, {} failed",
            self.source_text, stats.rows, stats.succeeded, stats.failed
        );
        (results, stats)
    }

    fn run<B: Bindings>(&self, ast: &FormulaExpr, bindings: &B) -> FormulaResult<Value> {
        let ctx = EvaluationContext::new(self.registry, bindings, &self.options);
        Ok(evaluate(ast, &ctx)?)
    }
}

/// Parse, check arity and evaluate with the built-in functions
pub fn calculate_formula<B: Bindings>(text: &str, bindings: &B) -> FormulaResult<Value> {
    let registry = default_registry();
    let ast = parse_formula(text)?;
    check_arity(&ast, registry)?;

    let options = EvalOptions::default();
    let ctx = EvaluationContext::new(registry, bindings, &options);
    Ok(evaluate(&ast, &ctx)?)
}

/// [`calculate_formula`] rendered as text; failures start with [`DEFAULT_ERROR_MARKER`]
pub fn calculate_formula_display<B: Bindings>(text: &str, bindings: &B) -> String {
    match calculate_formula(text, bindings) {
        Ok(value) => value.to_string(),
        Err(e) => e.render(DEFAULT_ERROR_MARKER),
    }
}
