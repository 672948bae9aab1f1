//! Formula validation
//!
//! Checks run in a fixed order and the first fault wins:
//!
//! 1. parentheses balance (parentheses inside string literals are ignored)
//! 2. the formula starts with a known function name followed by `(`
//! 3. the text parses
//! 4. every call has an acceptable argument count
//! 5. every argument has an acceptable type
//!
//! Argument types are inferred depth-first, so a broken nested call is
//! reported before the enclosing call's own type checks run.

use crate::ast::FormulaExpr;
use crate::error::{ParenExcess, ValidationError};
use crate::functions::{FunctionDef, FunctionRegistry, ReturnType};
use crate::parser::parse_formula;
use fieldcalc_core::{FieldCatalog, ValueType};
use lazy_regex::regex_captures;

/// Result of validating a formula
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// Top-level function name (upper-case)
    pub function: String,
    /// Top-level arguments in canonical formula text
    pub arguments: Vec<String>,
    /// Static result type of the formula
    pub result_type: ValueType,
    /// Parsed formula
    pub ast: FormulaExpr,
}

/// Validates formulas against a function registry and a field catalog
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a FunctionRegistry,
    catalog: &'a FieldCatalog,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a FunctionRegistry, catalog: &'a FieldCatalog) -> Self {
        Self { registry, catalog }
    }

    /// Validate raw formula text
    pub fn validate_text(&self, text: &str) -> Result<ValidationOutcome, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::Empty);
        }

        check_parens(text)?;

        let (_, name) = regex_captures!(r"^\s*([\p{L}_][\p{L}\p{N}_]*)\s*\(", text)
            .ok_or(ValidationError::MissingFunction)?;
        if !self.registry.contains(name) {
            return Err(ValidationError::UnknownFunction {
                name: name.to_uppercase(),
            });
        }

        let ast = parse_formula(text)?;
        self.validate(&ast)
    }

    /// Validate a parsed formula
    pub fn validate(&self, ast: &FormulaExpr) -> Result<ValidationOutcome, ValidationError> {
        let (name, args) = match ast {
            FormulaExpr::Function { name, args } => (name, args),
            _ => return Err(ValidationError::MissingFunction),
        };

        let result_type = self.check_call(name, args)?;

        Ok(ValidationOutcome {
            function: name.clone(),
            arguments: args.iter().map(|arg| arg.to_string()).collect(),
            result_type,
            ast: ast.clone(),
        })
    }

    /// Static type of one argument, validating any calls inside it
    fn arg_type(
        &self,
        def: &FunctionDef,
        index: usize,
        arg: &FormulaExpr,
    ) -> Result<ValueType, ValidationError> {
        match arg {
            FormulaExpr::Number(_) => Ok(ValueType::Number),
            FormulaExpr::String(_) => Ok(ValueType::Text),
            FormulaExpr::Boolean(_) => Ok(ValueType::Boolean),
            FormulaExpr::Variable(name) => {
                self.variable_type(name)
                    .ok_or_else(|| ValidationError::UnrecognizedParameter {
                        function: def.name.to_string(),
                        position: index + 1,
                        parameter: name.clone(),
                    })
            }
            FormulaExpr::Function { name, args } => self.check_call(name, args),
        }
    }

    /// Declared type of a variable; dotted paths under a known field are `Any`
    fn variable_type(&self, name: &str) -> Option<ValueType> {
        if let Some(field) = self.catalog.get(name) {
            return Some(field.field_type.value_type());
        }
        name.rmatch_indices('.')
            .find(|(i, _)| self.catalog.get(&name[..*i]).is_some())
            .map(|_| ValueType::Any)
    }

    fn check_call(&self, name: &str, args: &[FormulaExpr]) -> Result<ValueType, ValidationError> {
        let def = self
            .registry
            .lookup(name)
            .ok_or_else(|| ValidationError::UnknownFunction {
                name: name.to_uppercase(),
            })?;

        check_arg_count(def, args.len())?;

        // Resolve every argument first (depth-first)
        let mut arg_types = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            arg_types.push(self.arg_type(def, i, arg)?);
        }

        for (i, &actual) in arg_types.iter().enumerate() {
            let expected = def.params.type_at(i);
            if !accepts(expected, actual) {
                return Err(ValidationError::TypeMismatch {
                    function: def.name.to_string(),
                    position: i + 1,
                    expected,
                    actual,
                });
            }
        }

        if def.matching_operands {
            if let [left, right] = arg_types[..] {
                if !comparable(left, right) {
                    return Err(ValidationError::ComparisonMismatch {
                        function: def.name.to_string(),
                        left,
                        right,
                    });
                }
            }
        }

        Ok(match def.returns {
            ReturnType::Fixed(ty) => ty,
            ReturnType::Branches(indexes) => {
                common_type(indexes.iter().filter_map(|&i| arg_types.get(i).copied()))
            }
        })
    }
}

/// Validate formula text with a one-off [`Validator`]
pub fn validate_formula(
    text: &str,
    registry: &FunctionRegistry,
    catalog: &FieldCatalog,
) -> Result<ValidationOutcome, ValidationError> {
    Validator::new(registry, catalog).validate_text(text)
}

/// Check function names and argument counts only
///
/// This is the minimum needed before evaluation when no field catalog is
/// available: with it, no call can reach an implementation with the wrong
/// number of arguments.
pub fn check_arity(expr: &FormulaExpr, registry: &FunctionRegistry) -> Result<(), ValidationError> {
    if let FormulaExpr::Function { name, args } = expr {
        let def = registry
            .lookup(name)
            .ok_or_else(|| ValidationError::UnknownFunction {
                name: name.to_uppercase(),
            })?;
        check_arg_count(def, args.len())?;
        for arg in args {
            check_arity(arg, registry)?;
        }
    }
    Ok(())
}

fn check_arg_count(def: &FunctionDef, actual: usize) -> Result<(), ValidationError> {
    if actual < def.min_args {
        return Err(ValidationError::TooFewArguments {
            function: def.name.to_string(),
            min: def.min_args,
            actual,
        });
    }
    if let Some(max) = def.max_args {
        if actual > max {
            return Err(ValidationError::TooManyArguments {
                function: def.name.to_string(),
                max,
                actual,
            });
        }
    }
    Ok(())
}

/// Parentheses must balance outside string literals
fn check_parens(text: &str) -> Result<(), ValidationError> {
    let mut open = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (position, c) in text.chars().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => open.push(position),
            ')' => {
                if open.pop().is_none() {
                    return Err(ValidationError::UnbalancedParens {
                        excess: ParenExcess::Closing,
                        position,
                    });
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some(position) => Err(ValidationError::UnbalancedParens {
            excess: ParenExcess::Opening,
            position,
        }),
        None => Ok(()),
    }
}

/// Whether an argument of type `actual` may fill a parameter of type `expected`
fn accepts(expected: ValueType, actual: ValueType) -> bool {
    expected == actual
        || expected == ValueType::Any
        || actual == ValueType::Any
        || (expected == ValueType::Date && actual == ValueType::Text)
}

/// Whether two operands of an ordering comparison share an ordered type
///
/// Numbers, text and dates order; booleans do not.
fn comparable(left: ValueType, right: ValueType) -> bool {
    use ValueType::*;
    matches!(
        (left, right),
        (Any, _)
            | (_, Any)
            | (Number, Number)
            | (Text, Text)
            | (Date, Date)
            | (Date, Text)
            | (Text, Date)
    )
}

fn common_type(mut types: impl Iterator<Item = ValueType>) -> ValueType {
    match types.next() {
        Some(first) if types.all(|ty| ty == first) => first,
        _ => ValueType::Any,
    }
}
