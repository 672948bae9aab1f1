//! Formula Abstract Syntax Tree types

use fieldcalc_core::value::format_number;
use std::fmt;

/// Formula expression AST
///
/// Each node exclusively owns its children. Argument counts are not
/// constrained here; arity is checked by the validator.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),

    // === Identifiers ===
    /// Field reference, resolved against bindings at evaluation time
    Variable(String),

    // === Function call ===
    /// Function call; `name` is upper-case
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

impl FormulaExpr {
    /// Build a function call node, canonicalizing the name
    pub fn call(name: &str, args: Vec<FormulaExpr>) -> Self {
        FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        }
    }

    /// Build a variable node
    pub fn var(name: impl Into<String>) -> Self {
        FormulaExpr::Variable(name.into())
    }

    /// Name of the function if this node is a call
    pub fn function_name(&self) -> Option<&str> {
        match self {
            FormulaExpr::Function { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Visit this node and all descendants in pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a FormulaExpr)) {
        visit(self);
        if let FormulaExpr::Function { args, .. } = self {
            for arg in args {
                arg.walk(visit);
            }
        }
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => f.write_str(&format_number(*n)),
            FormulaExpr::String(s) => write_quoted(f, s),
            FormulaExpr::Boolean(b) => write!(f, "{}", b),
            FormulaExpr::Variable(name) => f.write_str(name),
            FormulaExpr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            _ => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let expr = FormulaExpr::call(
            "if",
            vec![
                FormulaExpr::call(
                    "gt",
                    vec![FormulaExpr::var("年龄"), FormulaExpr::Number(18.0)],
                ),
                FormulaExpr::String("成年 \"adult\"".to_string()),
                FormulaExpr::Boolean(false),
            ],
        );
        assert_eq!(
            expr.to_string(),
            r#"IF(GT(年龄, 18), "成年 \"adult\"", false)"#
        );
        assert_eq!(FormulaExpr::Number(-2.5).to_string(), "-2.5");
        assert_eq!(FormulaExpr::call("today", vec![]).to_string(), "TODAY()");
    }

    #[test]
    fn test_walk_pre_order() {
        let expr = FormulaExpr::call(
            "ADD",
            vec![
                FormulaExpr::var("a"),
                FormulaExpr::call("SUM", vec![FormulaExpr::var("b")]),
            ],
        );
        let mut seen = Vec::new();
        expr.walk(&mut |node| seen.push(node.to_string()));
        assert_eq!(seen, vec!["ADD(a, SUM(b))", "a", "SUM(b)", "b"]);
    }
}
