//! Variable extraction

use crate::ast::FormulaExpr;

/// Distinct variable names in order of first appearance
pub fn collect_variables(expr: &FormulaExpr) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    expr.walk(&mut |node| {
        if let FormulaExpr::Variable(name) = node {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
    });
    names
}
