//! Property tests for parsing and name translation

use fieldcalc::prelude::*;
use fieldcalc::{parse_formula, Translator};
use proptest::prelude::*;

fn identifier() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,6}".prop_filter("boolean keyword", |s| s != "true" && s != "false")
}

fn leaf() -> impl Strategy<Value = FormulaExpr> {
    prop_oneof![
        (-1000i32..1000).prop_map(|n| FormulaExpr::Number(f64::from(n))),
        (-400i32..400).prop_map(|n| FormulaExpr::Number(f64::from(n) / 8.0)),
        "[a-z 年龄,()'\"\\\\\n\t]{0,8}".prop_map(FormulaExpr::String),
        any::<bool>().prop_map(FormulaExpr::Boolean),
        identifier().prop_map(FormulaExpr::Variable),
    ]
}

fn expr() -> impl Strategy<Value = FormulaExpr> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        ("[A-Z][A-Z0-9]{0,5}", prop::collection::vec(inner, 0..4))
            .prop_map(|(name, args)| FormulaExpr::call(&name, args))
    })
}

proptest! {
    /// Rendering a formula and parsing it back yields the same tree
    #[test]
    fn display_reparses_to_same_ast(ast in expr()) {
        let text = ast.to_string();
        let reparsed = parse_formula(&text);
        prop_assert_eq!(reparsed.as_ref(), Ok(&ast), "text: {}", text);

        // Stable from then on
        let again = reparsed.map(|e| e.to_string());
        prop_assert_eq!(again, Ok(text));
    }

    /// Display to source and back restores the text
    #[test]
    fn translation_round_trips(
        picks in prop::collection::vec((0usize..7, 0usize..5), 1..10)
    ) {
        let catalog = FieldCatalog::from_fields([
            FieldDescriptor::new("名字", "name", FieldType::Text),
            FieldDescriptor::new("性别", "gender", FieldType::Text),
            FieldDescriptor::new("年龄", "age", FieldType::Number),
            FieldDescriptor::new("年龄段", "ageGroup", FieldType::Text),
            FieldDescriptor::new("职业", "occupation", FieldType::Text),
            FieldDescriptor::new("数值", "count", FieldType::Number),
            FieldDescriptor::new("创建时间", "createTime", FieldType::DateTime),
        ])
        .unwrap();
        let names: Vec<&str> = catalog.iter().map(|f| f.display_name.as_str()).collect();
        let separators = [", ", ",", ") ", " ", "))"];

        let text: String = picks
            .iter()
            .map(|&(field, sep)| format!("{}{}", names[field], separators[sep]))
            .collect();
        let text = format!("CONCATENATE({}", text);

        let translator = Translator::from_catalog(&catalog);
        prop_assert_eq!(translator.to_display(&translator.to_source(&text)), text);
    }
}
