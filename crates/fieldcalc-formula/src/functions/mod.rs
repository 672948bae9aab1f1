//! Built-in functions
//!
//! The registry is a plain value: build one with [`FunctionRegistry::new`] and
//! pass it to the validator and evaluator. It is never mutated after
//! construction, so a single instance can be shared across threads.

pub mod comparison;
pub mod date;
pub mod logical;
pub mod math;
pub mod text;

use crate::error::EvalError;
use crate::evaluator::EvaluationContext;
use ahash::AHashMap;
use fieldcalc_core::{Value, ValueType};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Function implementation signature
///
/// Implementations receive already-evaluated arguments whose count has been
/// checked against the descriptor.
pub type FunctionImpl = fn(&[Value], &EvaluationContext) -> Result<Value, EvalError>;

/// Function category, used to group the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionCategory {
    Arithmetic,
    Logical,
    Comparison,
    Text,
    Date,
}

impl FunctionCategory {
    pub const ALL: [FunctionCategory; 5] = [
        FunctionCategory::Arithmetic,
        FunctionCategory::Logical,
        FunctionCategory::Comparison,
        FunctionCategory::Text,
        FunctionCategory::Date,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionCategory::Arithmetic => "arithmetic",
            FunctionCategory::Logical => "logical",
            FunctionCategory::Comparison => "comparison",
            FunctionCategory::Text => "text",
            FunctionCategory::Date => "date",
        }
    }

    /// Heading shown in the function catalog
    pub fn label(&self) -> &'static str {
        match self {
            FunctionCategory::Arithmetic => "数学函数",
            FunctionCategory::Logical => "逻辑函数",
            FunctionCategory::Comparison => "比较函数",
            FunctionCategory::Text => "文本函数",
            FunctionCategory::Date => "日期函数",
        }
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FunctionCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown function category: {}", s))
    }
}

/// Expected argument types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSpec {
    /// Every argument has the same type (ADD, CONCATENATE)
    Uniform(ValueType),
    /// One type per position (IF: boolean, any, any)
    Positional(&'static [ValueType]),
}

impl ParamSpec {
    /// Expected type of the argument at a 0-based index
    pub fn type_at(&self, index: usize) -> ValueType {
        match self {
            ParamSpec::Uniform(ty) => *ty,
            ParamSpec::Positional(types) => types.get(index).copied().unwrap_or(ValueType::Any),
        }
    }
}

/// How a call's static result type is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Fixed(ValueType),
    /// Common type of the arguments at these 0-based indexes, else `Any`
    Branches(&'static [usize]),
}

/// Function definition
#[derive(Clone)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    pub category: FunctionCategory,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    pub params: ParamSpec,
    pub returns: ReturnType,
    /// Ordering comparison: both operands must share a coarse type
    pub matching_operands: bool,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Result depends on the clock
    pub volatile: bool,
    pub description: &'static str,
    pub syntax: &'static str,
    pub example: &'static str,
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("volatile", &self.volatile)
            .finish_non_exhaustive()
    }
}

impl FunctionDef {
    /// Whether `count` arguments is within `[min_args, max_args]`
    pub fn accepts_arg_count(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Human-readable arity, e.g. `2`, `1..3`, `at least 1`
    pub fn arity_label(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..{}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }
}

/// Function registry
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_arithmetic_functions();
        registry.register_logical_functions();
        registry.register_comparison_functions();
        registry.register_text_functions();
        registry.register_date_functions();

        registry
    }

    /// Look up a function by name (case-insensitive)
    pub fn lookup(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// All functions, sorted by name
    pub fn all(&self) -> Vec<&FunctionDef> {
        let mut defs: Vec<&FunctionDef> = self.functions.values().collect();
        defs.sort_by_key(|def| def.name);
        defs
    }

    /// Functions grouped by category, each group sorted by name
    pub fn by_category(&self) -> BTreeMap<FunctionCategory, Vec<&FunctionDef>> {
        let mut groups: BTreeMap<FunctionCategory, Vec<&FunctionDef>> = BTreeMap::new();
        for def in self.all() {
            groups.entry(def.category).or_default().push(def);
        }
        groups
    }

    /// Function names ordered longest first, ties alphabetically
    ///
    /// Scanners that match names against raw text use this order so that a
    /// shorter name is never taken for the prefix of a longer one.
    pub fn names_longest_first(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.values().map(|def| def.name).collect();
        names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    fn register_arithmetic_functions(&mut self) {
        const NUMBER: ParamSpec = ParamSpec::Uniform(ValueType::Number);
        const RETURNS: ReturnType = ReturnType::Fixed(ValueType::Number);

        // ADD
        self.register(FunctionDef {
            name: "ADD",
            category: FunctionCategory::Arithmetic,
            min_args: 1,
            max_args: None,
            params: NUMBER,
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_add,
            volatile: false,
            description: "将所有参数相加",
            syntax: "ADD(number1, number2, ...)",
            example: "ADD(10, 20, 30) 返回 60",
        });

        // SUBTRACT
        self.register(FunctionDef {
            name: "SUBTRACT",
            category: FunctionCategory::Arithmetic,
            min_args: 2,
            max_args: Some(2),
            params: NUMBER,
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_subtract,
            volatile: false,
            description: "用第一个数减去第二个数",
            syntax: "SUBTRACT(number1, number2)",
            example: "SUBTRACT(30, 10) 返回 20",
        });

        // MULTIPLY
        self.register(FunctionDef {
            name: "MULTIPLY",
            category: FunctionCategory::Arithmetic,
            min_args: 2,
            max_args: None,
            params: NUMBER,
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_multiply,
            volatile: false,
            description: "将所有参数相乘",
            syntax: "MULTIPLY(number1, number2, ...)",
            example: "MULTIPLY(2, 3, 4) 返回 24",
        });

        // DIVIDE
        self.register(FunctionDef {
            name: "DIVIDE",
            category: FunctionCategory::Arithmetic,
            min_args: 2,
            max_args: Some(2),
            params: NUMBER,
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_divide,
            volatile: false,
            description: "用第一个数除以第二个数，除数为 0 时报错",
            syntax: "DIVIDE(number1, number2)",
            example: "DIVIDE(10, 2) 返回 5",
        });

        // SUM
        self.register(FunctionDef {
            name: "SUM",
            category: FunctionCategory::Arithmetic,
            min_args: 1,
            max_args: None,
            params: NUMBER,
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_sum,
            volatile: false,
            description: "求和",
            syntax: "SUM(number1, number2, ...)",
            example: "SUM(1, 2, 3, 4) 返回 10",
        });

        // AVERAGE
        self.register(FunctionDef {
            name: "AVERAGE",
            category: FunctionCategory::Arithmetic,
            min_args: 1,
            max_args: None,
            params: NUMBER,
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_average,
            volatile: false,
            description: "计算数值参数的算术平均值，忽略非数值",
            syntax: "AVERAGE(number1, number2, ...)",
            example: "AVERAGE(80, 90, 100) 返回 90",
        });

        // MAX
        self.register(FunctionDef {
            name: "MAX",
            category: FunctionCategory::Arithmetic,
            min_args: 1,
            max_args: None,
            params: NUMBER,
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_max,
            volatile: false,
            description: "返回数值参数中的最大值",
            syntax: "MAX(number1, number2, ...)",
            example: "MAX(3, 9, 4) 返回 9",
        });

        // MIN
        self.register(FunctionDef {
            name: "MIN",
            category: FunctionCategory::Arithmetic,
            min_args: 1,
            max_args: None,
            params: NUMBER,
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_min,
            volatile: false,
            description: "返回数值参数中的最小值",
            syntax: "MIN(number1, number2, ...)",
            example: "MIN(3, 9, 4) 返回 3",
        });

        // COUNT
        self.register(FunctionDef {
            name: "COUNT",
            category: FunctionCategory::Arithmetic,
            min_args: 1,
            max_args: None,
            params: ParamSpec::Uniform(ValueType::Any),
            returns: RETURNS,
            matching_operands: false,
            implementation: math::fn_count,
            volatile: false,
            description: "计算参数中数值的个数",
            syntax: "COUNT(value1, value2, ...)",
            example: "COUNT(1, \"a\", \"2\") 返回 2",
        });
    }

    fn register_logical_functions(&mut self) {
        const BOOLEAN: ParamSpec = ParamSpec::Uniform(ValueType::Boolean);
        const RETURNS: ReturnType = ReturnType::Fixed(ValueType::Boolean);

        // IF
        self.register(FunctionDef {
            name: "IF",
            category: FunctionCategory::Logical,
            min_args: 3,
            max_args: Some(3),
            params: ParamSpec::Positional(&[ValueType::Boolean, ValueType::Any, ValueType::Any]),
            returns: ReturnType::Branches(&[1, 2]),
            matching_operands: false,
            implementation: logical::fn_if,
            volatile: false,
            description: "根据条件返回不同的值",
            syntax: "IF(condition, value_if_true, value_if_false)",
            example: "IF(GT(年龄, 18), \"成年\", \"未成年\")",
        });

        // AND
        self.register(FunctionDef {
            name: "AND",
            category: FunctionCategory::Logical,
            min_args: 1,
            max_args: None,
            params: BOOLEAN,
            returns: RETURNS,
            matching_operands: false,
            implementation: logical::fn_and,
            volatile: false,
            description: "所有参数都为真时返回 true",
            syntax: "AND(logical1, logical2, ...)",
            example: "AND(GT(年龄, 18), LT(年龄, 60))",
        });

        // OR
        self.register(FunctionDef {
            name: "OR",
            category: FunctionCategory::Logical,
            min_args: 1,
            max_args: None,
            params: BOOLEAN,
            returns: RETURNS,
            matching_operands: false,
            implementation: logical::fn_or,
            volatile: false,
            description: "任一参数为真时返回 true",
            syntax: "OR(logical1, logical2, ...)",
            example: "OR(LT(年龄, 18), GT(年龄, 60))",
        });

        // NOT
        self.register(FunctionDef {
            name: "NOT",
            category: FunctionCategory::Logical,
            min_args: 1,
            max_args: Some(1),
            params: BOOLEAN,
            returns: RETURNS,
            matching_operands: false,
            implementation: logical::fn_not,
            volatile: false,
            description: "对逻辑值取反",
            syntax: "NOT(logical)",
            example: "NOT(ISEMPTY(名字))",
        });

        // ISEMPTY
        self.register(FunctionDef {
            name: "ISEMPTY",
            category: FunctionCategory::Logical,
            min_args: 1,
            max_args: Some(1),
            params: ParamSpec::Uniform(ValueType::Any),
            returns: RETURNS,
            matching_operands: false,
            implementation: logical::fn_isempty,
            volatile: false,
            description: "检查值是否为空",
            syntax: "ISEMPTY(value)",
            example: "ISEMPTY(名字) 名字为空时返回 true",
        });
    }

    fn register_comparison_functions(&mut self) {
        const ANY: ParamSpec = ParamSpec::Uniform(ValueType::Any);
        const RETURNS: ReturnType = ReturnType::Fixed(ValueType::Boolean);

        // EQ
        self.register(FunctionDef {
            name: "EQ",
            category: FunctionCategory::Comparison,
            min_args: 2,
            max_args: Some(2),
            params: ANY,
            returns: RETURNS,
            matching_operands: false,
            implementation: comparison::fn_eq,
            volatile: false,
            description: "判断两个值是否相等",
            syntax: "EQ(value1, value2)",
            example: "EQ(职业, \"教师\")",
        });

        // NE
        self.register(FunctionDef {
            name: "NE",
            category: FunctionCategory::Comparison,
            min_args: 2,
            max_args: Some(2),
            params: ANY,
            returns: RETURNS,
            matching_operands: false,
            implementation: comparison::fn_ne,
            volatile: false,
            description: "判断两个值是否不相等",
            syntax: "NE(value1, value2)",
            example: "NE(性别, \"男\")",
        });

        // GT
        self.register(FunctionDef {
            name: "GT",
            category: FunctionCategory::Comparison,
            min_args: 2,
            max_args: Some(2),
            params: ANY,
            returns: RETURNS,
            matching_operands: true,
            implementation: comparison::fn_gt,
            volatile: false,
            description: "第一个值大于第二个值时返回 true",
            syntax: "GT(value1, value2)",
            example: "GT(年龄, 18)",
        });

        // LT
        self.register(FunctionDef {
            name: "LT",
            category: FunctionCategory::Comparison,
            min_args: 2,
            max_args: Some(2),
            params: ANY,
            returns: RETURNS,
            matching_operands: true,
            implementation: comparison::fn_lt,
            volatile: false,
            description: "第一个值小于第二个值时返回 true",
            syntax: "LT(value1, value2)",
            example: "LT(年龄, 60)",
        });

        // GTE
        self.register(FunctionDef {
            name: "GTE",
            category: FunctionCategory::Comparison,
            min_args: 2,
            max_args: Some(2),
            params: ANY,
            returns: RETURNS,
            matching_operands: true,
            implementation: comparison::fn_gte,
            volatile: false,
            description: "第一个值大于或等于第二个值时返回 true",
            syntax: "GTE(value1, value2)",
            example: "GTE(数值, 100)",
        });

        // LTE
        self.register(FunctionDef {
            name: "LTE",
            category: FunctionCategory::Comparison,
            min_args: 2,
            max_args: Some(2),
            params: ANY,
            returns: RETURNS,
            matching_operands: true,
            implementation: comparison::fn_lte,
            volatile: false,
            description: "第一个值小于或等于第二个值时返回 true",
            syntax: "LTE(value1, value2)",
            example: "LTE(数值, 100)",
        });
    }

    fn register_text_functions(&mut self) {
        const TEXT: ParamSpec = ParamSpec::Uniform(ValueType::Text);
        const RETURNS: ReturnType = ReturnType::Fixed(ValueType::Text);

        // CONCATENATE
        self.register(FunctionDef {
            name: "CONCATENATE",
            category: FunctionCategory::Text,
            min_args: 1,
            max_args: None,
            params: ParamSpec::Uniform(ValueType::Any),
            returns: RETURNS,
            matching_operands: false,
            implementation: text::fn_concatenate,
            volatile: false,
            description: "将多个值连接为一个文本，非文本值自动转换",
            syntax: "CONCATENATE(text1, text2, ...)",
            example: "CONCATENATE(\"Hello \", \"World\") 返回 \"Hello World\"",
        });

        // LEN
        self.register(FunctionDef {
            name: "LEN",
            category: FunctionCategory::Text,
            min_args: 1,
            max_args: Some(1),
            params: TEXT,
            returns: ReturnType::Fixed(ValueType::Number),
            matching_operands: false,
            implementation: text::fn_len,
            volatile: false,
            description: "返回文本的字符数",
            syntax: "LEN(text)",
            example: "LEN(\"你好\") 返回 2",
        });

        // LEFT
        self.register(FunctionDef {
            name: "LEFT",
            category: FunctionCategory::Text,
            min_args: 2,
            max_args: Some(2),
            params: ParamSpec::Positional(&[ValueType::Text, ValueType::Number]),
            returns: RETURNS,
            matching_operands: false,
            implementation: text::fn_left,
            volatile: false,
            description: "返回文本开头的若干个字符",
            syntax: "LEFT(text, num_chars)",
            example: "LEFT(\"abcdef\", 2) 返回 \"ab\"",
        });

        // RIGHT
        self.register(FunctionDef {
            name: "RIGHT",
            category: FunctionCategory::Text,
            min_args: 2,
            max_args: Some(2),
            params: ParamSpec::Positional(&[ValueType::Text, ValueType::Number]),
            returns: RETURNS,
            matching_operands: false,
            implementation: text::fn_right,
            volatile: false,
            description: "返回文本末尾的若干个字符",
            syntax: "RIGHT(text, num_chars)",
            example: "RIGHT(\"abcdef\", 2) 返回 \"ef\"",
        });

        // MID
        self.register(FunctionDef {
            name: "MID",
            category: FunctionCategory::Text,
            min_args: 3,
            max_args: Some(3),
            params: ParamSpec::Positional(&[ValueType::Text, ValueType::Number, ValueType::Number]),
            returns: RETURNS,
            matching_operands: false,
            implementation: text::fn_mid,
            volatile: false,
            description: "从指定位置（从 1 开始）返回若干个字符",
            syntax: "MID(text, start_num, num_chars)",
            example: "MID(\"abcdef\", 2, 3) 返回 \"bcd\"",
        });

        // LOWER
        self.register(FunctionDef {
            name: "LOWER",
            category: FunctionCategory::Text,
            min_args: 1,
            max_args: Some(1),
            params: TEXT,
            returns: RETURNS,
            matching_operands: false,
            implementation: text::fn_lower,
            volatile: false,
            description: "将文本转换为小写",
            syntax: "LOWER(text)",
            example: "LOWER(\"ABC\") 返回 \"abc\"",
        });

        // UPPER
        self.register(FunctionDef {
            name: "UPPER",
            category: FunctionCategory::Text,
            min_args: 1,
            max_args: Some(1),
            params: TEXT,
            returns: RETURNS,
            matching_operands: false,
            implementation: text::fn_upper,
            volatile: false,
            description: "将文本转换为大写",
            syntax: "UPPER(text)",
            example: "UPPER(\"abc\") 返回 \"ABC\"",
        });

        // TRIM
        self.register(FunctionDef {
            name: "TRIM",
            category: FunctionCategory::Text,
            min_args: 1,
            max_args: Some(1),
            params: TEXT,
            returns: RETURNS,
            matching_operands: false,
            implementation: text::fn_trim,
            volatile: false,
            description: "去除文本首尾的空白",
            syntax: "TRIM(text)",
            example: "TRIM(\"  abc \") 返回 \"abc\"",
        });
    }

    fn register_date_functions(&mut self) {
        const DATE: ParamSpec = ParamSpec::Uniform(ValueType::Date);

        // TODAY (volatile)
        self.register(FunctionDef {
            name: "TODAY",
            category: FunctionCategory::Date,
            min_args: 0,
            max_args: Some(0),
            params: ParamSpec::Uniform(ValueType::Any),
            returns: ReturnType::Fixed(ValueType::Date),
            matching_operands: false,
            implementation: date::fn_today,
            volatile: true,
            description: "返回当前日期",
            syntax: "TODAY()",
            example: "TODAY()",
        });

        // NOW (volatile)
        self.register(FunctionDef {
            name: "NOW",
            category: FunctionCategory::Date,
            min_args: 0,
            max_args: Some(0),
            params: ParamSpec::Uniform(ValueType::Any),
            returns: ReturnType::Fixed(ValueType::Date),
            matching_operands: false,
            implementation: date::fn_now,
            volatile: true,
            description: "返回当前日期和时间",
            syntax: "NOW()",
            example: "NOW()",
        });

        // YEAR
        self.register(FunctionDef {
            name: "YEAR",
            category: FunctionCategory::Date,
            min_args: 1,
            max_args: Some(1),
            params: DATE,
            returns: ReturnType::Fixed(ValueType::Number),
            matching_operands: false,
            implementation: date::fn_year,
            volatile: false,
            description: "返回日期的年份",
            syntax: "YEAR(date)",
            example: "YEAR(创建时间)",
        });

        // MONTH
        self.register(FunctionDef {
            name: "MONTH",
            category: FunctionCategory::Date,
            min_args: 1,
            max_args: Some(1),
            params: DATE,
            returns: ReturnType::Fixed(ValueType::Number),
            matching_operands: false,
            implementation: date::fn_month,
            volatile: false,
            description: "返回日期的月份（1-12）",
            syntax: "MONTH(date)",
            example: "MONTH(创建时间)",
        });

        // DAY
        self.register(FunctionDef {
            name: "DAY",
            category: FunctionCategory::Date,
            min_args: 1,
            max_args: Some(1),
            params: DATE,
            returns: ReturnType::Fixed(ValueType::Number),
            matching_operands: false,
            implementation: date::fn_day,
            volatile: false,
            description: "返回日期是当月的第几天",
            syntax: "DAY(date)",
            example: "DAY(创建时间)",
        });

        // DATE
        self.register(FunctionDef {
            name: "DATE",
            category: FunctionCategory::Date,
            min_args: 3,
            max_args: Some(3),
            params: ParamSpec::Uniform(ValueType::Number),
            returns: ReturnType::Fixed(ValueType::Date),
            matching_operands: false,
            implementation: date::fn_date,
            volatile: false,
            description: "由年、月、日构造日期",
            syntax: "DATE(year, month, day)",
            example: "DATE(2024, 1, 31)",
        });
    }
}

/// Flatten list arguments one level, so `SUM(分数列表)` sums the items
pub(crate) fn flatten_args(args: &[Value]) -> impl Iterator<Item = &Value> {
    args.iter().flat_map(|arg| match arg {
        Value::List(items) => items.iter(),
        other => std::slice::from_ref(other).iter(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert_eq!(registry.lookup("add").unwrap().name, "ADD");
        assert_eq!(registry.lookup("Concatenate").unwrap().name, "CONCATENATE");
        assert!(registry.lookup("UNKNOWNFN").is_none());
    }

    #[test]
    fn test_arity_bounds_are_consistent() {
        let registry = FunctionRegistry::new();
        for def in registry.all() {
            if let Some(max) = def.max_args {
                assert!(def.min_args <= max, "{}", def.name);
            }
        }
        let sub = registry.lookup("SUBTRACT").unwrap();
        assert!(sub.accepts_arg_count(2));
        assert!(!sub.accepts_arg_count(3));
        assert_eq!(sub.arity_label(), "2");
        assert_eq!(registry.lookup("ADD").unwrap().arity_label(), "at least 1");
    }

    #[test]
    fn test_all_is_sorted() {
        let registry = FunctionRegistry::new();
        let names: Vec<&str> = registry.all().iter().map(|d| d.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn test_by_category() {
        let registry = FunctionRegistry::new();
        let groups = registry.by_category();
        let comparison: Vec<&str> = groups[&FunctionCategory::Comparison]
            .iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(comparison, vec!["EQ", "GT", "GTE", "LT", "LTE", "NE"]);
        assert_eq!(groups.len(), FunctionCategory::ALL.len());
    }

    #[test]
    fn test_names_longest_first() {
        let registry = FunctionRegistry::new();
        let names = registry.names_longest_first();
        assert_eq!(names[0], "CONCATENATE");
        let gte = names.iter().position(|n| *n == "GTE").unwrap();
        let gt = names.iter().position(|n| *n == "GT").unwrap();
        assert!(gte < gt);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Text".parse::<FunctionCategory>(), Ok(FunctionCategory::Text));
        assert!("stats".parse::<FunctionCategory>().is_err());
    }

    #[test]
    fn test_positional_params() {
        let registry = FunctionRegistry::new();
        let if_def = registry.lookup("IF").unwrap();
        assert_eq!(if_def.params.type_at(0), ValueType::Boolean);
        assert_eq!(if_def.params.type_at(2), ValueType::Any);
        assert_eq!(if_def.params.type_at(7), ValueType::Any);
    }
}
