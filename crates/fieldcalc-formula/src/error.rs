//! Formula error types
//!
//! Three classes, one per pipeline stage. Messages are user-facing and
//! rendered in the display language of the editor.

use fieldcalc_core::ValueType;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Malformed syntax. Positions are 0-based character offsets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("公式不能为空")]
    Empty,

    #[error("意外的字符 \"{found}\" 在位置 {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("公式意外结束，位置 {position}")]
    UnexpectedEnd { position: usize },

    #[error("预期是逗号或右括号，但在位置 {position} 发现了 \"{found}\"")]
    ExpectedCommaOrParen { found: char, position: usize },

    #[error("无效的数字格式 \"{text}\" 在位置 {position}")]
    InvalidNumber { text: String, position: usize },

    #[error("未闭合的字符串，缺少结束引号（起始位置 {position}）")]
    UnterminatedString { position: usize },

    #[error("连续的逗号表示空参数，位置 {position}")]
    EmptyArgument { position: usize },

    #[error("解析结束后仍有额外的字符在位置 {position}")]
    TrailingInput { position: usize },

    #[error("函数嵌套层数超过 {max} 层，位置 {position}")]
    TooDeep { max: usize, position: usize },
}

impl ParseError {
    /// Character offset the error points at, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Empty => None,
            ParseError::UnexpectedChar { position, .. }
            | ParseError::UnexpectedEnd { position }
            | ParseError::ExpectedCommaOrParen { position, .. }
            | ParseError::InvalidNumber { position, .. }
            | ParseError::UnterminatedString { position }
            | ParseError::EmptyArgument { position }
            | ParseError::TrailingInput { position }
            | ParseError::TooDeep { position, .. } => Some(*position),
        }
    }
}

/// Which side of a parenthesis imbalance is in excess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenExcess {
    Opening,
    Closing,
}

impl std::fmt::Display for ParenExcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParenExcess::Opening => f.write_str("左括号过多"),
            ParenExcess::Closing => f.write_str("右括号过多"),
        }
    }
}

/// A formula that parses but is not acceptable. Argument positions are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("公式不能为空")]
    Empty,

    #[error("括号不匹配，{excess}")]
    UnbalancedParens { excess: ParenExcess, position: usize },

    #[error("公式格式错误: 必须以函数名开头")]
    MissingFunction,

    #[error("公式格式错误: 未知函数 \"{name}\"")]
    UnknownFunction { name: String },

    #[error("公式格式错误: {0}")]
    Syntax(#[from] ParseError),

    #[error("函数 {function} 至少需要 {min} 个参数，但只提供了 {actual} 个")]
    TooFewArguments {
        function: String,
        min: usize,
        actual: usize,
    },

    #[error("函数 {function} 最多接受 {max} 个参数，但提供了 {actual} 个")]
    TooManyArguments {
        function: String,
        max: usize,
        actual: usize,
    },

    #[error("函数 {function} 的第 {position} 个参数必须是 {expected} 类型，但提供的是 {actual} 类型")]
    TypeMismatch {
        function: String,
        position: usize,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("函数 {function} 的参数类型必须匹配，但提供的是 {left} 和 {right}")]
    ComparisonMismatch {
        function: String,
        left: ValueType,
        right: ValueType,
    },

    #[error("函数 {function} 的参数 \"{parameter}\" 无法识别")]
    UnrecognizedParameter {
        function: String,
        position: usize,
        parameter: String,
    },
}

/// A runtime fault while evaluating one formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("未定义的变量: {name}")]
    UndefinedVariable { name: String },

    #[error("除数不能为零")]
    DivisionByZero,

    #[error("不支持的函数: {name}")]
    UnknownFunction { name: String },

    #[error("函数 {function} 需要 {expected} 个参数，但提供了 {actual} 个")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function} 函数的参数必须是{expected}，但接收到了 {actual}")]
    Type {
        function: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{function} 函数参数不是有效日期")]
    InvalidDate { function: String },
}

/// Any error from parsing, validating or evaluating a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Eval(#[from] EvalError),
}

impl FormulaError {
    /// Render as a marker-prefixed string for display surfaces
    pub fn render(&self, marker: &str) -> String {
        format!("{}{}", marker, self)
    }
}
