//! Formula parser
//!
//! A recursive descent parser for prefix-call formulas such as
//! `IF(GT(年龄, 18), "成年", "未成年")`. There are no infix operators: every
//! computation is a function call.

use crate::ast::FormulaExpr;
use crate::error::ParseError;

/// Deepest allowed nesting of function calls
pub const MAX_NESTED_CALLS: usize = 64;

/// Parse a formula string into an AST
///
/// The whole input must be consumed. Function names are upper-cased;
/// variable names keep their spelling.
///
/// # Example
/// ```rust
/// use fieldcalc_formula::parse_formula;
///
/// let ast = parse_formula("ADD(1, 2, 3)").unwrap();
/// assert_eq!(ast.function_name(), Some("ADD"));
/// ```
pub fn parse_formula(formula: &str) -> Result<FormulaExpr, ParseError> {
    if formula.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = FormulaParser::new(formula);
    parser.advance_token()?;
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current_token != Token::Eof {
        return Err(ParseError::TrailingInput {
            position: parser.offset(parser.token_start),
        });
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),

    // Function or variable name
    Identifier(String),

    // Punctuation
    Comma,
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    /// Byte position of the scanner
    pos: usize,
    /// Byte position where `current_token` starts
    token_start: usize,
    current_token: Token,
    /// Function calls currently open
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            token_start: 0,
            current_token: Token::Eof,
            depth: 0,
        }
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> Result<Token, ParseError> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        match c {
            ',' => {
                self.advance();
                return Ok(Token::Comma);
            }
            '(' => {
                self.advance();
                return Ok(Token::LeftParen);
            }
            ')' => {
                self.advance();
                return Ok(Token::RightParen);
            }
            '"' | '\'' => return self.scan_string(c),
            _ => {}
        }

        // Number, optionally negative
        let starts_number = |c: Option<char>| c.map_or(false, |c| c.is_ascii_digit() || c == '.');
        if starts_number(Some(c)) || (c == '-' && starts_number(self.peek_char_at(1))) {
            return self.scan_number();
        }

        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(ParseError::UnexpectedChar {
            found: c,
            position: self.offset(self.pos),
        })
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(ParseError::UnterminatedString {
                        position: self.offset(start),
                    })
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(Token::String(s));
                }
                Some('\\') => {
                    self.advance();
                    let escaped = self.peek_char().ok_or(ParseError::UnterminatedString {
                        position: self.offset(start),
                    })?;
                    s.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    self.advance();
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;

        if self.peek_char() == Some('-') {
            self.advance();
        }
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_digit() || c == '.')
        {
            self.advance();
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(num) if num.is_finite() => Ok(Token::Number(num)),
            _ => Err(ParseError::InvalidNumber {
                text: num_str.to_string(),
                position: self.offset(start),
            }),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else if c == '.'
                && self
                    .peek_char_at(1)
                    .map_or(false, |n| n.is_alphanumeric() || n == '_')
            {
                // Dotted path segment (`user.name`)
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.input[start..self.pos];

        // Boolean literals, unless followed by '(' (then it's a function call)
        if !self.followed_by_paren() {
            if text.eq_ignore_ascii_case("true") {
                return Token::Boolean(true);
            }
            if text.eq_ignore_ascii_case("false") {
                return Token::Boolean(false);
            }
        }

        Token::Identifier(text.to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn followed_by_paren(&self) -> bool {
        self.input[self.pos..].trim_start().starts_with('(')
    }

    /// Convert a byte position into a character offset
    fn offset(&self, byte_pos: usize) -> usize {
        self.input[..byte_pos].chars().count()
    }

    /// The character at the start of the current token
    fn current_char(&self) -> Option<char> {
        self.input[self.token_start..].chars().next()
    }

    fn consume(&mut self) -> Result<Token, ParseError> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn unexpected(&self) -> ParseError {
        let position = self.offset(self.token_start);
        match self.current_char() {
            Some(found) => ParseError::UnexpectedChar { found, position },
            None => ParseError::UnexpectedEnd { position },
        }
    }

    // === Expression parsing ===

    fn parse_expression(&mut self) -> Result<FormulaExpr, ParseError> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok(FormulaExpr::Number(n))
            }

            Token::String(s) => {
                self.consume()?;
                Ok(FormulaExpr::String(s))
            }

            Token::Boolean(b) => {
                self.consume()?;
                Ok(FormulaExpr::Boolean(b))
            }

            Token::Identifier(name) => {
                self.consume()?;
                // Check if it's a function call
                if self.current_token == Token::LeftParen {
                    self.parse_function_call(&name)
                } else {
                    Ok(FormulaExpr::Variable(name))
                }
            }

            Token::Comma | Token::LeftParen | Token::RightParen | Token::Eof => {
                Err(self.unexpected())
            }
        }
    }

    fn parse_function_call(&mut self, name: &str) -> Result<FormulaExpr, ParseError> {
        if self.depth == MAX_NESTED_CALLS {
            return Err(ParseError::TooDeep {
                max: MAX_NESTED_CALLS,
                position: self.offset(self.token_start),
            });
        }
        self.depth += 1;
        let call = self.parse_call_arguments(name);
        self.depth -= 1;
        call
    }

    fn parse_call_arguments(&mut self, name: &str) -> Result<FormulaExpr, ParseError> {
        self.consume()?; // '('

        let mut args = Vec::new();

        if self.current_token == Token::RightParen {
            self.consume()?;
            return Ok(FormulaExpr::call(name, args));
        }

        loop {
            // `f(,x)`, `f(x,,y)` and `f(x,)` leave an argument slot empty
            if matches!(self.current_token, Token::Comma | Token::RightParen) {
                return Err(ParseError::EmptyArgument {
                    position: self.offset(self.token_start),
                });
            }

            args.push(self.parse_expression()?);

            match self.current_token {
                Token::Comma => {
                    self.consume()?;
                }
                Token::RightParen => {
                    self.consume()?;
                    break;
                }
                Token::Eof => {
                    return Err(ParseError::UnexpectedEnd {
                        position: self.offset(self.token_start),
                    })
                }
                _ => {
                    return Err(match self.current_char() {
                        Some(found) => ParseError::ExpectedCommaOrParen {
                            found,
                            position: self.offset(self.token_start),
                        },
                        None => self.unexpected(),
                    })
                }
            }
        }

        Ok(FormulaExpr::call(name, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> FormulaExpr {
        FormulaExpr::Number(n)
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "NOT(".repeat(depth), ")".repeat(depth));

        assert!(parse_formula(&nested(MAX_NESTED_CALLS)).is_ok());
        assert_eq!(
            parse_formula(&nested(MAX_NESTED_CALLS + 1)),
            Err(ParseError::TooDeep {
                max: MAX_NESTED_CALLS,
                position: MAX_NESTED_CALLS * 4 + 3,
            })
        );
        assert!(matches!(
            parse_formula(&nested(20_000)),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("42").unwrap(), num(42.0));
        assert_eq!(parse_formula("3.14").unwrap(), num(3.14));
        assert_eq!(parse_formula(".5").unwrap(), num(0.5));
        assert_eq!(parse_formula("-7").unwrap(), num(-7.0));
    }

    #[test]
    fn test_parse_invalid_number() {
        assert_eq!(
            parse_formula("ADD(1.2.3, 4)"),
            Err(ParseError::InvalidNumber {
                text: "1.2.3".to_string(),
                position: 4
            })
        );
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            parse_formula("\"hello\"").unwrap(),
            FormulaExpr::String("hello".to_string())
        );
        assert_eq!(
            parse_formula("'单引号'").unwrap(),
            FormulaExpr::String("单引号".to_string())
        );
        assert_eq!(
            parse_formula(r#""a\"b\\c\nd\te""#).unwrap(),
            FormulaExpr::String("a\"b\\c\nd\te".to_string())
        );
        assert_eq!(
            parse_formula(r#"'it\'s'"#).unwrap(),
            FormulaExpr::String("it's".to_string())
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            parse_formula("CONCATENATE(\"abc, 1)"),
            Err(ParseError::UnterminatedString { position: 12 })
        );
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_formula("TRUE").unwrap(), FormulaExpr::Boolean(true));
        assert_eq!(parse_formula("false").unwrap(), FormulaExpr::Boolean(false));
        assert_eq!(parse_formula("True").unwrap(), FormulaExpr::Boolean(true));
        // A boolean keyword followed by '(' is a call
        assert_eq!(
            parse_formula("true()").unwrap(),
            FormulaExpr::call("TRUE", vec![])
        );
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(parse_formula("年龄").unwrap(), FormulaExpr::var("年龄"));
        assert_eq!(parse_formula("user.name").unwrap(), FormulaExpr::var("user.name"));
        assert_eq!(parse_formula("_x1").unwrap(), FormulaExpr::var("_x1"));
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_formula("add(1, 2, 3)").unwrap();
        assert_eq!(ast, FormulaExpr::call("ADD", vec![num(1.0), num(2.0), num(3.0)]));

        let ast = parse_formula("  NOW ( ) ").unwrap();
        assert_eq!(ast, FormulaExpr::call("NOW", vec![]));
    }

    #[test]
    fn test_parse_nested_function() {
        let ast =
            parse_formula(r#"IF(GT(x, 10), "大于10", IF(GT(x, 5), "大于5", "小于等于5"))"#).unwrap();
        let inner = FormulaExpr::call(
            "IF",
            vec![
                FormulaExpr::call("GT", vec![FormulaExpr::var("x"), num(5.0)]),
                FormulaExpr::String("大于5".to_string()),
                FormulaExpr::String("小于等于5".to_string()),
            ],
        );
        let expected = FormulaExpr::call(
            "IF",
            vec![
                FormulaExpr::call("GT", vec![FormulaExpr::var("x"), num(10.0)]),
                FormulaExpr::String("大于10".to_string()),
                inner,
            ],
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_longer_name_not_split() {
        let ast = parse_formula("GTE(1, 2)").unwrap();
        assert_eq!(ast.function_name(), Some("GTE"));
    }

    #[test]
    fn test_empty_arguments() {
        assert_eq!(
            parse_formula("ADD(1,,2)"),
            Err(ParseError::EmptyArgument { position: 6 })
        );
        assert_eq!(
            parse_formula("ADD(1,)"),
            Err(ParseError::EmptyArgument { position: 6 })
        );
        assert_eq!(
            parse_formula("ADD(,1)"),
            Err(ParseError::EmptyArgument { position: 4 })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_formula("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_formula("ADD(1, 2"),
            Err(ParseError::UnexpectedEnd { position: 8 })
        );
        assert_eq!(
            parse_formula("ADD(1 2)"),
            Err(ParseError::ExpectedCommaOrParen {
                found: '2',
                position: 6
            })
        );
        assert_eq!(
            parse_formula("ADD(1 + 2)"),
            Err(ParseError::UnexpectedChar {
                found: '+',
                position: 6
            })
        );
        assert_eq!(
            parse_formula("ADD(1))"),
            Err(ParseError::TrailingInput { position: 6 })
        );
    }

    #[test]
    fn test_error_offsets_count_characters() {
        // Multi-byte identifiers must not inflate the reported offset
        assert_eq!(
            parse_formula("ADD(年龄, #)"),
            Err(ParseError::UnexpectedChar {
                found: '#',
                position: 8
            })
        );
    }

    #[test]
    fn test_display_reparses() {
        for text in [
            r#"IF(AND(GT(年龄, 18), NOT(ISEMPTY(名字))), CONCATENATE(名字, "\"ok\""), 'no')"#,
            "DIVIDE(-1.5, .25)",
            "TODAY()",
            "EQ(user.name, TRUE)",
        ] {
            let ast = parse_formula(text).unwrap();
            assert_eq!(parse_formula(&ast.to_string()).unwrap(), ast);
        }
    }
}
