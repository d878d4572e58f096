//! Arithmetic expression evaluator for the calculator tool.
//!
//! A dedicated tokenizer and recursive-descent parser over `+ - * / ( )`
//! and numeric literals. Nothing here evaluates code of any kind, so the
//! tool has no injection surface at all.
//!
//! Every failure mode (invalid characters, parse errors, division by zero)
//! is reported as an error string; nothing panics and no error escapes to
//! the agent loop.

const ALLOWED_CHARS: &str = "0123456789+-*/(). ";

/// Tool-facing entry point: always returns a human-readable string.
pub fn evaluate_expression(expr: &str) -> String {
    if expr.trim().is_empty() {
        return "Error: empty expression.".to_string();
    }

    if let Some(bad) = expr.chars().find(|c| !ALLOWED_CHARS.contains(*c)) {
        return format!(
            "Error: expression contains invalid character '{bad}'; only digits, + - * / ( ) . and spaces are allowed."
        );
    }

    match evaluate(expr) {
        Ok(value) => format!("The result of '{}' is {}.", expr, format_number(value)),
        Err(reason) => format!("Error: could not evaluate '{expr}': {reason}"),
    }
}

/// Evaluate a pre-validated expression.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err("unexpected trailing input".to_string());
    }
    Ok(value)
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => {
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value: f64 = literal
                    .parse()
                    .map_err(|_| format!("invalid number literal '{literal}'"))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser.
///
/// Grammar:
/// ```text
/// expr    := term  { ('+' | '-') term }
/// term    := unary { ('*' | '/') unary }
/// unary   := ('+' | '-') unary | primary
/// primary := NUMBER | '(' expr ')'
/// ```
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64, String> {
        let mut value = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.parse_unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let divisor = self.parse_unary()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.parse_unary()?)
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<f64, String> {
        match self.advance() {
            Some(Token::Number(v)) => Ok(v),
            Some(Token::LParen) => {
                let value = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
