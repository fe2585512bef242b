//! Arithmetic and condition evaluation
//!
//! Input is text that has already had its variables substituted. Supports
//! `+ - * / % ^`, parentheses, comparisons (`= == != < <= > >=`) and boolean
//! operators (`AND OR NOT`, `&& || !`). Bare words compare as text, so
//! `Scientist = Scientist` is a valid condition.

use std::cmp::Ordering;
use std::fmt;

use crate::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for ExprValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprValue::Number(n) => write!(f, "{}", n),
            ExprValue::Bool(true) => write!(f, "TRUE"),
            ExprValue::Bool(false) => write!(f, "FALSE"),
            ExprValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Evaluate `input` to a number
pub fn try_math(input: &str) -> Result<f64, ExprError> {
    match evaluate(input)? {
        ExprValue::Number(n) => Ok(n),
        other => Err(ExprError::new(input, "expected a number").with_partial(other.to_string())),
    }
}

/// Evaluate `input` to a boolean
pub fn try_condition(input: &str) -> Result<bool, ExprError> {
    match evaluate(input)? {
        ExprValue::Bool(b) => Ok(b),
        other => {
            Err(ExprError::new(input, "expected a condition").with_partial(other.to_string()))
        }
    }
}

pub fn evaluate(input: &str) -> Result<ExprValue, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::new(input, "empty expression"));
    }

    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let value = parser.or()?;
    if let Some(token) = parser.peek() {
        return Err(ExprError::new(input, format!("unexpected '{}'", token))
            .with_partial(value.to_string()));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Word(String),
    Op(&'static str),
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Word(w) => write!(f, "{}", w),
            Token::Op(op) => write!(f, "{}", op),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
        }
    }
}

const SYMBOLS: &str = "()+-*/%^=!<>&|";

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, width) = match (c, next) {
            ('(', _) => (Token::Open, 1),
            (')', _) => (Token::Close, 1),
            ('+', _) => (Token::Op("+"), 1),
            ('-', _) => (Token::Op("-"), 1),
            ('*', _) => (Token::Op("*"), 1),
            ('/', _) => (Token::Op("/"), 1),
            ('%', _) => (Token::Op("%"), 1),
            ('^', _) => (Token::Op("^"), 1),
            ('=', Some('=')) => (Token::Op("="), 2),
            ('=', _) => (Token::Op("="), 1),
            ('!', Some('=')) => (Token::Op("!="), 2),
            ('!', _) => (Token::Op("NOT"), 1),
            ('<', Some('=')) => (Token::Op("<="), 2),
            ('<', _) => (Token::Op("<"), 1),
            ('>', Some('=')) => (Token::Op(">="), 2),
            ('>', _) => (Token::Op(">"), 1),
            ('&', Some('&')) => (Token::Op("AND"), 2),
            ('|', Some('|')) => (Token::Op("OR"), 2),
            ('&' | '|', _) => {
                return Err(ExprError::new(input, format!("unexpected '{}'", c)));
            }
            _ => {
                let start = i;
                let mut end = i;
                while end < chars.len() && !chars[end].is_whitespace() && !SYMBOLS.contains(chars[end]) {
                    end += 1;
                }
                let word: String = chars[start..end].iter().collect();
                (word_token(word), end - start)
            }
        };

        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

fn word_token(word: String) -> Token {
    match word.to_ascii_uppercase().as_str() {
        "AND" => Token::Op("AND"),
        "OR" => Token::Op("OR"),
        "NOT" => Token::Op("NOT"),
        _ => match word.parse::<f64>() {
            Ok(n) if n.is_finite() => Token::Number(n),
            _ => Token::Word(word),
        },
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ExprError {
        ExprError::new(self.input, reason)
    }

    fn or(&mut self) -> Result<ExprValue, ExprError> {
        let mut left = self.and()?;
        while self.eat_op(&["OR"]).is_some() {
            let right = self.and()?;
            left = ExprValue::Bool(self.as_bool(&left)? || self.as_bool(&right)?);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<ExprValue, ExprError> {
        let mut left = self.not()?;
        while self.eat_op(&["AND"]).is_some() {
            let right = self.not()?;
            left = ExprValue::Bool(self.as_bool(&left)? && self.as_bool(&right)?);
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<ExprValue, ExprError> {
        if self.eat_op(&["NOT"]).is_some() {
            let value = self.not()?;
            return Ok(ExprValue::Bool(!self.as_bool(&value)?));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<ExprValue, ExprError> {
        let left = self.sum()?;
        let Some(op) = self.eat_op(&["=", "!=", "<", "<=", ">", ">="]) else {
            return Ok(left);
        };
        let right = self.sum()?;

        let result = match (op, &left, &right) {
            ("=", _, _) => values_equal(&left, &right),
            ("!=", _, _) => !values_equal(&left, &right),
            (_, ExprValue::Number(a), ExprValue::Number(b)) => {
                let ordering = a.partial_cmp(b).unwrap_or(Ordering::Equal);
                match op {
                    "<" => ordering == Ordering::Less,
                    "<=" => ordering != Ordering::Greater,
                    ">" => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }
            }
            _ => {
                return Err(self
                    .error(format!("'{}' needs numbers on both sides", op))
                    .with_partial(left.to_string()))
            }
        };
        Ok(ExprValue::Bool(result))
    }

    fn sum(&mut self) -> Result<ExprValue, ExprError> {
        let mut left = self.product()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let right = self.product()?;
            let (a, b) = (self.as_number(&left)?, self.as_number(&right)?);
            left = self.finite(if op == "+" { a + b } else { a - b })?;
        }
        Ok(left)
    }

    fn product(&mut self) -> Result<ExprValue, ExprError> {
        let mut left = self.power()?;
        while let Some(op) = self.eat_op(&["*", "/", "%"]) {
            let right = self.power()?;
            let (a, b) = (self.as_number(&left)?, self.as_number(&right)?);
            if op != "*" && b == 0.0 {
                return Err(self.error("division by zero").with_partial(a.to_string()));
            }
            left = self.finite(match op {
                "*" => a * b,
                "/" => a / b,
                _ => a % b,
            })?;
        }
        Ok(left)
    }

    // Right-associative: 2 ^ 3 ^ 2 = 2 ^ 9
    fn power(&mut self) -> Result<ExprValue, ExprError> {
        let base = self.unary()?;
        if self.eat_op(&["^"]).is_none() {
            return Ok(base);
        }
        let exponent = self.power()?;
        let value = self.as_number(&base)?.powf(self.as_number(&exponent)?);
        self.finite(value)
    }

    fn finite(&self, value: f64) -> Result<ExprValue, ExprError> {
        if value.is_finite() {
            Ok(ExprValue::Number(value))
        } else {
            Err(self.error("result is not a finite number"))
        }
    }

    fn unary(&mut self) -> Result<ExprValue, ExprError> {
        if self.eat_op(&["-"]).is_some() {
            let value = self.unary()?;
            return Ok(ExprValue::Number(-self.as_number(&value)?));
        }
        if self.eat_op(&["+"]).is_some() {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<ExprValue, ExprError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| self.error("unexpected end of expression"))?;
        self.pos += 1;

        match token {
            Token::Number(n) => Ok(ExprValue::Number(n)),
            Token::Word(word) => Ok(match word.to_ascii_uppercase().as_str() {
                "TRUE" => ExprValue::Bool(true),
                "FALSE" => ExprValue::Bool(false),
                _ => ExprValue::Text(word),
            }),
            Token::Open => {
                let value = self.or()?;
                match self.peek() {
                    Some(Token::Close) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err(self.error("missing ')'").with_partial(value.to_string())),
                }
            }
            other => Err(self.error(format!("unexpected '{}'", other))),
        }
    }

    fn as_number(&self, value: &ExprValue) -> Result<f64, ExprError> {
        match value {
            ExprValue::Number(n) => Ok(*n),
            other => Err(self
                .error(format!("'{}' is not a number", other))
                .with_partial(other.to_string())),
        }
    }

    fn as_bool(&self, value: &ExprValue) -> Result<bool, ExprError> {
        match value {
            ExprValue::Bool(b) => Ok(*b),
            other => Err(self
                .error(format!("'{}' is not a condition", other))
                .with_partial(other.to_string())),
        }
    }
}

fn values_equal(left: &ExprValue, right: &ExprValue) -> bool {
    match (left, right) {
        (ExprValue::Number(a), ExprValue::Number(b)) => (a - b).abs() < f64::EPSILON,
        (ExprValue::Bool(a), ExprValue::Bool(b)) => a == b,
        _ => left.to_string() == right.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_precedence() {
        assert_eq!(try_math("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(try_math("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(try_math("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(try_math("10 % 4").unwrap(), 2.0);
        assert_eq!(try_math("-5 + 2").unwrap(), -3.0);
        assert_eq!(try_math("100").unwrap(), 100.0);
    }

    #[test]
    fn test_conditions() {
        assert!(try_condition("3 > 2").unwrap());
        assert!(try_condition("1 = 1 AND NOT 2 < 1").unwrap());
        assert!(try_condition("FALSE || 4 >= 4").unwrap());
        assert!(try_condition("Scientist == Scientist").unwrap());
        assert!(try_condition("ClassD != Scientist").unwrap());
        assert!(!try_condition("!TRUE").unwrap());
    }

    #[test]
    fn test_malformed_expressions() {
        let err = try_math("2 +").unwrap_err();
        assert_eq!(err.formula, "2 +");

        assert!(try_math("1 / 0").is_err());
        assert!(try_math("(1 + 2").is_err());
        assert!(try_math("").is_err());
        assert!(try_condition("Scientist < 3").is_err());
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(try_math("10 ^ 300 * 10 ^ 300").is_err());
        assert!(try_math("10 ^ 308 + 10 ^ 308").is_err());
        assert!(try_math("0 - 10 ^ 308 - 10 ^ 308").is_err());
        assert_eq!(try_math("10 ^ 300 / 10 ^ 300").unwrap(), 1.0);
    }

    #[test]
    fn test_wrong_result_type_carries_partial() {
        let err = try_math("1 < 2").unwrap_err();
        assert_eq!(err.partial.as_deref(), Some("TRUE"));

        let err = try_condition("1 + 2").unwrap_err();
        assert_eq!(err.partial.as_deref(), Some("3"));
    }
}
