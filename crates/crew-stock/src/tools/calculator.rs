//! Arithmetic tool so agents don't compute ratios and growth rates in their head

use crate::error::{Result, StockError};
use crate::tools::parse_params;
use async_trait::async_trait;
use crew_tools::Tool;
use serde::Deserialize;
use serde_json::{Value, json};
use std::iter::Peekable;
use std::str::Chars;

/// Evaluates arithmetic expressions such as `(227.5 - 200) / 200 * 100`
#[derive(Debug, Default)]
pub struct CalculatorTool;

#[derive(Debug, Deserialize)]
struct CalculatorParams {
    expression: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Open,
    Close,
}

fn invalid(msg: impl Into<String>) -> StockError {
    StockError::InvalidInput(msg.into())
}

fn number(first: char, chars: &mut Peekable<Chars<'_>>) -> Result<f64> {
    let mut digits = String::from(first);
    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' | '.' => digits.push(c),
            // Thousands separators: 1,250,000
            ',' | '_' => {}
            _ => break,
        }
        chars.next();
    }
    digits
        .parse()
        .map_err(|_| invalid(format!("bad number '{digits}'")))
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            c if c.is_whitespace() || c == '$' => continue,
            '0'..='9' | '.' => Token::Number(number(c, &mut chars)?),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                Token::Caret
            }
            '*' | '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '(' => Token::Open,
            ')' => Token::Close,
            other => return Err(invalid(format!("unexpected character '{other}'"))),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Recursive descent over the token list
///
/// ```text
/// expr   = term (("+" | "-") term)*
/// term   = unary (("*" | "/" | "%") unary)*
/// unary  = ("-" | "+") unary | power
/// power  = atom ("^" unary)?
/// atom   = number | "(" expr ")"
/// ```
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.bump();
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            self.bump();
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return Err(invalid("division by zero")),
                Token::Slash => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.bump();
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.bump();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Caret) {
            self.bump();
            return Ok(base.powf(self.unary()?));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(invalid("missing ')'")),
                }
            }
            Some(token) => Err(invalid(format!("unexpected {token:?}"))),
            None => Err(invalid("unexpected end of expression")),
        }
    }
}

/// Evaluate an arithmetic expression
///
/// Supports `+ - * / % ^` (also `**`), parentheses, unary signs and
/// decimals. `$` signs and thousands separators are ignored.
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(invalid("expression is empty"));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(invalid(format!("unexpected {token:?} after a complete expression")));
    }
    if !value.is_finite() {
        return Err(invalid("result is not a finite number"));
    }
    Ok(value)
}

#[async_trait]
impl Tool for CalculatorTool {
    async fn execute(&self, params: Value) -> crew_core::Result<Value> {
        let params: CalculatorParams = parse_params(self.name(), params)?;
        let result = evaluate(&params.expression)?;
        Ok(json!({ "expression": params.expression, "result": result }))
    }

    fn name(&self) -> &'static str {
        "calculate"
    }

    fn description(&self) -> &'static str {
        "Evaluate a mathematical expression such as '200*7' or '(227.5 - 200) / 200 * 100'. \
         Use it for ratios, growth rates and any other arithmetic."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic using + - * / % ^ and parentheses"
                }
            },
            "required": ["expression"]
        })
    }
}
