//! Minimal expression evaluator used by the headless widget.
//!
//! Supports numbers, string literals, `true` / `false` / `null`, the unary
//! operators `-` and `!`, the binary operators `+ - * / %`, parentheses, and
//! the page properties `document.title`, `document.URL`, `location.href` and
//! `window.location.href`. Anything else is a syntax or reference error.

use serde_json::{Number, Value};

use crate::{Error, Result};

/// Page state visible to scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageContext<'a> {
    pub title: &'a str,
    pub url: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Op(char),
    Dot,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Path(Vec<String>),
    Unary(char, Box<Expr>),
    Binary(char, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Js {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Js {
    fn to_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Null => 0.0,
            Self::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Null => false,
        }
    }

    fn to_display(&self) -> String {
        match self {
            Self::Number(n) => format_number(*n),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Number(n) => number_value(n),
            Self::Str(s) => Value::String(s),
            Self::Bool(b) => Value::Bool(b),
            Self::Null => Value::Null,
        }
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0
}

#[allow(clippy::cast_possible_truncation)]
fn number_value(n: f64) -> Value {
    if is_integral(n) {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if is_integral(n) {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

fn syntax_error(detail: impl std::fmt::Display) -> Error {
    Error::ScriptEvaluation(format!("SyntaxError: {detail}"))
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == ';' => {
                chars.next();
            }
            '0'..='9' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = literal
                    .parse()
                    .map_err(|_| syntax_error(format!("invalid number {literal}")))?;
                tokens.push(Token::Number(n));
            }
            '"' | '\'' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == c => break,
                        Some('\\') => match chars.next() {
                            Some('n') => literal.push('\n'),
                            Some('t') => literal.push('\t'),
                            Some(other) => literal.push(other),
                            None => return Err(syntax_error("unterminated string")),
                        },
                        Some(ch) => literal.push(ch),
                        None => return Err(syntax_error("unterminated string")),
                    }
                }
                tokens.push(Token::Str(literal));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '$' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '+' | '-' | '*' | '/' | '%' | '!' => {
                chars.next();
                tokens.push(Token::Op(c));
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            other => return Err(syntax_error(format!("unexpected character '{other}'"))),
        }
    }

    Ok(tokens)
}

/// Deepest expression tree a script may build. Bounds the recursion of both
/// the parser and the evaluator.
const MAX_DEPTH: usize = 256;

/// Depth of a node one level above a child of depth `depth`.
fn nest(depth: usize) -> Result<usize> {
    if depth >= MAX_DEPTH {
        return Err(syntax_error("expression too deeply nested"));
    }
    Ok(depth + 1)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Open parentheses around the current position.
    open: usize,
}

/// A parsed subtree and its depth.
type Parsed = (Expr, usize);

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            open: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> Result<Parsed> {
        let (mut lhs, mut depth) = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let (rhs, rhs_depth) = self.term()?;
            depth = nest(depth.max(rhs_depth))?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, depth))
    }

    fn term(&mut self) -> Result<Parsed> {
        let (mut lhs, mut depth) = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let (rhs, rhs_depth) = self.unary()?;
            depth = nest(depth.max(rhs_depth))?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, depth))
    }

    fn unary(&mut self) -> Result<Parsed> {
        let mut ops = Vec::new();
        while let Some(Token::Op(op @ ('-' | '+' | '!'))) = self.peek() {
            if ops.len() >= MAX_DEPTH {
                return Err(syntax_error("expression too deeply nested"));
            }
            ops.push(*op);
            self.pos += 1;
        }

        let (mut expr, mut depth) = self.primary()?;
        for op in ops.into_iter().rev() {
            depth = nest(depth)?;
            expr = Expr::Unary(op, Box::new(expr));
        }
        Ok((expr, depth))
    }

    fn primary(&mut self) -> Result<Parsed> {
        let expr = match self.next() {
            Some(Token::Number(n)) => Expr::Number(n),
            Some(Token::Str(s)) => Expr::Str(s),
            Some(Token::LParen) => {
                if self.open >= MAX_DEPTH {
                    return Err(syntax_error("expression too deeply nested"));
                }
                self.open += 1;
                let inner = self.expression();
                self.open -= 1;
                let inner = inner?;
                return match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(syntax_error("expected ')'")),
                };
            }
            Some(Token::Ident(ident)) => match ident.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" | "undefined" => Expr::Null,
                _ => {
                    let mut path = vec![ident];
                    while self.peek() == Some(&Token::Dot) {
                        self.pos += 1;
                        match self.next() {
                            Some(Token::Ident(member)) => path.push(member),
                            _ => return Err(syntax_error("expected property name")),
                        }
                    }
                    Expr::Path(path)
                }
            },
            Some(token) => return Err(syntax_error(format!("unexpected token {token:?}"))),
            None => return Err(syntax_error("unexpected end of script")),
        };
        Ok((expr, 1))
    }
}

fn eval(expr: &Expr, page: &PageContext<'_>) -> Result<Js> {
    Ok(match expr {
        Expr::Number(n) => Js::Number(*n),
        Expr::Str(s) => Js::Str(s.clone()),
        Expr::Bool(b) => Js::Bool(*b),
        Expr::Null => Js::Null,
        Expr::Path(path) => {
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            match path.as_slice() {
                ["document", "title"] => Js::Str(page.title.to_string()),
                ["document", "URL"]
                | ["location", "href"]
                | ["window", "location", "href"]
                | ["document", "location", "href"] => Js::Str(page.url.to_string()),
                [root, ..] => {
                    return Err(Error::ScriptEvaluation(format!(
                        "ReferenceError: {root} is not defined"
                    )))
                }
                [] => Js::Null,
            }
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, page)?;
            match *op {
                '-' => Js::Number(-value.to_number()),
                '!' => Js::Bool(!value.truthy()),
                _ => Js::Number(value.to_number()),
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, page)?;
            let rhs = eval(rhs, page)?;
            match (*op, &lhs, &rhs) {
                ('+', Js::Str(_), _) | ('+', _, Js::Str(_)) => {
                    Js::Str(format!("{}{}", lhs.to_display(), rhs.to_display()))
                }
                ('+', ..) => Js::Number(lhs.to_number() + rhs.to_number()),
                ('-', ..) => Js::Number(lhs.to_number() - rhs.to_number()),
                ('*', ..) => Js::Number(lhs.to_number() * rhs.to_number()),
                ('/', ..) => Js::Number(lhs.to_number() / rhs.to_number()),
                _ => Js::Number(lhs.to_number() % rhs.to_number()),
            }
        }
    })
}

/// Evaluate `source` against `page`.
///
/// An empty script evaluates to `null`.
///
/// # Errors
/// Returns `Error::ScriptEvaluation` for syntax and reference errors.
pub fn evaluate(source: &str, page: &PageContext<'_>) -> Result<Value> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Ok(Value::Null);
    }

    let mut parser = Parser::new(tokens);
    let (expr, _) = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(syntax_error(format!("unexpected token {token:?}")));
    }

    Ok(eval(&expr, page)?.into_value())
}
