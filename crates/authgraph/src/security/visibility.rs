//! Visibility expressions.
//!
//! A visibility is a boolean expression over authorization tokens, e.g.
//! `(admin|ops)&pii`. Operators `&` and `|` may not be mixed at one nesting level
//! without parentheses. The empty expression is readable by everyone.

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Access label attached to elements, properties, metadata and markers.
///
/// Equality, ordering and hashing are structural on the expression string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Visibility(String);

impl Visibility {
    /// Create a visibility without validating the expression.
    ///
    /// Malformed expressions are treated as unreadable when evaluated.
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    /// Parse and validate a visibility expression.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidVisibility`] if the expression is malformed.
    pub fn parse(expression: impl Into<String>) -> Result<Self> {
        let expression = expression.into();
        VisibilityExpr::parse(&expression)?;
        Ok(Self(expression))
    }

    /// The empty visibility, readable by every caller.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Raw expression string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the empty expression.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Combine two visibilities into one requiring both.
    pub fn and(&self, other: &Visibility) -> Visibility {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other.clone(),
            (_, true) => self.clone(),
            _ if self == other => self.clone(),
            _ => Visibility(format!("({})&({})", self.0, other.0)),
        }
    }

    /// Parsed form of this expression.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidVisibility`] if the expression is malformed.
    pub fn expression(&self) -> Result<VisibilityExpr> {
        VisibilityExpr::parse(&self.0)
    }

    /// All tokens mentioned anywhere in the expression.
    pub fn tokens(&self) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        if let Ok(expr) = self.expression() {
            expr.collect_tokens(&mut tokens);
        }
        tokens
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Visibility {
    fn from(value: &str) -> Self {
        Visibility::new(value)
    }
}

impl From<String> for Visibility {
    fn from(value: String) -> Self {
        Visibility::new(value)
    }
}

/// Parsed visibility expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityExpr {
    /// Matches every authorization set.
    Empty,
    /// A single required token.
    Token(String),
    /// Every child must match.
    And(Vec<VisibilityExpr>),
    /// At least one child must match.
    Or(Vec<VisibilityExpr>),
}

impl VisibilityExpr {
    /// Parse an expression string.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidVisibility`] describing the first syntax error.
    pub fn parse(expression: &str) -> Result<Self> {
        if expression.trim().is_empty() {
            return Ok(VisibilityExpr::Empty);
        }
        let mut parser = Parser {
            input: expression.as_bytes(),
            pos: 0,
            expression,
        };
        let expr = parser.parse_expr()?;
        parser.skip_whitespace();
        if parser.pos != parser.input.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    /// Evaluate the expression against a token predicate.
    pub fn evaluate(&self, has_token: &dyn Fn(&str) -> bool) -> bool {
        match self {
            VisibilityExpr::Empty => true,
            VisibilityExpr::Token(token) => has_token(token),
            VisibilityExpr::And(children) => children.iter().all(|c| c.evaluate(has_token)),
            VisibilityExpr::Or(children) => children.iter().any(|c| c.evaluate(has_token)),
        }
    }

    fn collect_tokens(&self, out: &mut BTreeSet<String>) {
        match self {
            VisibilityExpr::Empty => {}
            VisibilityExpr::Token(token) => {
                out.insert(token.clone());
            }
            VisibilityExpr::And(children) | VisibilityExpr::Or(children) => {
                for child in children {
                    child.collect_tokens(out);
                }
            }
        }
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    expression: &'a str,
}

impl<'a> Parser<'a> {
    fn parse_expr(&mut self) -> Result<VisibilityExpr> {
        let first = self.parse_term()?;
        let mut children = vec![first];
        let mut operator: Option<u8> = None;

        loop {
            self.skip_whitespace();
            let Some(&c) = self.input.get(self.pos) else {
                break;
            };
            if c != b'&' && c != b'|' {
                break;
            }
            match operator {
                Some(op) if op != c => {
                    return Err(self.error("cannot mix '&' and '|' without parentheses"));
                }
                _ => operator = Some(c),
            }
            self.pos += 1;
            children.push(self.parse_term()?);
        }

        Ok(match operator {
            None => children.remove(0),
            Some(b'&') => VisibilityExpr::And(children),
            Some(_) => VisibilityExpr::Or(children),
        })
    }

    fn parse_term(&mut self) -> Result<VisibilityExpr> {
        self.skip_whitespace();
        match self.input.get(self.pos) {
            None => Err(self.error("unexpected end of expression")),
            Some(b'(') => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.skip_whitespace();
                if self.input.get(self.pos) != Some(&b')') {
                    return Err(self.error("missing closing parenthesis"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(b'"') => self.parse_quoted(),
            Some(_) => {
                let start = self.pos;
                while let Some(&c) = self.input.get(self.pos) {
                    if is_token_char(c) {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                if start == self.pos {
                    return Err(self.error("expected a token"));
                }
                let token = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                Ok(VisibilityExpr::Token(token))
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<VisibilityExpr> {
        self.pos += 1;
        let mut token = Vec::new();
        loop {
            match self.input.get(self.pos) {
                None => return Err(self.error("unterminated quoted token")),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    match self.input.get(self.pos + 1) {
                        Some(&c) if c == b'"' || c == b'\\' => token.push(c),
                        _ => return Err(self.error("invalid escape in quoted token")),
                    }
                    self.pos += 2;
                }
                Some(&c) => {
                    token.push(c);
                    self.pos += 1;
                }
            }
        }
        if token.is_empty() {
            return Err(self.error("empty quoted token"));
        }
        Ok(VisibilityExpr::Token(
            String::from_utf8_lossy(&token).into_owned(),
        ))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.input.get(self.pos), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> GraphError {
        GraphError::InvalidVisibility {
            expression: self.expression.to_string(),
            message: format!("{message} at offset {}", self.pos),
        }
    }
}

fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b':' | b'.' | b'/')
}
