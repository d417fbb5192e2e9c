//! Authorization sets presented by callers.

use super::visibility::Visibility;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The set of access tokens a caller presents on every read and write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Authorizations {
    tokens: BTreeSet<String>,
}

impl Authorizations {
    /// Create an authorization set from tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// An authorization set with no tokens; only empty visibilities are readable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decide whether an element or property labelled `visibility` is readable.
    ///
    /// Malformed expressions are never readable.
    pub fn can_read(&self, visibility: &Visibility) -> bool {
        if visibility.is_empty() {
            return true;
        }
        match visibility.expression() {
            Ok(expr) => expr.evaluate(&|token| self.tokens.contains(token)),
            Err(_) => false,
        }
    }

    /// Returns true if the token is granted.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Superset test: every token of `other` is also granted here.
    pub fn contains_all(&self, other: &Authorizations) -> bool {
        other.tokens.is_subset(&self.tokens)
    }

    /// Iterate the granted tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if no tokens are granted.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for Authorizations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", joined.join(","))
    }
}

impl<S: Into<String>> FromIterator<S> for Authorizations {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}
