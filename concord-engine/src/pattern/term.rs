//! Pattern fields: literal, variable, or wildcard.

use crate::types::{Value, Var};
use std::fmt;

/// One field of a [`super::Pattern`]
///
/// The variant is fixed when the sync rule is declared, so the matcher
/// never has to inspect a value to find out what kind of field it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Must equal the concrete value exactly
    Literal(Value),
    /// Binds on first occurrence, must unify afterwards
    Var(Var),
    /// Matches anything (including an absent field) and binds nothing
    Wildcard,
}

impl Term {
    pub fn literal(value: impl Into<Value>) -> Self {
        Term::Literal(value.into())
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Term::Var(var) => Some(var),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Literal(value) => write!(f, "{}", value),
            Term::Var(var) => write!(f, "{}", var),
            Term::Wildcard => write!(f, "_"),
        }
    }
}

impl From<Var> for Term {
    fn from(var: Var) -> Self {
        Term::Var(var)
    }
}

impl From<&Var> for Term {
    fn from(var: &Var) -> Self {
        Term::Var(var.clone())
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Literal(value)
    }
}

impl From<&str> for Term {
    fn from(text: &str) -> Self {
        Term::Literal(Value::String(text.to_string()))
    }
}

impl From<String> for Term {
    fn from(text: String) -> Self {
        Term::Literal(Value::String(text))
    }
}

impl From<i64> for Term {
    fn from(n: i64) -> Self {
        Term::Literal(Value::from(n))
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Literal(Value::Bool(b))
    }
}
