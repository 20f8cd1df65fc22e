//! Record patterns for matching and building concept method records.
//!
//! A [`Pattern`] is an ordered list of named fields, each a [`Term`]. The
//! same pattern type serves three purposes:
//! - recognising completed invocations in a `when` clause
//! - unifying query results in a `where` stage
//! - building concrete argument records for `then` invocations

mod term;

pub use term::Term;

use crate::frames::Frame;
use crate::runtime::EngineError;
use crate::types::{Record, Var};
use std::fmt;

/// The field that marks an output record as the error variant.
pub const ERROR_FIELD: &str = "error";

/// A record pattern
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    fields: Vec<(String, Term)>,
}

impl Pattern {
    /// The empty pattern, which matches any record
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field
    pub fn field(mut self, name: impl Into<String>, term: impl Into<Term>) -> Self {
        let name = name.into();
        let term = term.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = term,
            None => self.fields.push((name, term)),
        }
        self
    }

    /// Add an explicit wildcard field
    pub fn any(self, name: impl Into<String>) -> Self {
        self.field(name, Term::Wildcard)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.fields.iter().map(|(name, term)| (name.as_str(), term))
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, term)| term)
    }

    pub fn mentions(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Variables referenced by this pattern, in field order
    pub fn variables(&self) -> impl Iterator<Item = &Var> {
        self.fields.iter().filter_map(|(_, term)| term.as_var())
    }

    /// Match a concrete record, extending the bindings of `frame`
    ///
    /// Literal fields must be present and equal. Variable fields must be
    /// present; they bind when unbound and must compare equal when already
    /// bound. Wildcards and fields absent from the pattern are ignored.
    /// A contradiction yields `None`, never an error.
    pub fn match_record(&self, record: &Record, frame: &Frame) -> Option<Frame> {
        let mut next = frame.clone();
        for (name, term) in &self.fields {
            match term {
                Term::Wildcard => {}
                Term::Literal(expected) => {
                    if record.get(name) != Some(expected) {
                        return None;
                    }
                }
                Term::Var(var) => {
                    let value = record.get(name)?;
                    if !next.bind(var.clone(), value.clone()) {
                        return None;
                    }
                }
            }
        }
        Some(next)
    }

    /// Match an action's output record
    ///
    /// Error-shaped outputs only match patterns that mention the `error`
    /// field, so success routes (including an empty `{}` pattern) stay
    /// silent when the action failed.
    pub fn match_output(&self, output: &Record, frame: &Frame) -> Option<Frame> {
        if output.contains_key(ERROR_FIELD) && !self.mentions(ERROR_FIELD) {
            return None;
        }
        self.match_record(output, frame)
    }

    /// Build a concrete record by substituting the frame's bindings
    ///
    /// Wildcard fields are omitted. An unbound variable is a defect in the
    /// sync rule and is reported as [`EngineError::UnboundVariable`].
    pub fn substitute(&self, frame: &Frame) -> Result<Record, EngineError> {
        let mut record = Record::new();
        for (name, term) in &self.fields {
            match term {
                Term::Wildcard => {}
                Term::Literal(value) => {
                    record.insert(name.clone(), value.clone());
                }
                Term::Var(var) => {
                    let value = frame.get(var).ok_or_else(|| EngineError::UnboundVariable {
                        variable: var.to_string(),
                        field: name.clone(),
                    })?;
                    record.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(record)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, term)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, term)?;
        }
        write!(f, "}}")
    }
}

/// Build a [`Pattern`] from `field => term` pairs.
///
/// ```
/// use concord_engine::{pattern, Var};
///
/// let user = Var::new("user");
/// let p = pattern! { "path" => "/Wishlist/_getPlaces", "user" => &user };
/// assert_eq!(p.variables().count(), 1);
/// ```
#[macro_export]
macro_rules! pattern {
    () => {
        $crate::pattern::Pattern::new()
    };
    ($($name:expr => $term:expr),+ $(,)?) => {
        $crate::pattern::Pattern::new()$(.field($name, $term))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn test_literal_and_variable_fields() {
        let username = Var::new("username");
        let pattern = Pattern::new()
            .field("path", "/UserAuthentication/authenticate")
            .field("username", &username);

        let rec = record(json!({
            "path": "/UserAuthentication/authenticate",
            "username": "alice",
            "password": "pw1"
        }));
        let frame = pattern
            .match_record(&rec, &Frame::new())
            .expect("pattern matches");
        assert_eq!(frame.get(&username), Some(&json!("alice")));

        let other = record(json!({ "path": "/Posting/create", "username": "alice" }));
        assert!(pattern.match_record(&other, &Frame::new()).is_none());
    }

    #[test]
    fn test_repeated_variable_must_unify() {
        let x = Var::new("x");
        let pattern = Pattern::new().field("a", &x).field("b", &x);

        assert!(pattern
            .match_record(&record(json!({ "a": 1, "b": 1 })), &Frame::new())
            .is_some());
        assert!(pattern
            .match_record(&record(json!({ "a": 1, "b": 2 })), &Frame::new())
            .is_none());
    }

    #[test]
    fn test_missing_field_fails_variable_but_not_wildcard() {
        let x = Var::new("x");
        let rec = record(json!({ "a": 1 }));
        assert!(Pattern::new()
            .field("b", &x)
            .match_record(&rec, &Frame::new())
            .is_none());
        assert!(Pattern::new()
            .any("b")
            .match_record(&rec, &Frame::new())
            .is_some());
    }

    #[test]
    fn test_error_output_needs_error_field() {
        let failed = record(json!({ "error": "bad password" }));
        assert!(Pattern::new().match_output(&failed, &Frame::new()).is_none());

        let error = Var::new("error");
        let frame = Pattern::new()
            .field("error", &error)
            .match_output(&failed, &Frame::new())
            .expect("error route matches");
        assert_eq!(frame.get(&error), Some(&json!("bad password")));

        assert!(Pattern::new()
            .match_output(&Record::new(), &Frame::new())
            .is_some());
    }

    #[test]
    fn test_substitute_reports_unbound_variable() {
        let user = Var::new("user");
        let pattern = pattern! { "user" => &user, "kind" => "place" };

        let err = pattern.substitute(&Frame::new()).unwrap_err();
        assert!(matches!(err, EngineError::UnboundVariable { ref field, .. } if field == "user"));

        let frame = Frame::new().with(user, json!("u1")).expect("fresh binding");
        let built = pattern.substitute(&frame).expect("all bound");
        assert_eq!(serde_json::Value::Object(built), json!({ "user": "u1", "kind": "place" }));
    }

    #[test]
    fn test_field_replaces_existing_entry() {
        let pattern = Pattern::new().field("a", 1i64).field("a", 2i64);
        assert_eq!(pattern.fields().count(), 1);
        assert_eq!(pattern.get("a"), Some(&Term::literal(2)));
        assert_eq!(pattern.to_string(), "{a: 2}");
    }
}
