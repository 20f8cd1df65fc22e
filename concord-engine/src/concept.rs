//! The capability surface the engine consumes from concepts.
//!
//! A concept is an independently implemented module exposing named
//! actions (mutating, one record in, one outcome out) and queries
//! (read-only, one record in, zero or more records out). Concepts never
//! reference each other; the engine composes them through sync rules.

use crate::pattern::ERROR_FIELD;
use crate::runtime::EngineError;
use crate::types::{FlowId, MethodRef, Record, Value};
use async_trait::async_trait;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result of an action: the success shape or a domain error
///
/// Domain errors are data. They are routed by sync rules that match on
/// the `error` field, never raised as Rust errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Record),
    Error(String),
}

impl Outcome {
    /// Success with no fields
    pub fn empty() -> Self {
        Outcome::Success(Record::new())
    }

    /// Success with a single field
    pub fn with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut record = Record::new();
        record.insert(field.into(), value.into());
        Outcome::Success(record)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    /// The record form sync patterns match against
    pub fn to_record(&self) -> Record {
        match self {
            Outcome::Success(record) => record.clone(),
            Outcome::Error(message) => {
                let mut record = Record::new();
                record.insert(ERROR_FIELD.to_string(), Value::String(message.clone()));
                record
            }
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.to_record()))
    }
}

/// Defects raised while calling a concept
///
/// These are programming errors (unknown method, malformed input), not
/// domain failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConceptError {
    #[error("unknown concept: {0}")]
    UnknownConcept(String),

    #[error("concept {0} is already registered")]
    DuplicateConcept(String),

    #[error("{concept} has no action named {action}")]
    UnknownAction { concept: String, action: String },

    #[error("{concept} has no query named {query}")]
    UnknownQuery { concept: String, query: String },

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("field {field} must be {expected}")]
    InvalidField { field: String, expected: &'static str },

    #[error("concept error: {0}")]
    Custom(String),
}

/// Read a required string field from an input record
pub fn require_str<'a>(input: &'a Record, field: &str) -> Result<&'a str, ConceptError> {
    match input.get(field) {
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(ConceptError::InvalidField {
            field: field.to_string(),
            expected: "a string",
        }),
        None => Err(ConceptError::MissingField(field.to_string())),
    }
}

/// A concept as seen by the engine
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use concord_engine::{Concept, ConceptError, Outcome, Record};
///
/// struct Counter;
///
/// #[async_trait]
/// impl Concept for Counter {
///     fn name(&self) -> &str { "Counter" }
///     fn actions(&self) -> &[&'static str] { &["bump"] }
///     fn queries(&self) -> &[&'static str] { &[] }
///
///     async fn perform(&self, _action: &str, _input: Record) -> Result<Outcome, ConceptError> {
///         Ok(Outcome::empty())
///     }
///
///     async fn query(&self, query: &str, _input: Record) -> Result<Vec<Record>, ConceptError> {
///         Err(ConceptError::UnknownQuery { concept: "Counter".into(), query: query.into() })
///     }
/// }
/// ```
#[async_trait]
pub trait Concept: Send + Sync + 'static {
    /// Concept name used in method references
    fn name(&self) -> &str;

    /// Declared action names
    fn actions(&self) -> &[&'static str];

    /// Declared query names
    fn queries(&self) -> &[&'static str];

    /// Perform an action
    async fn perform(&self, action: &str, input: Record) -> Result<Outcome, ConceptError>;

    /// Run a query
    async fn query(&self, query: &str, input: Record) -> Result<Vec<Record>, ConceptError>;
}

/// Concepts available to one engine, keyed by name
#[derive(Default, Clone)]
pub struct ConceptRegistry {
    concepts: HashMap<String, Arc<dyn Concept>>,
}

impl ConceptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, concept: Arc<dyn Concept>) -> Result<(), ConceptError> {
        let name = concept.name().to_string();
        if self.concepts.contains_key(&name) {
            return Err(ConceptError::DuplicateConcept(name));
        }
        self.concepts.insert(name, concept);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Concept>> {
        self.concepts.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.concepts.keys().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Resolve a method reference to a declared action
    pub fn action(&self, method: &MethodRef) -> Result<&Arc<dyn Concept>, ConceptError> {
        let concept = self.concept(&method.concept)?;
        if concept.actions().iter().any(|name| *name == method.method) {
            Ok(concept)
        } else {
            Err(ConceptError::UnknownAction {
                concept: method.concept.to_string(),
                action: method.method.to_string(),
            })
        }
    }

    /// Resolve a method reference to a declared query
    pub fn query(&self, method: &MethodRef) -> Result<&Arc<dyn Concept>, ConceptError> {
        let concept = self.concept(&method.concept)?;
        if concept.queries().iter().any(|name| *name == method.method) {
            Ok(concept)
        } else {
            Err(ConceptError::UnknownQuery {
                concept: method.concept.to_string(),
                query: method.method.to_string(),
            })
        }
    }

    fn concept(&self, name: &str) -> Result<&Arc<dyn Concept>, ConceptError> {
        self.concepts
            .get(name)
            .ok_or_else(|| ConceptError::UnknownConcept(name.to_string()))
    }
}

impl fmt::Debug for ConceptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ConceptRegistry")
            .field("concepts", &names)
            .finish()
    }
}

/// Read-only handle given to `where` stages
///
/// Only queries can be issued through it, so a `where` stage cannot
/// mutate concept state no matter how often it is evaluated.
#[derive(Clone)]
pub struct Queries {
    registry: Arc<ConceptRegistry>,
    flow: FlowId,
}

impl Queries {
    pub fn new(registry: Arc<ConceptRegistry>, flow: FlowId) -> Self {
        Self { registry, flow }
    }

    pub fn flow(&self) -> FlowId {
        self.flow
    }

    pub async fn query(&self, method: &MethodRef, input: Record) -> Result<Vec<Record>, EngineError> {
        let concept = self.registry.query(method)?;
        let rows = concept.query(&method.method, input).await?;
        tracing::trace!(flow = %self.flow, query = %method, rows = rows.len(), "query");
        Ok(rows)
    }
}
