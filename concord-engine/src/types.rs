//! Core type definitions for the sync engine
//!
//! These are the identity types threaded through pattern matching and
//! dispatch: pattern variables, method references, and the identifiers
//! of flows and completion events.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A concrete record passed into and out of concept methods.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A value carried by a record field or bound to a variable.
pub type Value = serde_json::Value;

static VAR_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Pattern variable
///
/// Variables are compared by identity, never by name. Two variables
/// created with the same name are distinct, so unrelated sync rules that
/// both talk about `user` can never bind into each other.
#[derive(Clone)]
pub struct Var {
    id: u64,
    name: Arc<str>,
}

impl Var {
    /// Create a fresh variable with a display name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            id: VAR_COUNTER.fetch_add(1, Ordering::SeqCst),
            name: Arc::from(name.as_ref()),
        }
    }

    /// Create several fresh variables at once
    ///
    /// ```
    /// use concord_engine::Var;
    ///
    /// let [request, user] = Var::many(["request", "user"]);
    /// assert_ne!(request, user);
    /// ```
    pub fn many<const N: usize>(names: [&str; N]) -> [Var; N] {
        names.map(Var::new)
    }

    /// The name the variable was declared with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Process-unique identity of the variable
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}#{}", self.name, self.id)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

/// Reference to a named action or query on a concept
///
/// Concepts usually expose their methods as constants:
///
/// ```
/// use concord_engine::MethodRef;
///
/// const CREATE: MethodRef = MethodRef::of("Sessioning", "create");
/// assert_eq!(CREATE.to_string(), "Sessioning.create");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub concept: Cow<'static, str>,
    pub method: Cow<'static, str>,
}

impl MethodRef {
    pub const fn of(concept: &'static str, method: &'static str) -> Self {
        Self {
            concept: Cow::Borrowed(concept),
            method: Cow::Borrowed(method),
        }
    }

    pub fn new(concept: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            concept: Cow::Owned(concept.into()),
            method: Cow::Owned(method.into()),
        }
    }

    /// Queries are named with a leading underscore by convention
    pub fn is_query(&self) -> bool {
        self.method.starts_with('_')
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.concept, self.method)
    }
}

/// Identifier of a request flow
///
/// Every externally triggered action roots a flow; every completion that
/// ripples out of it carries the same flow id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub Uuid);

impl FlowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow:{}", &self.0.to_string()[..8])
    }
}

static ACTION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier of one completion event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u64);

impl ActionId {
    pub fn new() -> Self {
        Self(ACTION_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "act:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vars_compare_by_identity() {
        let a = Var::new("user");
        let b = Var::new("user");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let set: HashSet<Var> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_many_keeps_names() {
        let [request, session] = Var::many(["request", "session"]);
        assert_eq!(request.name(), "request");
        assert_eq!(session.name(), "session");
        assert_eq!(format!("{}", session), "?session");
    }

    #[test]
    fn test_method_ref_display() {
        let m = MethodRef::new("Sessioning", "create");
        assert_eq!(m.to_string(), "Sessioning.create");
        assert!(!m.is_query());
        assert!(MethodRef::new("Sessioning", "_getUser").is_query());
        assert_eq!(MethodRef::of("Sessioning", "create"), m);
    }

    #[test]
    fn test_action_ordering() {
        let a1 = ActionId::new();
        let a2 = ActionId::new();
        assert!(a1 < a2);
    }
}
