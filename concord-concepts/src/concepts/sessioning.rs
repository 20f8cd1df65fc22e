use super::{row, unknown_action, unknown_query};
use crate::store::Collection;
use async_trait::async_trait;
use concord_engine::{require_str, Concept, ConceptError, MethodRef, Outcome, Record};
use serde_json::json;

#[derive(Debug, Clone)]
struct Session {
    user: String,
}

/// Opaque session tokens standing in for a user
#[derive(Debug)]
pub struct Sessioning {
    sessions: Collection<Session>,
}

impl Sessioning {
    pub const CREATE: MethodRef = MethodRef::of("Sessioning", "create");
    pub const DELETE: MethodRef = MethodRef::of("Sessioning", "delete");
    pub const GET_USER: MethodRef = MethodRef::of("Sessioning", "_getUser");

    pub fn new() -> Self {
        Self {
            sessions: Collection::new("session"),
        }
    }
}

impl Default for Sessioning {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Concept for Sessioning {
    fn name(&self) -> &str {
        "Sessioning"
    }

    fn actions(&self) -> &[&'static str] {
        &["create", "delete"]
    }

    fn queries(&self) -> &[&'static str] {
        &["_getUser"]
    }

    async fn perform(&self, action: &str, input: Record) -> Result<Outcome, ConceptError> {
        match action {
            "create" => {
                let user = require_str(&input, "user")?.to_string();
                let session = Collection::<Session>::fresh_id();
                if let Err(err) = self.sessions.insert(session.clone(), Session { user }) {
                    return Ok(err.into());
                }
                Ok(Outcome::with("session", session))
            }
            "delete" => {
                let session = require_str(&input, "session")?;
                Ok(match self.sessions.delete(session) {
                    Ok(_) => Outcome::empty(),
                    Err(err) => err.into(),
                })
            }
            other => Err(unknown_action(self.name(), other)),
        }
    }

    async fn query(&self, query: &str, input: Record) -> Result<Vec<Record>, ConceptError> {
        match query {
            "_getUser" => {
                let session = require_str(&input, "session")?;
                Ok(self
                    .sessions
                    .get(session)
                    .map(|s| row([("user", json!(s.user))]))
                    .into_iter()
                    .collect())
            }
            other => Err(unknown_query(self.name(), other)),
        }
    }
}
