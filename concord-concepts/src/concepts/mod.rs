//! Reference concepts
//!
//! Each concept owns its collections and knows nothing of the others.
//! Domain failures come back as [`Outcome::Error`]; only malformed calls
//! are reported as [`ConceptError`](concord_engine::ConceptError).

mod friending;
mod posting;
mod requesting;
mod sessioning;
mod user_authentication;
mod wishlist;

pub use friending::Friending;
pub use posting::Posting;
pub use requesting::Requesting;
pub use sessioning::Sessioning;
pub use user_authentication::UserAuthentication;
pub use wishlist::Wishlist;

use crate::store::StoreError;
use concord_engine::{CatalogBuilder, ConceptError, Outcome, Record, Value};
use std::sync::Arc;

/// One instance of every reference concept
#[derive(Clone, Default)]
pub struct Concepts {
    pub users: Arc<UserAuthentication>,
    pub sessions: Arc<Sessioning>,
    pub posts: Arc<Posting>,
    pub wishlist: Arc<Wishlist>,
    pub friends: Arc<Friending>,
    pub requesting: Arc<Requesting>,
}

impl Concepts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every concept to a catalog under construction
    pub fn register(&self, builder: CatalogBuilder) -> CatalogBuilder {
        builder
            .concept(self.users.clone())
            .concept(self.sessions.clone())
            .concept(self.posts.clone())
            .concept(self.wishlist.clone())
            .concept(self.friends.clone())
            .concept(self.requesting.clone())
    }
}

impl From<StoreError> for Outcome {
    fn from(err: StoreError) -> Self {
        Outcome::error(err.to_string())
    }
}

/// Build a record from literal field pairs
pub(crate) fn row<const N: usize>(fields: [(&str, Value); N]) -> Record {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

pub(crate) fn unknown_action(concept: &str, action: &str) -> ConceptError {
    ConceptError::UnknownAction {
        concept: concept.to_string(),
        action: action.to_string(),
    }
}

pub(crate) fn unknown_query(concept: &str, query: &str) -> ConceptError {
    ConceptError::UnknownQuery {
        concept: concept.to_string(),
        query: query.to_string(),
    }
}
