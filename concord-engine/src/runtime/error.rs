//! Error types for the sync engine

use crate::concept::ConceptError;
use crate::types::FlowId;
use thiserror::Error;

/// Defects that abort a flow
///
/// "No match" is never an error; it is an empty set of frames. Domain
/// errors returned by actions are data. What remains here are programming
/// errors and exceeded limits, which are fatal for the flow that hit them.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A concept call failed
    #[error("concept error: {0}")]
    Concept(#[from] ConceptError),

    /// A pattern referenced a variable nothing had bound
    #[error("unbound variable {variable} in field {field}")]
    UnboundVariable { variable: String, field: String },

    /// The causal chain grew deeper than allowed
    #[error("{flow}: causal depth limit {limit} exceeded invoking {method}")]
    DepthExceeded {
        flow: FlowId,
        limit: usize,
        method: String,
    },

    /// The flow produced more completions than allowed
    #[error("{flow}: step limit {limit} exceeded")]
    StepLimitExceeded { flow: FlowId, limit: usize },

    /// A sync rule failed while being evaluated or applied
    #[error("sync {sync} failed: {source}")]
    SyncFailed {
        sync: String,
        #[source]
        source: Box<EngineError>,
    },

    /// Custom failure raised by a `where` stage
    #[error("where stage failed: {0}")]
    Where(String),
}

impl EngineError {
    pub(crate) fn in_sync(self, sync: &str) -> Self {
        match self {
            EngineError::SyncFailed { .. }
            | EngineError::DepthExceeded { .. }
            | EngineError::StepLimitExceeded { .. } => self,
            other => EngineError::SyncFailed {
                sync: sync.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Result type using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
