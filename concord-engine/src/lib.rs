//! Concord: a synchronization engine for concept-oriented applications
//!
//! Application behavior is split into independent *concepts* (user
//! authentication, sessions, posts, ...) that never call each other.
//! Declarative *sync rules* compose them: when certain actions complete,
//! optionally filter and enrich the matched bindings with read-only
//! queries, then invoke further actions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Engine                             │
//! │  ┌────────────┐    ┌────────────┐    ┌─────────────────────┐ │
//! │  │  Catalog   │    │ work stack │    │      FlowTrace      │ │
//! │  │ concepts + │───▶│ Dispatch / │───▶│ completions, syncs  │ │
//! │  │ sync rules │    │  Continue  │    │ fired, errors       │ │
//! │  └────────────┘    └─────┬──────┘    └─────────────────────┘ │
//! └──────────────────────────┼───────────────────────────────────┘
//!                            │
//!        when ───────▶ Frames ───────▶ where ───────▶ then
//!   (match completions)  (bindings)  (queries only)  (actions)
//! ```
//!
//! - **Pattern**: field patterns whose terms are literals, variables or
//!   wildcards; matching extends a [`Frame`] of variable bindings.
//! - **Frames**: the ordered set of candidate bindings flowing through a
//!   sync. Empty frames mean "no match"; later stages run zero times.
//! - **Concept**: the capability the engine consumes; actions return an
//!   [`Outcome`], queries return zero or more records.
//! - **Engine**: performs a root action and drives every resulting sync
//!   firing depth-first until the flow is quiescent.

pub mod actions;
pub mod concept;
pub mod frames;
pub mod pattern;
pub mod runtime;
pub mod sync;
pub mod types;

pub use actions::{actions, ActionPattern, Actions};
pub use concept::{require_str, Concept, ConceptError, ConceptRegistry, Outcome, Queries};
pub use frames::{Frame, Frames};
pub use pattern::{Pattern, Term};
pub use runtime::{
    Catalog, CatalogBuilder, CatalogError, Cause, Completion, Engine, EngineError,
    EngineSettings, Firing, FlowTrace,
};
pub use sync::{SyncRule, WhereFn};
pub use types::{ActionId, FlowId, MethodRef, Record, Value, Var};
