//! Engine limits and diagnostics switches

use serde::{Deserialize, Serialize};

/// Settings for one [`super::Engine`]
///
/// Every flow is bounded: the causal depth of any completion and the
/// total number of completions per flow are capped, and exceeding either
/// aborts the flow with an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Maximum causal depth (root action is depth 0)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of completions in one flow
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Log the bindings of every frame that fires
    #[serde(default)]
    pub trace_frames: bool,
}

fn default_max_depth() -> usize {
    64
}

fn default_max_steps() -> usize {
    10_000
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_steps: default_max_steps(),
            trace_frames: false,
        }
    }
}
