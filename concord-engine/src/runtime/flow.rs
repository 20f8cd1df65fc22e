//! Completion events and the per-flow record of what happened.

use crate::concept::Outcome;
use crate::types::{ActionId, FlowId, MethodRef, Record};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Why a completion happened: which sync issued it, reacting to what
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cause {
    pub sync: String,
    pub trigger: ActionId,
}

/// The fact that an action ran with a concrete input and output
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub id: ActionId,
    pub flow: FlowId,
    pub method: MethodRef,
    pub input: Record,
    pub output: Outcome,
    /// Causal depth; the root action of a flow is 0
    pub depth: usize,
    /// `None` for the root action
    pub cause: Option<Cause>,
    pub at: DateTime<Utc>,
}

/// One sync firing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Firing {
    pub sync: String,
    pub trigger: ActionId,
    /// Frames that survived `where` (the number of `then` runs)
    pub frames: usize,
}

/// Everything a flow did, in order
#[derive(Debug, Clone, Serialize)]
pub struct FlowTrace {
    pub flow: FlowId,
    pub completions: Vec<Completion>,
    pub firings: Vec<Firing>,
    /// Error outcomes no sync matched
    pub unhandled_errors: Vec<ActionId>,
}

impl FlowTrace {
    pub fn new(flow: FlowId) -> Self {
        Self {
            flow,
            completions: Vec::new(),
            firings: Vec::new(),
            unhandled_errors: Vec::new(),
        }
    }

    /// The action that started the flow
    pub fn root(&self) -> Option<&Completion> {
        self.completions.first()
    }

    pub fn completions_of<'a>(
        &'a self,
        method: &'a MethodRef,
    ) -> impl Iterator<Item = &'a Completion> + 'a {
        self.completions.iter().filter(move |c| c.method == *method)
    }

    /// Completed methods in order, as `Concept.method` strings
    pub fn methods(&self) -> Vec<String> {
        self.completions.iter().map(|c| c.method.to_string()).collect()
    }

    /// How many times the named sync fired
    pub fn fired(&self, sync: &str) -> usize {
        self.firings.iter().filter(|f| f.sync == sync).count()
    }

    pub fn get(&self, id: ActionId) -> Option<&Completion> {
        self.completions.iter().find(|c| c.id == id)
    }
}

/// Mutable state of one flow while it is being driven
pub(crate) struct FlowState {
    pub trace: FlowTrace,
    /// `(sync index, sorted matched completion ids)` already fired
    fired: HashSet<(usize, Vec<ActionId>)>,
}

impl FlowState {
    pub fn new(flow: FlowId) -> Self {
        Self {
            trace: FlowTrace::new(flow),
            fired: HashSet::new(),
        }
    }

    pub fn flow(&self) -> FlowId {
        self.trace.flow
    }

    /// Record a firing combination; false if it already fired
    pub fn claim(&mut self, sync: usize, matched: &[ActionId]) -> bool {
        let mut key = matched.to_vec();
        key.sort_unstable();
        key.dedup();
        self.fired.insert((sync, key))
    }
}
