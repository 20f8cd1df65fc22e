//! Sync rules: `when` / optional `where` / `then`.

use crate::actions::Actions;
use crate::concept::Queries;
use crate::frames::Frames;
use crate::runtime::{CatalogError, EngineError};
use crate::types::Var;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Stored form of a `where` stage
pub type WhereFn =
    Arc<dyn Fn(Frames, Queries) -> BoxFuture<'static, Result<Frames, EngineError>> + Send + Sync>;

/// A declarative rule composing concepts
///
/// ```
/// use concord_engine::{actions, pattern, MethodRef, SyncRule, Var};
///
/// const REQUEST: MethodRef = MethodRef::of("Requesting", "request");
/// const RESPOND: MethodRef = MethodRef::of("Requesting", "respond");
///
/// let request = Var::new("request");
/// let rule = SyncRule::new("Ping")
///     .when(actions([(
///         REQUEST,
///         pattern! { "path" => "/ping" },
///         pattern! { "request" => &request },
///     )]))
///     .then(actions([(RESPOND, pattern! { "request" => &request, "pong" => true })]));
/// assert!(rule.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct SyncRule {
    name: String,
    when: Actions,
    refine: Option<WhereFn>,
    where_binds: Vec<Var>,
    then: Actions,
}

impl SyncRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            when: Actions::default(),
            refine: None,
            where_binds: Vec::new(),
            then: Actions::default(),
        }
    }

    pub fn when(mut self, when: Actions) -> Self {
        self.when = when;
        self
    }

    /// Attach a `where` stage
    ///
    /// The stage receives the frames produced by `when` and a read-only
    /// [`Queries`] handle. It may run any number of times and must not
    /// depend on hidden mutable state.
    pub fn where_<F, Fut>(mut self, refine: F) -> Self
    where
        F: Fn(Frames, Queries) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Frames, EngineError>> + Send + 'static,
    {
        let stage: WhereFn =
            Arc::new(move |frames: Frames, queries: Queries| refine(frames, queries).boxed());
        self.refine = Some(stage);
        self
    }

    /// Declare the variables the `where` stage binds
    pub fn binds<'a>(mut self, vars: impl IntoIterator<Item = &'a Var>) -> Self {
        self.where_binds.extend(vars.into_iter().cloned());
        self
    }

    pub fn then(mut self, then: Actions) -> Self {
        self.then = then;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn when_actions(&self) -> &Actions {
        &self.when
    }

    pub fn then_actions(&self) -> &Actions {
        &self.then
    }

    pub fn refine(&self) -> Option<&WhereFn> {
        self.refine.as_ref()
    }

    /// Check the rule is well formed
    ///
    /// Every variable a `then` input needs must be bound by `when`, by a
    /// declared `where` binding, or by an earlier `then` output.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.when.is_empty() {
            return Err(CatalogError::EmptyWhen(self.name.clone()));
        }
        if self.then.is_empty() {
            return Err(CatalogError::EmptyThen(self.name.clone()));
        }

        let mut bound: HashSet<&Var> = HashSet::new();
        for triple in &self.when {
            bound.extend(triple.input.variables());
            if let Some(output) = &triple.output {
                bound.extend(output.variables());
            }
        }
        bound.extend(self.where_binds.iter());

        for triple in &self.then {
            if let Some(var) = triple.input.variables().find(|var| !bound.contains(var)) {
                return Err(CatalogError::UnboundThenVariable {
                    sync: self.name.clone(),
                    variable: var.to_string(),
                    method: triple.method.to_string(),
                });
            }
            if let Some(output) = &triple.output {
                bound.extend(output.variables());
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SyncRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncRule")
            .field("name", &self.name)
            .field("when", &self.when)
            .field("where", &self.refine.is_some())
            .field("then", &self.then)
            .finish()
    }
}
