//! Startup configuration: the concepts and sync rules an engine runs with.
//!
//! A [`Catalog`] is built once, validated, and then shared immutably. There
//! is no process-wide registry, so independent engines (one per test, say)
//! can coexist.

use crate::concept::{Concept, ConceptError, ConceptRegistry};
use crate::sync::SyncRule;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors found while assembling a catalog
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error(transparent)]
    Concept(#[from] ConceptError),

    #[error("sync {0} is already registered")]
    DuplicateSync(String),

    #[error("sync {0} has an empty when clause")]
    EmptyWhen(String),

    #[error("sync {0} has an empty then clause")]
    EmptyThen(String),

    #[error("sync {sync}: {variable} is unbound when invoking {method}")]
    UnboundThenVariable {
        sync: String,
        variable: String,
        method: String,
    },

    #[error("sync {sync} refers to an unknown action: {source}")]
    UnknownAction {
        sync: String,
        #[source]
        source: ConceptError,
    },
}

/// Validated, immutable set of concepts and sync rules
///
/// Only actions produce completions, so every `when` and `then` triple must
/// name a registered action. A rule whose `when` names a query is rejected
/// with [`CatalogError::UnknownAction`]; read queries in the `where` stage
/// instead.
#[derive(Debug)]
pub struct Catalog {
    concepts: Arc<ConceptRegistry>,
    syncs: Vec<SyncRule>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn concepts(&self) -> &Arc<ConceptRegistry> {
        &self.concepts
    }

    pub fn syncs(&self) -> &[SyncRule] {
        &self.syncs
    }

    pub fn sync(&self, name: &str) -> Option<&SyncRule> {
        self.syncs.iter().find(|rule| rule.name() == name)
    }
}

/// Builder for [`Catalog`]
///
/// Registration errors are deferred until [`CatalogBuilder::build`].
#[derive(Default)]
pub struct CatalogBuilder {
    concepts: ConceptRegistry,
    syncs: Vec<SyncRule>,
    error: Option<CatalogError>,
}

impl CatalogBuilder {
    pub fn concept(mut self, concept: Arc<dyn Concept>) -> Self {
        if let Err(err) = self.concepts.register(concept) {
            self.error.get_or_insert(err.into());
        }
        self
    }

    pub fn sync(mut self, rule: SyncRule) -> Self {
        self.syncs.push(rule);
        self
    }

    pub fn syncs(mut self, rules: impl IntoIterator<Item = SyncRule>) -> Self {
        self.syncs.extend(rules);
        self
    }

    /// Validate every rule and freeze the catalog
    ///
    /// Fails on duplicate rule names, malformed rules and triples that do
    /// not name a registered action (queries included).
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut names = HashSet::new();
        for rule in &self.syncs {
            if !names.insert(rule.name()) {
                return Err(CatalogError::DuplicateSync(rule.name().to_string()));
            }
            rule.validate()?;
            for triple in rule.when_actions().iter().chain(rule.then_actions()) {
                self.concepts
                    .action(&triple.method)
                    .map_err(|source| CatalogError::UnknownAction {
                        sync: rule.name().to_string(),
                        source,
                    })?;
            }
        }

        tracing::debug!(
            concepts = self.concepts.len(),
            syncs = self.syncs.len(),
            "catalog built"
        );

        Ok(Catalog {
            concepts: Arc::new(self.concepts),
            syncs: self.syncs,
        })
    }
}
