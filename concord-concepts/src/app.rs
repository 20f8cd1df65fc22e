//! Request/response facade over the engine

use crate::concepts::{Concepts, Requesting};
use crate::syncs;
use concord_engine::{
    Catalog, CatalogError, Engine, EngineError, EngineSettings, FlowTrace, Record, Value,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Transport-level failures; domain errors arrive as response fields
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no sync responded to {path}")]
    NoResponse { path: String, trace: Box<FlowTrace> },

    #[error("request to {path} timed out after {timeout_ms}ms")]
    Timeout { path: String, timeout_ms: u64 },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Limits applied to each inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSettings {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RequestSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// A handled request: the response body and everything that happened
#[derive(Debug, Clone)]
pub struct Handled {
    pub response: Record,
    pub trace: FlowTrace,
}

/// The reference application: every concept, every sync, one engine
#[derive(Debug, Clone)]
pub struct App {
    engine: Engine,
    requesting: Arc<Requesting>,
    settings: RequestSettings,
}

impl App {
    pub fn new(engine: EngineSettings, settings: RequestSettings) -> Result<Self, CatalogError> {
        Self::with_concepts(Concepts::new(), engine, settings)
    }

    pub fn with_concepts(
        concepts: Concepts,
        engine: EngineSettings,
        settings: RequestSettings,
    ) -> Result<Self, CatalogError> {
        let catalog = concepts
            .register(Catalog::builder())
            .syncs(syncs::all())
            .build()?;
        Ok(Self {
            engine: Engine::new(Arc::new(catalog), engine),
            requesting: concepts.requesting,
            settings,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Handle `path` with `body`, returning only the response
    pub async fn handle(&self, path: &str, body: Record) -> Result<Record, AppError> {
        self.dispatch(path, body).await.map(|handled| handled.response)
    }

    /// Handle `path` with `body`, keeping the flow trace
    ///
    /// The pending `Requesting` entry is removed on every exit, including
    /// aborted and timed-out flows.
    pub async fn dispatch(&self, path: &str, mut body: Record) -> Result<Handled, AppError> {
        let request = Uuid::new_v4().to_string();
        body.insert("path".to_string(), Value::String(path.to_string()));
        body.insert("request".to_string(), Value::String(request.clone()));
        let timeout = self.settings.timeout();
        let method = Requesting::REQUEST;
        let invoked = self.engine.invoke(&method, body);
        let finished = tokio::time::timeout(timeout, invoked).await;
        let response = self.requesting.take_response(&request);

        let trace = match finished {
            Ok(Ok(trace)) => trace,
            Ok(Err(err)) => {
                tracing::warn!(path, %request, error = %err, "request flow aborted");
                return Err(err.into());
            }
            Err(_) => {
                tracing::warn!(path, %request, "request timed out");
                return Err(AppError::Timeout {
                    path: path.to_string(),
                    timeout_ms: self.settings.request_timeout_ms,
                });
            }
        };

        match response {
            Some(response) => Ok(Handled { response, trace }),
            None => {
                tracing::warn!(path, flow = %trace.flow, "request was never answered");
                Err(AppError::NoResponse {
                    path: path.to_string(),
                    trace: Box::new(trace),
                })
            }
        }
    }
}
