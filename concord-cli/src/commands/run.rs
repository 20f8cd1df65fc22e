//! Replay a JSON script of requests through the application.

use super::load_app;
use crate::config::ScriptRequest;
use anyhow::{Context, Result};
use concord_concepts::{App, AppError, Handled};
use concord_engine::FlowTrace;
use serde_json::{json, Value};
use std::path::Path;

pub struct RunOptions {
    /// Print each request's completions to stderr
    pub trace: bool,
}

pub async fn run_script(config_path: &Path, script: &Path, opts: RunOptions) -> Result<()> {
    let (config, app) = load_app(config_path)?;

    let contents = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let requests: Vec<ScriptRequest> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse script {}", script.display()))?;

    for seed in config.seed {
        match app.handle(&seed.path, seed.body).await {
            Ok(response) => tracing::info!(path = %seed.path, ?response, "seeded"),
            Err(err) => tracing::warn!(path = %seed.path, error = %err, "seed request failed"),
        }
    }

    for request in requests {
        let line = handle(&app, request, opts.trace).await;
        println!("{}", line);
    }
    Ok(())
}

/// One output line; transport failures become `{"error": ..}`
async fn handle(app: &App, request: ScriptRequest, trace: bool) -> Value {
    match app.dispatch(&request.path, request.body).await {
        Ok(Handled { response, trace: flow }) => {
            if trace {
                print_trace(&request.path, &flow);
            }
            Value::Object(response)
        }
        Err(AppError::NoResponse { trace: flow, .. }) => {
            if trace {
                print_trace(&request.path, &flow);
            }
            json!({ "error": format!("no response for {}", request.path) })
        }
        Err(err) => json!({ "error": err.to_string() }),
    }
}

fn print_trace(path: &str, flow: &FlowTrace) {
    eprintln!("{} {}", flow.flow, path);
    for completion in &flow.completions {
        let indent = "  ".repeat(completion.depth + 1);
        eprintln!(
            "{}{} {} -> {}",
            indent,
            completion.method,
            Value::Object(completion.input.clone()),
            completion.output
        );
    }
}
