//! List the registered sync rules.

use super::load_app;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct SyncSummary<'a> {
    name: &'a str,
    when: Vec<String>,
    then: Vec<String>,
    has_where: bool,
}

pub fn list_syncs(config_path: &Path, json: bool) -> Result<()> {
    let (_, app) = load_app(config_path)?;
    let summaries: Vec<SyncSummary> = app
        .engine()
        .catalog()
        .syncs()
        .iter()
        .map(|rule| SyncSummary {
            name: rule.name(),
            when: rule.when_actions().iter().map(|a| a.method.to_string()).collect(),
            then: rule.then_actions().iter().map(|a| a.method.to_string()).collect(),
            has_where: rule.refine().is_some(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        let marker = if summary.has_where { " where" } else { "" };
        println!(
            "{}: when {}{} then {}",
            summary.name,
            summary.when.join(", "),
            marker,
            summary.then.join(", ")
        );
    }
    Ok(())
}
