//! Validate the configuration and the sync catalog.

use super::load_app;
use anyhow::Result;
use std::path::Path;

pub fn check_catalog(config_path: &Path) -> Result<()> {
    let (config, app) = load_app(config_path)?;
    let catalog = app.engine().catalog();

    println!(
        "ok: {} concepts, {} syncs (max depth {}, max steps {}), {} seed requests",
        catalog.concepts().len(),
        catalog.syncs().len(),
        config.engine.max_depth,
        config.engine.max_steps,
        config.seed.len()
    );
    Ok(())
}
