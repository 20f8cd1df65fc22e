//! CLI command implementations.

pub mod check;
pub mod run;
pub mod syncs;

pub use check::check_catalog;
pub use run::{run_script, RunOptions};
pub use syncs::list_syncs;

use crate::config::Config;
use anyhow::{Context, Result};
use concord_concepts::App;
use std::path::Path;

/// Load the configuration and build the application from it
pub(crate) fn load_app(config_path: &Path) -> Result<(Config, App)> {
    let config = Config::load_or_default(config_path).context("Failed to load configuration")?;
    let app = App::new(config.engine.clone(), config.server.clone())
        .context("Failed to build the sync catalog")?;
    Ok((config, app))
}
