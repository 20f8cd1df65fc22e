//! # concord CLI
//!
//! Command-line interface for replaying requests through the Concord sync
//! engine and inspecting its sync catalog.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "concord")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults apply if it does not exist)
    #[arg(long, default_value = "concord.yml", env = "CONCORD_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON array of requests, printing one response per line
    Run {
        /// Script file: `[{"path": "/...", ...body}, ...]`
        script: PathBuf,

        /// Print each request's completion tree to stderr
        #[arg(long)]
        trace: bool,
    },

    /// List the registered syncs
    Syncs {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and the sync catalog
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::WARN.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run { script, trace } => {
            commands::run_script(&cli.config, &script, commands::RunOptions { trace }).await
        }
        Commands::Syncs { json } => commands::list_syncs(&cli.config, json),
        Commands::Check => commands::check_catalog(&cli.config),
    }
}
