//! CLI adapter for nrt-ingest
//!
//! Feeds JSON Lines event files through the consumer pipeline and
//! inspects the committed state of the index. Depends on `core/` only.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

/// nrt-ingest - near-real-time ingestion into a tantivy index
///
/// Consumes versioned events in batches, one atomic commit per batch,
/// and reports the version visible to snapshot readers.
#[derive(Parser, Debug)]
#[command(name = "nrt-ingest")]
#[command(version)]
#[command(about = "Near-real-time ingestion into a tantivy index", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest events from a JSON Lines file or directory
    Ingest(commands::IngestArgs),

    /// Show the committed version and document count
    Status(commands::StatusArgs),

    /// Show current configuration
    #[command(name = "show-config")]
    ShowConfig(commands::ConfigArgs),

    /// Generate shell completion scripts
    ///
    /// Output completion script to stdout. To install:
    ///
    ///   bash:  nrt-ingest completions bash > ~/.local/share/bash-completion/completions/nrt-ingest
    ///   zsh:   nrt-ingest completions zsh > ~/.zfunc/_nrt-ingest
    ///   fish:  nrt-ingest completions fish > ~/.config/fish/completions/nrt-ingest.fish
    Completions(commands::CompletionsArgs),
}

/// Run the CLI with the provided arguments
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use crate::core::config::Config;
    use crate::core::services::Services;
    use crate::core::xdg::XdgDirs;
    use std::sync::Arc;

    // Handle completions command early (doesn't need services)
    let command = match cli.command {
        Commands::Completions(args) => return commands::completions::execute(args),
        command => command,
    };

    let xdg = XdgDirs::new();
    xdg.ensure_dirs_exist()?;
    xdg.log_paths();

    let config = Config::load_with_xdg(&xdg)?;
    config.log_config();

    let services = Arc::new(Services::new(config)?);

    let result = match command {
        Commands::Ingest(args) => commands::ingest::execute(args, &services, cli.format).await,
        Commands::Status(args) => commands::status::execute(args, &services, cli.format).await,
        Commands::ShowConfig(args) => {
            commands::config::execute(args, &services, &xdg, cli.format).await
        }
        Commands::Completions(_) => unreachable!(), // Handled above
    };

    // Flush and release the index lock before exiting
    let writer = Arc::clone(&services.writer);
    tokio::task::spawn_blocking(move || writer.shutdown()).await?;

    result
}
