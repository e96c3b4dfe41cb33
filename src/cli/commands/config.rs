//! Config command - show the resolved configuration

use crate::cli::output::print_header;
use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::services::Services;
use crate::core::xdg::XdgDirs;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the show-config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also show resolved config and data directories
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(flatten)]
    pub config: Config,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsResponse>,
}

#[derive(Debug, Serialize)]
pub struct PathsResponse {
    pub config_file: String,
    pub data_dir: String,
}

/// Execute the show-config command
pub async fn execute(
    args: ConfigArgs,
    services: &Arc<Services>,
    xdg: &XdgDirs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = ConfigResponse {
        config: services.config.as_ref().clone(),
        paths: args.all.then(|| PathsResponse {
            config_file: xdg.config_file().to_string_lossy().into_owned(),
            data_dir: xdg.data_dir.to_string_lossy().into_owned(),
        }),
    };

    match format {
        OutputFormat::Human => {
            let config = &response.config;
            print_header("Configuration:");
            println!("  writer:");
            println!("    heap_size_bytes: {}", config.writer.heap_size_bytes);
            println!("    num_threads: {}", config.writer.num_threads);
            println!("  storage:");
            println!("    index_dir: {}", config.storage.index_dir.display());
            println!("  ingest:");
            println!("    default_analyzer: {}", config.ingest.default_analyzer);
            println!("    batch_size: {}", config.ingest.batch_size);
            println!("    text_fields: {:?}", config.ingest.text_fields);
            println!("    event_pattern: {}", config.ingest.event_pattern);
            if let Some(paths) = &response.paths {
                println!("  paths:");
                println!("    config_file: {}", paths.config_file);
                println!("    data_dir: {}", paths.data_dir);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
