//! Ingest command - feed JSON Lines events through the pipeline

use crate::cli::commands::ensure_started;
use crate::cli::output::{colors, format_duration, print_warning};
use crate::cli::OutputFormat;
use crate::core::indexable::Analyzer;
use crate::core::json_events::read_events;
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Event file, or directory searched recursively for event files
    pub path: PathBuf,

    /// Events per batch (one commit per batch) [default: from config]
    #[arg(long, short = 'b')]
    pub batch_size: Option<usize>,

    /// File name pattern for directory sources [default: from config]
    #[arg(long, short = 'p')]
    pub pattern: Option<String>,

    /// Default analyzer for documents without an override [default: from config]
    #[arg(long, short = 'a')]
    pub analyzer: Option<String>,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Ingestion result response
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub source: String,
    pub events: usize,
    pub batches: usize,
    pub skipped: usize,
    pub retracted: usize,
    pub inserted: usize,
    pub committed_version: Option<String>,
    /// Mutations left pending by trailing unversioned batches
    pub pending_mutations: usize,
    pub duration_secs: f64,
}

/// Execute the ingest command
pub async fn execute(
    args: IngestArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let batch_size = args.batch_size.unwrap_or(services.config.ingest.batch_size);
    if batch_size == 0 {
        return Err("Batch size must be at least 1.".into());
    }

    if !args.path.exists() {
        return Err(format!(
            "Event source '{}' does not exist.",
            args.path.display()
        )
        .into());
    }

    if !args.quiet && format == OutputFormat::Human {
        eprintln!(
            "Ingesting {} in batches of {}...",
            colors::file_path(&args.path.display().to_string()),
            colors::number(&batch_size.to_string())
        );
    }

    let services = Arc::clone(services);
    let response = tokio::task::spawn_blocking(move || ingest(&services, args, batch_size))
        .await?
        .map_err(|e| e as Box<dyn Error>)?;

    match format {
        OutputFormat::Human => {
            println!(
                "{} {} events in {} batches ({} skipped, {} documents) in {}",
                colors::success("Ingested"),
                colors::number(&response.events.to_string()),
                colors::number(&response.batches.to_string()),
                colors::number(&response.skipped.to_string()),
                colors::number(&response.inserted.to_string()),
                colors::number(&format_duration(response.duration_secs))
            );
            match &response.committed_version {
                Some(version) => println!("Committed version: {}", colors::version(version)),
                None => println!("Committed version: {}", colors::dim("none")),
            }
            if response.pending_mutations > 0 {
                print_warning(&format!(
                    "{} mutations had no version; they are flushed on shutdown",
                    response.pending_mutations
                ));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn ingest(
    services: &Services,
    args: IngestArgs,
    batch_size: usize,
) -> Result<IngestResponse, Box<dyn Error + Send + Sync>> {
    let start = Instant::now();
    let pattern = args
        .pattern
        .unwrap_or_else(|| services.config.ingest.event_pattern.clone());

    let events = read_events(&args.path, &pattern)?;

    ensure_started(&services.writer)?;
    let mut pipeline = services.create_pipeline()?;
    if let Some(analyzer) = args.analyzer {
        pipeline = pipeline.with_default_analyzer(Analyzer::named(analyzer));
    }

    let mut response = IngestResponse {
        source: args.path.to_string_lossy().into_owned(),
        events: events.len(),
        batches: 0,
        skipped: 0,
        retracted: 0,
        inserted: 0,
        committed_version: None,
        pending_mutations: 0,
        duration_secs: 0.0,
    };

    for batch in events.chunks(batch_size) {
        let outcome = pipeline.consume_batch(batch)?;
        response.batches += 1;
        response.skipped += outcome.skipped;
        response.retracted += outcome.retracted;
        response.inserted += outcome.inserted;
        if let Some(version) = outcome.committed_version {
            response.committed_version = Some(version.into_inner());
        }
    }

    response.pending_mutations = services.writer.pending_mutations();
    response.duration_secs = start.elapsed().as_secs_f64();
    Ok(response)
}
