//! Status command - inspect the committed state through a snapshot

use crate::cli::commands::ensure_started;
use crate::cli::output::{colors, format_relative_time, print_header};
use crate::cli::OutputFormat;
use crate::core::error::Result;
use crate::core::services::Services;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also count the documents currently visible for this uid
    #[arg(long, short = 'u')]
    pub uid: Option<String>,
}

/// Index status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub index_dir: String,
    pub version: Option<String>,
    pub sequence: Option<u64>,
    pub committed_at: Option<DateTime<Utc>>,
    pub num_docs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<UidStatus>,
}

#[derive(Debug, Serialize)]
pub struct UidStatus {
    pub uid: String,
    pub documents: usize,
}

/// Execute the status command
pub async fn execute(
    args: StatusArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let services = Arc::clone(services);
    let response = tokio::task::spawn_blocking(move || status(&services, args)).await??;

    match format {
        OutputFormat::Human => {
            print_header("Index status:");
            println!("  index_dir: {}", colors::file_path(&response.index_dir));
            match &response.version {
                Some(version) => println!("  version: {}", colors::version(version)),
                None => println!("  version: {}", colors::dim("none (nothing committed)")),
            }
            if let Some(sequence) = response.sequence {
                println!("  sequence: {}", colors::number(&sequence.to_string()));
            }
            if let Some(at) = &response.committed_at {
                println!("  committed: {} ({})", at.to_rfc3339(), format_relative_time(at));
            }
            println!(
                "  documents: {}",
                colors::number(&response.num_docs.to_string())
            );
            if let Some(uid) = &response.uid {
                println!(
                    "  uid {}: {} document(s)",
                    uid.uid,
                    colors::number(&uid.documents.to_string())
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn status(services: &Services, args: StatusArgs) -> Result<StatusResponse> {
    ensure_started(&services.writer)?;

    let set = services.readers.open_readers()?;
    let record = set.readers.first().and_then(|r| r.commit_record().cloned());

    let uid = match args.uid {
        Some(uid) => {
            let mut documents = 0;
            for reader in &set.readers {
                documents += reader.lookup(&uid)?.len();
            }
            Some(UidStatus { uid, documents })
        }
        None => None,
    };
    let num_docs = set.num_docs();
    services.readers.release_readers(set.readers);

    Ok(StatusResponse {
        index_dir: services
            .config
            .storage
            .index_dir
            .to_string_lossy()
            .into_owned(),
        version: record.as_ref().map(|r| r.version.to_string()),
        sequence: record.as_ref().map(|r| r.sequence),
        committed_at: record.and_then(|r| r.committed_at),
        num_docs,
        uid,
    })
}
