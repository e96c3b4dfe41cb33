//! CLI command implementations
//!
//! Each command module handles argument parsing and execution for one
//! subcommand.

pub mod completions;
pub mod config;
pub mod ingest;
pub mod status;

// Re-export argument types for use in mod.rs
pub use completions::CompletionsArgs;
pub use config::ConfigArgs;
pub use ingest::IngestArgs;
pub use status::StatusArgs;

use crate::core::error::{IngestError, Result};
use crate::core::storage::IndexWriterHandle;
use crate::core::types::WriterState;

/// Start the writer on first use; a shut down writer stays unusable
pub(crate) fn ensure_started(writer: &IndexWriterHandle) -> Result<()> {
    match writer.state() {
        WriterState::Unstarted => writer.try_start(),
        WriterState::Started => Ok(()),
        WriterState::Shutdown => Err(IngestError::NotStarted(WriterState::Shutdown)),
    }
}
