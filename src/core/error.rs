//! Error types and error handling for the ingestion core.
//!
//! This module defines the error taxonomy shared by the writer handle,
//! the consumer pipeline and the snapshot reader provider. Failures on
//! cleanup paths (startup, release, rollback, shutdown) are logged by
//! their owners and never surface through these types.

use crate::core::types::WriterState;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Main error type for the ingestion core
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Startup failed: {0}")]
    StartupFailed(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Writer not started (state: {0})")]
    NotStarted(WriterState),

    #[error("Mutation failed: {0}")]
    MutationFailed(String),

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Failed to open reader: {0}")]
    ReaderOpenFailed(String),

    #[error("Failed to release reader: {0}")]
    ReleaseFailed(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl IngestError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if the operation was rejected by the writer lifecycle
    pub fn is_not_started(&self) -> bool {
        matches!(self, IngestError::NotStarted(_))
    }

    /// Check if replaying the same batch may succeed
    ///
    /// Storage-side failures are retryable: retract-then-insert makes a
    /// batch replay converge to the same visible state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestError::MutationFailed(_)
                | IngestError::CommitFailed(_)
                | IngestError::ReaderOpenFailed(_)
                | IngestError::IoError(_)
        )
    }
}

/// A batch that failed during `consume`
///
/// Wraps the underlying failure together with enough context for the
/// caller to decide whether to replay the batch.
#[derive(Error, Debug)]
#[error("{}", describe(.batch_len, .event_index, .discarded_pending, .source))]
pub struct ConsumeError {
    /// Number of events in the failed batch
    pub batch_len: usize,

    /// Position of the event being processed when the batch failed
    /// (`None` for failures before or after the event loop)
    pub event_index: Option<usize>,

    /// Mutations carried over from earlier unversioned batches that the
    /// rollback discarded along with this batch
    pub discarded_pending: usize,

    /// Underlying failure
    #[source]
    pub source: IngestError,
}

fn describe(
    batch_len: &usize,
    event_index: &Option<usize>,
    discarded_pending: &usize,
    source: &IngestError,
) -> String {
    let mut msg = match event_index {
        Some(idx) => format!("Batch of {batch_len} events failed at event {idx}: {source}"),
        None => format!("Batch of {batch_len} events failed: {source}"),
    };
    if *discarded_pending > 0 {
        msg.push_str(&format!(
            " ({discarded_pending} pending mutations from earlier unversioned batches discarded)"
        ));
    }
    msg
}

impl ConsumeError {
    pub fn new(batch_len: usize, event_index: Option<usize>, source: IngestError) -> Self {
        Self {
            batch_len,
            event_index,
            discarded_pending: 0,
            source,
        }
    }

    /// Record how many carried-over mutations the rollback threw away
    pub fn with_discarded_pending(mut self, discarded_pending: usize) -> Self {
        self.discarded_pending = discarded_pending;
        self
    }

    /// Check if the caller may replay the whole batch
    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}
