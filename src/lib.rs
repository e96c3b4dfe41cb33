//! nrt-ingest - near-real-time ingestion core over a tantivy index
//!
//! Consumes batches of versioned data events, turns each into
//! retract-then-insert mutations keyed by a uid, and commits every batch
//! atomically together with its version. Snapshot readers see only
//! committed state and report the version that produced it.
//!
//! # Architecture
//!
//! - **core**: Domain logic
//!   - storage (schema, writer handle)
//!   - consumer (batch pipeline)
//!   - snapshot (reader provider)
//!   - version, indexable, json_events, config, xdg, services
//!
//! - **cli**: Command-line adapter (depends on core)

pub mod cli;
pub mod core;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::consumer::{ConsumerPipeline, DataConsumer};
pub use core::error::{ConsumeError, IngestError, Result};
pub use core::indexable::{Analyzer, Indexable, Interpreter, MutationRequest};
pub use core::services::Services;
pub use core::snapshot::{IndexReaderFactory, ReaderHandle, ReaderSet, SnapshotReaderProvider};
pub use core::storage::{IndexWriterHandle, StorageLocation};
pub use core::types::*;
pub use core::version::{CommitRecord, VersionTracker};
