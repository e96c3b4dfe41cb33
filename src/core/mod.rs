//! Core ingestion logic (adapter-agnostic)
//!
//! # Architecture
//!
//! - **storage**: Schema, analyzer application and the writer handle
//! - **consumer**: Batch pipeline (retract, insert, one versioned commit)
//! - **snapshot**: Point-in-time readers over committed state
//! - **version**: Commit records and version tracking
//! - **indexable**: Interpreter contract and mutation requests
//! - **json_events**: JSON Lines event source
//! - **config**, **xdg**: Configuration (TOML + environment)
//! - **services**: Unified service container

pub mod config;
pub mod consumer;
pub mod error;
pub mod indexable;
pub mod json_events;
pub mod services;
pub mod snapshot;
pub mod storage;
pub mod types;
pub mod version;
pub mod xdg;

// Re-export key types for convenience
pub use config::Config;
pub use consumer::{ConsumerPipeline, DataConsumer};
pub use error::{ConsumeError, IngestError, Result};
pub use services::Services;
pub use snapshot::{IndexReaderFactory, ReaderHandle, ReaderSet, SnapshotReaderProvider};
