//! Unified service container
//!
//! Wires one writer handle and its snapshot reader provider from a
//! [`Config`]. Adapters (the CLI, tests, embedding applications) share
//! these through `Arc`s.

use crate::core::config::Config;
use crate::core::consumer::ConsumerPipeline;
use crate::core::error::Result;
use crate::core::indexable::Analyzer;
use crate::core::json_events::{JsonEvent, JsonInterpreter};
use crate::core::snapshot::SnapshotReaderProvider;
use crate::core::storage::{create_schema, IndexWriterHandle, StorageLocation};
use std::sync::Arc;

/// Unified services container
#[derive(Clone)]
pub struct Services {
    /// Single writer over the configured index
    pub writer: Arc<IndexWriterHandle>,

    /// Snapshot readers over the writer's commits
    pub readers: Arc<SnapshotReaderProvider>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services over the configured index directory
    ///
    /// The writer is left unstarted.
    pub fn new(config: Config) -> Result<Self> {
        let location = StorageLocation::Directory(config.storage.index_dir.clone());
        Self::with_location(config, location)
    }

    /// Create services over an explicit storage location
    pub fn with_location(config: Config, location: StorageLocation) -> Result<Self> {
        config.validate()?;
        let schema = create_schema(&config.ingest.text_fields)?;

        let writer = Arc::new(IndexWriterHandle::new(
            location,
            schema,
            config.writer.clone(),
        ));
        let readers = Arc::new(SnapshotReaderProvider::new(Arc::clone(&writer)));

        Ok(Self {
            writer,
            readers,
            config: Arc::new(config),
        })
    }

    /// Create a JSON event pipeline using the configured default analyzer
    pub fn create_pipeline(&self) -> Result<ConsumerPipeline<JsonEvent, JsonInterpreter>> {
        let interpreter = JsonInterpreter::new(self.writer.schema().clone())?;
        Ok(ConsumerPipeline::new(Arc::clone(&self.writer), interpreter)
            .with_default_analyzer(Analyzer::named(self.config.ingest.default_analyzer.as_str())))
    }
}
