// Test helper functions

use crate::common::fixtures::{Note, NoteInterpreter};
use nrt_ingest::core::config::{Config, WriterConfig};
use nrt_ingest::{
    ConsumerPipeline, IndexWriterHandle, ReaderHandle, Services, SnapshotReaderProvider,
    StorageLocation,
};
use std::sync::Arc;
use tantivy::schema::Value;
use tempfile::TempDir;

/// Services over a temporary index directory (writer not started)
#[allow(dead_code)]
pub fn create_test_services() -> (Arc<Services>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.storage.index_dir = temp_dir.path().join("index");

    let services = Services::new(config).expect("valid config");
    (Arc::new(services), temp_dir)
}

/// Started in-memory writer over the note schema
#[allow(dead_code)]
pub fn in_memory_writer() -> Arc<IndexWriterHandle> {
    let writer = Arc::new(IndexWriterHandle::new(
        StorageLocation::InMemory,
        NoteInterpreter::schema(),
        WriterConfig::default(),
    ));
    writer.try_start().expect("in-memory writer starts");
    writer
}

#[allow(dead_code)]
pub fn note_pipeline(
    writer: &Arc<IndexWriterHandle>,
) -> ConsumerPipeline<Note, NoteInterpreter> {
    ConsumerPipeline::new(Arc::clone(writer), NoteInterpreter::new(writer.schema()))
}

/// Body values of the documents visible for `uid`, sorted
#[allow(dead_code)]
pub fn bodies_of(reader: &ReaderHandle, uid: &str) -> Vec<String> {
    let body = reader
        .searcher()
        .schema()
        .get_field("body")
        .expect("schema has body");
    let mut bodies: Vec<String> = reader
        .lookup(uid)
        .expect("lookup succeeds")
        .iter()
        .flat_map(|doc| {
            doc.get_all(body)
                .filter_map(|v| v.as_str().map(String::from))
                .collect::<Vec<_>>()
        })
        .collect();
    bodies.sort();
    bodies
}

/// Open a snapshot, read `uid`'s bodies, release the snapshot
#[allow(dead_code)]
pub fn visible_bodies(provider: &SnapshotReaderProvider, uid: &str) -> Vec<String> {
    provider
        .with_snapshot(|set| {
            set.readers
                .iter()
                .flat_map(|reader| bodies_of(reader, uid))
                .collect()
        })
        .expect("snapshot opens")
}
