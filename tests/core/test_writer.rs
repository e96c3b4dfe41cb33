//! On-disk writer lifecycle through the pipeline and snapshot provider

use crate::common::{bodies_of, note, NoteInterpreter};
use nrt_ingest::core::config::WriterConfig;
use nrt_ingest::{
    Analyzer, ConsumerPipeline, IndexWriterHandle, SnapshotReaderProvider, StorageLocation,
    VersionToken, WriterState,
};
use std::sync::Arc;
use tantivy::collector::Count;
use tantivy::query::TermQuery;
use tantivy::schema::{IndexRecordOption, Term};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};
use tempfile::TempDir;

fn disk_writer(dir: &TempDir) -> Arc<IndexWriterHandle> {
    Arc::new(IndexWriterHandle::new(
        StorageLocation::Directory(dir.path().join("index")),
        NoteInterpreter::schema(),
        WriterConfig::default(),
    ))
}

fn body_hits(provider: &SnapshotReaderProvider, token: &str) -> usize {
    provider
        .with_snapshot(|set| {
            let reader = &set.readers[0];
            let body = reader.searcher().schema().get_field("body").unwrap();
            let query = TermQuery::new(
                Term::from_field_text(body, token),
                IndexRecordOption::Basic,
            );
            reader.searcher().search(&query, &Count).unwrap()
        })
        .unwrap()
}

#[test]
fn test_restart_restores_documents_and_version() {
    let dir = TempDir::new().unwrap();

    {
        let writer = disk_writer(&dir);
        writer.try_start().unwrap();
        let mut pipeline = ConsumerPipeline::new(
            Arc::clone(&writer),
            NoteInterpreter::new(writer.schema()),
        );
        pipeline
            .consume_batch(&[note("1", "first", "v1"), note("2", "second", "v7")])
            .unwrap();
        writer.shutdown();
    }

    let writer = disk_writer(&dir);
    writer.start();
    assert!(writer.is_started());

    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let set = provider.open_readers().unwrap();
    assert_eq!(set.version, Some(VersionToken::new("v7")));
    assert_eq!(bodies_of(&set.readers[0], "2"), vec!["second"]);
    provider.release_readers(set.readers);
}

#[test]
fn test_best_effort_start_on_locked_directory() {
    let dir = TempDir::new().unwrap();
    let first = disk_writer(&dir);
    first.try_start().unwrap();

    let second = disk_writer(&dir);
    second.start();
    assert_eq!(second.state(), WriterState::Unstarted);
    assert!(SnapshotReaderProvider::new(Arc::clone(&second))
        .open_readers()
        .unwrap()
        .is_empty());

    first.shutdown();
    second.try_start().unwrap();
    assert!(second.is_started());
}

#[test]
fn test_registered_analyzer_and_override() {
    let dir = TempDir::new().unwrap();
    let writer = disk_writer(&dir);
    writer.register_analyzer(
        "lower_simple",
        TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .build(),
    );
    writer.try_start().unwrap();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));

    let mut stemmed = ConsumerPipeline::new(
        Arc::clone(&writer),
        NoteInterpreter::new(writer.schema()),
    )
    .with_default_analyzer(Analyzer::named("en_stem"));
    stemmed
        .consume_batch(&[note("1", "Running Dogs", "v1")])
        .unwrap();
    assert_eq!(body_hits(&provider, "run"), 1);
    assert_eq!(body_hits(&provider, "running"), 0);

    let mut simple = ConsumerPipeline::new(
        Arc::clone(&writer),
        NoteInterpreter::new(writer.schema()),
    )
    .with_default_analyzer(Analyzer::named("lower_simple"));
    simple
        .consume_batch(&[note("1", "Running Dogs", "v2")])
        .unwrap();
    assert_eq!(body_hits(&provider, "running"), 1);
    assert_eq!(body_hits(&provider, "run"), 0);
}
