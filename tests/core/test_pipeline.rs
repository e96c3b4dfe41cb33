//! Consumer pipeline behavior observed through fresh snapshots

use crate::common::{in_memory_writer, note, note_pipeline, visible_bodies, Note};
use nrt_ingest::{Analyzer, DataConsumer, DataEvent, SnapshotReaderProvider, VersionToken};
use std::sync::Arc;

fn skipped(uid: &str, version: &str) -> DataEvent<Note> {
    DataEvent::new(
        Note {
            uid: uid.to_string(),
            bodies: vec![],
            skip: true,
        },
        version,
    )
}

#[test]
fn test_same_uid_in_one_batch_shows_latest_only() {
    let writer = in_memory_writer();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let mut pipeline = note_pipeline(&writer);

    pipeline
        .consume(&[note("7", "P1", "v1"), note("7", "P2", "v2")])
        .unwrap();

    assert_eq!(visible_bodies(&provider, "7"), vec!["P2"]);
    assert_eq!(provider.current_version(), Some(VersionToken::new("v2")));
}

#[test]
fn test_retract_before_insert_across_batches() {
    let writer = in_memory_writer();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let mut pipeline = note_pipeline(&writer);

    let multi = DataEvent::new(
        Note {
            uid: "1".to_string(),
            bodies: vec!["a".to_string(), "b".to_string()],
            skip: false,
        },
        "v1",
    );
    pipeline.consume(&[multi, note("2", "other", "v1")]).unwrap();
    assert_eq!(visible_bodies(&provider, "1"), vec!["a", "b"]);

    pipeline.consume(&[note("1", "c", "v2")]).unwrap();
    assert_eq!(visible_bodies(&provider, "1"), vec!["c"]);
    assert_eq!(visible_bodies(&provider, "2"), vec!["other"]);
}

#[test]
fn test_empty_batch_leaves_version_unchanged() {
    let writer = in_memory_writer();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let mut pipeline = note_pipeline(&writer);

    pipeline.consume(&[note("1", "a", "v1")]).unwrap();
    provider.with_snapshot(|_| ()).unwrap();
    let sequence = writer.tracker().last_committed().unwrap().sequence;

    let outcome = pipeline.consume_batch(&[]).unwrap();
    assert_eq!(outcome.events, 0);
    assert!(outcome.committed_version.is_none());

    provider.with_snapshot(|_| ()).unwrap();
    assert_eq!(provider.current_version(), Some(VersionToken::new("v1")));
    assert_eq!(writer.tracker().last_committed().unwrap().sequence, sequence);
}

#[test]
fn test_version_last_wins() {
    let writer = in_memory_writer();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let mut pipeline = note_pipeline(&writer);

    pipeline
        .consume(&[note("1", "a", "v1"), note("2", "b", "v2"), note("3", "c", "v3")])
        .unwrap();

    let set = provider.open_readers().unwrap();
    assert_eq!(set.version, Some(VersionToken::new("v3")));
    assert_eq!(set.num_docs(), 3);
    provider.release_readers(set.readers);
    assert_eq!(provider.current_version(), Some(VersionToken::new("v3")));
}

#[test]
fn test_skipped_last_event_contributes_version_only() {
    let writer = in_memory_writer();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let mut pipeline = note_pipeline(&writer);

    let outcome = pipeline
        .consume_batch(&[note("1", "a", "v1"), skipped("2", "v2")])
        .unwrap();
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.retracted, 1);
    assert_eq!(outcome.committed_version, Some(VersionToken::new("v2")));

    assert!(visible_bodies(&provider, "2").is_empty());
    assert_eq!(provider.current_version(), Some(VersionToken::new("v2")));
}

#[test]
fn test_skip_does_not_retract_existing_document() {
    let writer = in_memory_writer();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let mut pipeline = note_pipeline(&writer);

    pipeline.consume(&[note("1", "kept", "v1")]).unwrap();
    pipeline.consume(&[skipped("1", "v2")]).unwrap();

    assert_eq!(visible_bodies(&provider, "1"), vec!["kept"]);
    assert_eq!(provider.current_version(), Some(VersionToken::new("v2")));
}

#[test]
fn test_replay_is_idempotent() {
    let writer = in_memory_writer();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let mut pipeline = note_pipeline(&writer);
    let batch = vec![note("1", "a", "v1"), note("2", "b", "v1"), note("1", "c", "v2")];

    pipeline.consume(&batch).unwrap();
    let once = (
        visible_bodies(&provider, "1"),
        visible_bodies(&provider, "2"),
        provider.open_readers().unwrap().num_docs(),
    );

    pipeline.consume(&batch).unwrap();
    let twice = (
        visible_bodies(&provider, "1"),
        visible_bodies(&provider, "2"),
        provider.open_readers().unwrap().num_docs(),
    );

    assert_eq!(once, twice);
    assert_eq!(once.2, 2);
}

#[test]
fn test_consume_after_shutdown_is_not_started() {
    let writer = in_memory_writer();
    let mut pipeline = note_pipeline(&writer);
    writer.shutdown();

    let err = pipeline.consume(&[note("1", "a", "v1")]).unwrap_err();
    assert!(err.source.is_not_started());
    assert_eq!(err.batch_len, 1);
    assert!(err.event_index.is_none());
    assert!(!err.is_retryable());
}

#[test]
fn test_failed_batch_reports_discarded_unversioned_work() {
    let writer = in_memory_writer();
    let provider = SnapshotReaderProvider::new(Arc::clone(&writer));
    let mut pipeline = note_pipeline(&writer);

    let unversioned = DataEvent::unversioned(Note {
        uid: "a".to_string(),
        bodies: vec!["kept for later".to_string()],
        skip: false,
    });
    let outcome = pipeline.consume_batch(&[unversioned]).unwrap();
    assert_eq!(outcome.inserted, 1);
    assert!(outcome.committed_version.is_none());
    assert_eq!(writer.pending_mutations(), 2);

    let mut failing =
        note_pipeline(&writer).with_default_analyzer(Analyzer::named("missing"));
    let err = failing.consume_batch(&[note("b", "x", "v1")]).unwrap_err();
    assert_eq!(err.event_index, Some(0));
    assert_eq!(err.discarded_pending, 2);
    assert!(err.to_string().contains("2 pending mutations"));
    assert_eq!(writer.pending_mutations(), 0);

    pipeline.consume(&[note("c", "y", "v2")]).unwrap();
    assert!(visible_bodies(&provider, "a").is_empty());
    assert!(visible_bodies(&provider, "b").is_empty());
    assert_eq!(visible_bodies(&provider, "c"), vec!["y"]);
    assert_eq!(provider.current_version(), Some(VersionToken::new("v2")));
}
