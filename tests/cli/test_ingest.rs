//! Tests for the ingest command

use crate::common::{create_test_services, visible_bodies, EventLog};
use nrt_ingest::cli::commands::ingest::{execute, IngestArgs};
use nrt_ingest::cli::OutputFormat;
use nrt_ingest::VersionToken;

fn args(path: std::path::PathBuf) -> IngestArgs {
    IngestArgs {
        path,
        batch_size: None,
        pattern: None,
        analyzer: None,
        quiet: true,
    }
}

#[tokio::test]
async fn test_ingest_file_human() {
    let (services, _temp) = create_test_services();
    let log = EventLog::new();
    let file = log.write(
        "events.jsonl",
        &[
            r#"{"uid":"7","version":"v1","docs":[{"fields":{"body":"P1"}}]}"#,
            r#"{"uid":"7","version":"v2","docs":[{"fields":{"body":"P2"}}]}"#,
        ],
    );

    let result = execute(args(file), &services, OutputFormat::Human).await;
    assert!(result.is_ok(), "ingest should succeed: {:?}", result.err());

    assert_eq!(visible_bodies(&services.readers, "7"), vec!["P2"]);
    assert_eq!(
        services.readers.current_version(),
        Some(VersionToken::new("v2"))
    );
}

#[tokio::test]
async fn test_ingest_directory_in_batches_json() {
    let (services, _temp) = create_test_services();
    let log = EventLog::new();
    log.write(
        "a.jsonl",
        &[
            r#"{"uid":1,"version":"001","docs":[{"fields":{"body":"one"}}]}"#,
            r#"{"uid":2,"version":"002","docs":[{"fields":{"body":"two"}}]}"#,
        ],
    );
    log.write(
        "nested/b.jsonl",
        &[r#"{"uid":3,"version":"003","skip":true}"#],
    );
    log.write("ignored.txt", &["not an event"]);

    let mut ingest_args = args(log.path().to_path_buf());
    ingest_args.batch_size = Some(1);

    let result = execute(ingest_args, &services, OutputFormat::Json).await;
    assert!(result.is_ok(), "ingest should succeed: {:?}", result.err());

    let tracker = services.writer.tracker();
    assert_eq!(tracker.committed_version(), Some(VersionToken::new("003")));
    assert_eq!(visible_bodies(&services.readers, "1"), vec!["one"]);
    assert!(visible_bodies(&services.readers, "3").is_empty());
}

#[tokio::test]
async fn test_ingest_invalid_line_fails_before_writing() {
    let (services, _temp) = create_test_services();
    let log = EventLog::new();
    let file = log.write(
        "events.jsonl",
        &[r#"{"uid":"1","version":"v1"}"#, "{broken"],
    );

    let result = execute(args(file), &services, OutputFormat::Human).await;
    let err = result.unwrap_err().to_string();
    assert!(err.contains("events.jsonl:2"), "unexpected error: {err}");
    assert!(services.writer.tracker().last_committed().is_none());
}

#[tokio::test]
async fn test_ingest_unknown_analyzer_fails_batch() {
    let (services, _temp) = create_test_services();
    let log = EventLog::new();
    let file = log.write(
        "events.jsonl",
        &[r#"{"uid":"1","version":"v1","docs":[{"fields":{"body":"x"}}]}"#],
    );

    let mut ingest_args = args(file);
    ingest_args.analyzer = Some("no_such_analyzer".to_string());

    let result = execute(ingest_args, &services, OutputFormat::Human).await;
    assert!(result.is_err());
    assert!(services.writer.tracker().last_committed().is_none());
    assert_eq!(services.writer.pending_mutations(), 0);
}

#[tokio::test]
async fn test_ingest_missing_path() {
    let (services, temp) = create_test_services();
    let result = execute(
        args(temp.path().join("absent.jsonl")),
        &services,
        OutputFormat::Human,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_ingest_zero_batch_size() {
    let (services, _temp) = create_test_services();
    let log = EventLog::new();
    let file = log.write("events.jsonl", &[r#"{"uid":"1"}"#]);

    let mut ingest_args = args(file);
    ingest_args.batch_size = Some(0);
    assert!(execute(ingest_args, &services, OutputFormat::Human)
        .await
        .is_err());
}
