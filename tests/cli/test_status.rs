//! Tests for the status command

use crate::common::{create_test_services, EventLog};
use nrt_ingest::cli::commands::ingest::{self, IngestArgs};
use nrt_ingest::cli::commands::status::{execute, StatusArgs};
use nrt_ingest::cli::OutputFormat;
use nrt_ingest::WriterState;

#[tokio::test]
async fn test_status_on_empty_index() {
    let (services, _temp) = create_test_services();

    for format in [OutputFormat::Human, OutputFormat::Json] {
        let result = execute(StatusArgs { uid: None }, &services, format).await;
        assert!(result.is_ok(), "status should succeed: {:?}", result.err());
    }
    assert_eq!(services.writer.state(), WriterState::Started);
    assert!(services.readers.current_version().is_none());
}

#[tokio::test]
async fn test_status_after_ingest_with_uid() {
    let (services, _temp) = create_test_services();
    let log = EventLog::new();
    let file = log.write(
        "events.jsonl",
        &[r#"{"uid":"7","version":"v3","docs":[{"fields":{"body":"a"}},{"fields":{"body":"b"}}]}"#],
    );

    ingest::execute(
        IngestArgs {
            path: file,
            batch_size: None,
            pattern: None,
            analyzer: None,
            quiet: true,
        },
        &services,
        OutputFormat::Json,
    )
    .await
    .unwrap();

    let result = execute(
        StatusArgs {
            uid: Some("7".to_string()),
        },
        &services,
        OutputFormat::Json,
    )
    .await;
    assert!(result.is_ok(), "status should succeed: {:?}", result.err());
    assert_eq!(services.readers.open_reader_count(), 0);
}

#[tokio::test]
async fn test_status_after_shutdown_fails() {
    let (services, _temp) = create_test_services();
    services.writer.shutdown();

    let result = execute(StatusArgs { uid: None }, &services, OutputFormat::Human).await;
    assert!(result.is_err());
}
