//! Tests for show-config and completions

use crate::common::create_test_services;
use clap_complete::Shell;
use nrt_ingest::cli::commands::completions::write_completions;
use nrt_ingest::cli::commands::config::{execute, ConfigArgs};
use nrt_ingest::cli::OutputFormat;
use nrt_ingest::core::xdg::XdgDirs;

#[tokio::test]
async fn test_show_config_formats() {
    let (services, _temp) = create_test_services();
    let xdg = XdgDirs::new();

    for (all, format) in [
        (false, OutputFormat::Human),
        (true, OutputFormat::Human),
        (true, OutputFormat::Json),
    ] {
        let result = execute(ConfigArgs { all }, &services, &xdg, format).await;
        assert!(result.is_ok(), "show-config should succeed: {:?}", result.err());
    }
}

#[test]
fn test_completions_mention_subcommands() {
    let mut out = Vec::new();
    write_completions(Shell::Bash, &mut out);
    let script = String::from_utf8(out).unwrap();

    assert!(script.contains("nrt-ingest"));
    assert!(script.contains("ingest"));
    assert!(script.contains("show-config"));
}
