//! nrt-ingest CLI
//!
//! # Examples
//!
//! ```bash
//! # Ingest every *.jsonl file under a directory, 500 events per commit
//! nrt-ingest ingest ./events --batch-size 500
//!
//! # Committed version and document count
//! nrt-ingest status --uid 7
//!
//! # Show configuration
//! nrt-ingest show-config --all
//! ```

use clap::Parser;
use nrt_ingest::cli::{output, run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logs go to stderr so JSON output on stdout stays parseable
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "nrt_ingest=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}
