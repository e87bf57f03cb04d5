//! # kkit - GENESIS kkit model exporter
//!
//! The binary for the kkit writer.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              apps/kkit (THE BINARY)           │
//! │                                               │
//! │   ┌────────────┐          ┌──────────────┐    │
//! │   │    CLI     │          │    Config    │    │
//! │   │   (clap)   │          │    (toml)    │    │
//! │   └─────┬──────┘          └──────┬───────┘    │
//! │         └───────────┬────────────┘            │
//! │                     ▼                         │
//! │             ┌───────────────┐                 │
//! │             │   kkit-core   │                 │
//! │             │  (THE WRITER) │                 │
//! │             └───────────────┘                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! kkit export -m model.json -o model.g
//! kkit status -m model.json --json-mode
//! ```

use clap::Parser;
use kkit::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // KKIT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("KKIT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_env("KKIT_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| cli.default_log_filter().into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
