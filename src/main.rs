//! Storefront Engine CLI
//!
//! Command-line interface for replaying store operations from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- ops.csv > accounts.csv
//! cargo run -- --report catalog ops.csv > catalog.csv
//! cargo run -- --return-window 600 --report returns ops.csv > returns.csv
//! ```
//!
//! The program reads operation records from the input CSV file, applies them
//! through the store engine, and writes the requested state report to stdout.
//! Rejected operations are logged to stderr and skipped; set `RUST_LOG` to
//! control verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Fatal error (missing arguments, file not found, I/O failure)

use std::process;
use storefront_engine::cli;
use storefront_engine::runner::Replay;
use tracing_subscriber::EnvFilter;

fn main() {
    // Reports go to stdout, so logging goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();
    let runner = Replay::new(args.to_store_config());

    let mut output = std::io::stdout();
    match runner.process(&args.input_file, args.report, &mut output) {
        Ok(summary) => {
            tracing::info!(
                "Applied {} operations, skipped {}",
                summary.applied,
                summary.skipped
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
