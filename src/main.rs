//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `db_export` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use db_export::initialization::init_logger_with;
use db_export::{run_export, Config, WorkState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    init_logger_with(
        config.log_level.clone().into(),
        config.log_format.clone(),
        config.log_file.as_deref(),
    )
    .context("Failed to initialize logger")?;

    match run_export(config).await {
        Ok(report) => {
            let delivered = report.delivered();
            println!(
                "Queued {} of {} record{} for {} destination{}, {} write{} delivered in {:.1}s",
                report.dispatched,
                report.records_read,
                if report.records_read == 1 { "" } else { "s" },
                report.destinations.len(),
                if report.destinations.len() == 1 { "" } else { "s" },
                delivered,
                if delivered == 1 { "" } else { "s" },
                report.elapsed_seconds
            );
            if !report.aborted.is_empty() {
                println!("Aborted before draining: {}", report.aborted.join(", "));
            }
            if report.work_state == WorkState::Error {
                eprintln!("db_export error: destinations could not be loaded, nothing was exported");
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("db_export error: {:#}", e);
            process::exit(1);
        }
    }
}
