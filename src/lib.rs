//! db_export library: exports SCADA data to external SQL databases
//!
//! This library fans current-data snapshots, archived snapshots and events out
//! to any number of configured destinations. Each destination gets its own
//! bounded queue and background worker, so a slow or unreachable store never
//! blocks the producer or the other destinations.
//!
//! # Example
//!
//! ```no_run
//! use db_export::{Config, run_export};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     input: PathBuf::from("records.jsonl"),
//!     destinations: PathBuf::from("db_export.toml"),
//!     ..Default::default()
//! };
//!
//! let report = run_export(config).await?;
//! println!("Read {} records, dispatched {}", report.records_read, report.dispatched);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod config;
pub mod error_handling;
pub mod exporter;
pub mod initialization;
pub mod models;
pub mod sink;
pub mod status_report;
pub mod supervisor;

// Re-export public API
pub use config::{Config, DestinationsConfig, ExportDestination, LogFormat, LogLevel};
pub use error_handling::{ExportCounter, ExportError};
pub use exporter::{Exporter, ExporterOptions, ExporterState, ExporterStatus};
pub use models::{ChannelEntry, Event, Record, RecordKind, Snapshot};
pub use run::{run_export, ExportReport};
pub use sink::DataSink;
pub use status_report::StatusReporter;
pub use supervisor::{StopReport, Supervisor, WorkState};

// Internal run module (wires input, supervisor and status report together)
mod run {
    use anyhow::Result;
    use log::{error, info, warn};

    use crate::app::{
        cancel_on_ctrl_c, log_final_statistics, open_input, parse_record_line,
        shutdown_gracefully,
    };
    use crate::config::{Config, MODULE_NAME};
    use crate::error_handling::ExportCounter;
    use crate::exporter::{ExporterOptions, ExporterStatus};
    use crate::initialization::init_destinations;
    use crate::status_report::{publish, StatusReporter};
    use crate::supervisor::{Supervisor, WorkState};

    /// Results of an export run.
    #[derive(Debug, Clone)]
    pub struct ExportReport {
        /// Module state for the run (`Error` when the destinations could not be loaded)
        pub work_state: WorkState,
        /// Records parsed from the input
        pub records_read: usize,
        /// Records queued by at least one destination
        pub dispatched: usize,
        /// Final status of every destination
        pub destinations: Vec<ExporterStatus>,
        /// Destinations aborted at shutdown because their queue did not drain in time
        pub aborted: Vec<String>,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    impl ExportReport {
        /// Records written successfully, summed over all destinations.
        pub fn delivered(&self) -> usize {
            self.destinations
                .iter()
                .map(|status| status.counter(ExportCounter::Sent))
                .sum()
        }
    }

    /// Runs an export with the provided configuration.
    ///
    /// Loads the destinations, starts one exporter per usable destination and
    /// the status reporter, then dispatches every record read from the input.
    /// End of input or Ctrl-C stops all exporters within the configured stop
    /// timeout.
    ///
    /// A destinations file that cannot be loaded is not an error of the run:
    /// the module goes to the `error` state, writes one status report and
    /// exports nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened.
    pub async fn run_export(config: Config) -> Result<ExportReport> {
        let start_time = std::time::Instant::now();
        info!("{}", "=".repeat(60));
        info!("Start {} module", MODULE_NAME);

        let destinations = match init_destinations(&config.destinations) {
            Ok(destinations) => destinations,
            Err(e) => {
                error!("{}. Normal module execution is impossible", e);
                let supervisor = Supervisor::failed();
                publish(&supervisor.registry(), &config.status_file).await;
                info!("Stop {} module", MODULE_NAME);
                return Ok(ExportReport {
                    work_state: WorkState::Error,
                    records_read: 0,
                    dispatched: 0,
                    destinations: Vec::new(),
                    aborted: Vec::new(),
                    elapsed_seconds: start_time.elapsed().as_secs_f64(),
                });
            }
        };

        let mut lines = open_input(&config.input).await?;

        let supervisor =
            Supervisor::start_all(&destinations.destinations, &ExporterOptions::from(&config));
        let reporter = StatusReporter::spawn(
            supervisor.registry(),
            config.status_file.clone(),
            config.status_interval(),
        );
        let interrupt = cancel_on_ctrl_c();

        let mut line_no = 0usize;
        let mut records_read = 0usize;
        let mut dispatched = 0usize;
        loop {
            let line = tokio::select! {
                biased;
                _ = interrupt.cancelled() => break,
                line = lines.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read input, stopping: {e}");
                    break;
                }
            };
            line_no += 1;

            let Some(record) = parse_record_line(&line, line_no) else {
                continue;
            };
            records_read += 1;
            if supervisor.dispatch(record) > 0 {
                dispatched += 1;
            }
        }

        info!("Input finished after {} records, stopping exporters", records_read);
        let stop = shutdown_gracefully(&supervisor, reporter, config.stop_timeout()).await;
        let statuses = supervisor.registry().statuses();
        log_final_statistics(dispatched, &statuses, &stop);
        info!("Stop {} module", MODULE_NAME);

        Ok(ExportReport {
            work_state: supervisor.work_state(),
            records_read,
            dispatched,
            destinations: statuses,
            aborted: stop.aborted,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }
}
