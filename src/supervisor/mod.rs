//! Export supervisor.
//!
//! Creates one [`Exporter`] per usable destination, fans records out to them
//! and coordinates shutdown: a graceful drain bounded by a timeout, then an
//! abort of whatever is still running.

mod registry;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{ExportDestination, ABORT_GRACE, STOP_POLL_INTERVAL};
use crate::exporter::{Exporter, ExporterOptions, ExporterState};
use crate::models::{Event, Record, Snapshot};
use crate::sink::{build_sink, enabled_kinds};

pub use registry::{Registry, WorkState};

/// Outcome of [`Supervisor::stop_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopReport {
    /// Exporters that drained their queue
    pub terminated: Vec<String>,
    /// Exporters aborted after the timeout
    pub aborted: Vec<String>,
    /// Aborted exporters whose worker had not finished after the abort grace period
    pub detached: Vec<String>,
}

impl StopReport {
    /// True when every exporter drained gracefully.
    pub fn is_clean(&self) -> bool {
        self.aborted.is_empty() && self.detached.is_empty()
    }
}

/// Owns the exporter registry for the lifetime of an export run.
pub struct Supervisor {
    registry: Arc<Registry>,
}

impl Supervisor {
    /// Builds and starts an exporter for every destination whose sink can be
    /// initialized. A destination that fails is logged and skipped; the others
    /// are unaffected.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_all(destinations: &[ExportDestination], options: &ExporterOptions) -> Self {
        let mut exporters = Vec::with_capacity(destinations.len());

        for dest in destinations {
            match build_sink(dest) {
                Ok(sink) => {
                    exporters.push(Exporter::new(sink, enabled_kinds(dest), options.clone()));
                }
                Err(e) => {
                    log::error!(
                        "Error initializing data source {}: {}",
                        dest.display_name(),
                        e
                    );
                }
            }
        }

        if exporters.is_empty() {
            log::warn!("No data sources to export to");
        }

        Self::with_exporters(exporters)
    }

    /// Starts the given exporters and takes ownership of them.
    pub fn with_exporters(exporters: Vec<Exporter>) -> Self {
        for exporter in &exporters {
            exporter.start();
        }

        Supervisor {
            registry: Arc::new(Registry::new(WorkState::Normal, exporters)),
        }
    }

    /// A supervisor with no exporters whose work state is `error`. Every
    /// dispatch is ignored.
    pub fn failed() -> Self {
        Supervisor {
            registry: Arc::new(Registry::new(WorkState::Error, Vec::new())),
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn work_state(&self) -> WorkState {
        self.registry.work_state()
    }

    /// Offers `record` to every exporter. Exporters that do not export its kind,
    /// or are no longer running, drop it. Returns how many exporters queued it.
    ///
    /// Never blocks beyond each exporter's queue lock.
    pub fn dispatch(&self, record: Record) -> usize {
        if self.registry.work_state() == WorkState::Error {
            return 0;
        }

        let record = Arc::new(record);
        self.registry
            .exporters()
            .iter()
            .filter(|exporter| exporter.enqueue(Arc::clone(&record)))
            .count()
    }

    pub fn dispatch_current_data(&self, snapshot: Snapshot) -> usize {
        self.dispatch(Record::CurrentSnapshot(snapshot))
    }

    pub fn dispatch_archive_data(&self, snapshot: Snapshot) -> usize {
        self.dispatch(Record::ArchivedSnapshot(snapshot))
    }

    pub fn dispatch_event(&self, event: Event) -> usize {
        self.dispatch(Record::Event(event))
    }

    /// Dispatches the `channel_nums` subset of a freshly processed snapshot,
    /// stamped with the local capture time.
    pub fn dispatch_current_channels(&self, channel_nums: &[i32], source: &Snapshot) -> usize {
        let now = chrono::Local::now().naive_local();
        self.dispatch_current_data(Snapshot::restrict(now, channel_nums, source))
    }

    /// Dispatches the `channel_nums` subset of an archived snapshot, keeping
    /// its original timestamp.
    pub fn dispatch_archive_channels(&self, channel_nums: &[i32], source: &Snapshot) -> usize {
        self.dispatch_archive_data(Snapshot::restrict(source.timestamp, channel_nums, source))
    }

    /// Stops every exporter.
    ///
    /// Each exporter is asked to drain; states are polled until all are done or
    /// `timeout` elapses, then stragglers are aborted. Returns within roughly
    /// `timeout` plus the abort grace period whatever the destinations do.
    ///
    /// Sinks are owned by the exporter workers, so no connection is held here
    /// that would need closing first.
    pub async fn stop_all(&self, timeout: Duration) -> StopReport {
        let exporters = self.registry.exporters();
        for exporter in exporters {
            exporter.terminate();
        }

        let deadline = Instant::now() + timeout;
        while !self.registry.all_done() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(STOP_POLL_INTERVAL.min(deadline - now)).await;
        }

        let mut report = StopReport::default();
        for exporter in exporters {
            if exporter.state().is_terminal() {
                continue;
            }
            log::warn!(
                "Exporter {} did not stop within {:?}, aborting it",
                exporter.name(),
                timeout
            );
            exporter.abort();
        }

        let joined = futures::future::join_all(
            exporters.iter().map(|exporter| exporter.join(ABORT_GRACE)),
        )
        .await;

        for (exporter, finished) in exporters.iter().zip(joined) {
            let name = exporter.name().to_string();
            if exporter.state() == ExporterState::Aborted {
                if !finished {
                    report.detached.push(name.clone());
                }
                report.aborted.push(name);
            } else {
                report.terminated.push(name);
            }
        }

        report
    }
}
