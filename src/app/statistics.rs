//! Final statistics logging.

use log::{info, warn};

use crate::error_handling::ExportCounter;
use crate::exporter::ExporterStatus;
use crate::supervisor::StopReport;

/// Logs per-destination counters and the shutdown outcome.
pub fn log_final_statistics(dispatched: usize, statuses: &[ExporterStatus], stop: &StopReport) {
    info!("Records dispatched: {}", dispatched);

    for status in statuses {
        info!(
            "{}: {} sent, {} write errors, {} dropped, {} evicted",
            status.name,
            status.counter(ExportCounter::Sent),
            status.counter(ExportCounter::WriteFailed),
            status.counter(ExportCounter::Dropped),
            status.counter(ExportCounter::Evicted)
        );
    }

    if !stop.aborted.is_empty() {
        warn!(
            "Aborted before draining their queue: {}",
            stop.aborted.join(", ")
        );
    }
}
