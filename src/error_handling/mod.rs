//! Error handling and export statistics.
//!
//! This module provides:
//! - The export error taxonomy (configuration, connection, write, disconnect)
//! - Initialization errors
//! - Per-exporter counters
//! - Reconnect backoff
//!
//! Errors from one destination are always contained in that destination: they
//! are logged and counted, never propagated to the supervisor or other
//! destinations.

mod retry;
mod stats;
mod types;

// Re-export public API
pub use retry::reconnect_strategy;
pub use stats::ExportStats;
pub use types::{ConfigError, ExportCounter, ExportError, InitializationError};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;
    use strum::IntoEnumIterator;

    #[test]
    fn test_export_stats_initialization() {
        let stats = ExportStats::new();
        for counter in ExportCounter::iter() {
            assert_eq!(stats.get(counter), 0);
        }
    }

    #[test]
    fn test_export_stats_increment() {
        let stats = ExportStats::new();
        stats.increment(ExportCounter::Sent);
        stats.increment(ExportCounter::Sent);
        stats.add(ExportCounter::Evicted, 5);

        assert_eq!(stats.get(ExportCounter::Sent), 2);
        assert_eq!(stats.get(ExportCounter::Evicted), 5);
        assert_eq!(stats.get(ExportCounter::WriteFailed), 0);
    }

    #[test]
    fn test_export_stats_snapshot_order() {
        let stats = ExportStats::new();
        stats.increment(ExportCounter::Rejected);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.len(), ExportCounter::iter().count());
        assert_eq!(snapshot[0], (ExportCounter::Sent, 0));
        assert_eq!(snapshot.last(), Some(&(ExportCounter::Rejected, 1)));
    }

    #[test]
    fn test_configuration_error_message() {
        let err = ExportError::configuration(RecordKind::Event, "query is empty");
        assert_eq!(err.to_string(), "Configuration error for event: query is empty");
    }
}
