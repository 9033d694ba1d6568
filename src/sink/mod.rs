//! Data sinks: one connection to one external store.
//!
//! The [`DataSink`] trait is the only seam between the export engine and a
//! store technology. A sink is exclusively owned by one exporter worker, so its
//! methods take `&mut self` and nothing else ever touches the connection.
//!
//! Implementations are selected by [`DataSourceKind`] in the destinations file.

mod params;
mod postgres;
mod sqlite;

use async_trait::async_trait;

use crate::config::{DataSourceKind, ExportDestination};
use crate::error_handling::ExportError;
use crate::models::{Record, RecordKind};

pub use params::{BoundRow, Dialect, Param, ParamValue, PreparedQuery};
pub use postgres::PostgresSink;
pub use sqlite::SqliteSink;

/// Connection to one external store.
///
/// # Contract
///
/// - `connect` is a no-op when already connected.
/// - `disconnect` may report a failure, but callers only log it: it runs during
///   best-effort cleanup and must never stop the caller.
/// - `prepare_writer` is called once per enabled kind before the sink is handed
///   to an exporter.
/// - `write` delivers one record. A failed write is not retried by the caller.
#[async_trait]
pub trait DataSink: Send {
    /// Display name of the destination (used in logs and the status report)
    fn name(&self) -> &str;

    /// Whether a connection is currently held
    fn is_connected(&self) -> bool;

    /// Establishes the external connection.
    async fn connect(&mut self) -> Result<(), ExportError>;

    /// Releases the connection.
    async fn disconnect(&mut self) -> Result<(), ExportError>;

    /// Compiles the write operation of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Configuration` when `template` is missing or invalid.
    fn prepare_writer(&mut self, kind: RecordKind, template: Option<&str>)
        -> Result<(), ExportError>;

    /// Binds `record` to the prepared operation of its kind and executes it.
    async fn write(&mut self, record: &Record) -> Result<(), ExportError>;
}

/// Builds the sink of a destination and prepares a writer for every enabled kind.
///
/// # Errors
///
/// Returns the first initialization error; the caller excludes the destination.
pub fn build_sink(dest: &ExportDestination) -> Result<Box<dyn DataSink>, ExportError> {
    let mut sink: Box<dyn DataSink> = match dest.kind {
        DataSourceKind::Sqlite => Box::new(SqliteSink::new(dest.display_name(), &dest.connection)?),
        DataSourceKind::Postgres => {
            Box::new(PostgresSink::new(dest.display_name(), &dest.connection)?)
        }
    };

    for kind in enabled_kinds(dest) {
        sink.prepare_writer(kind, dest.export.query(kind))?;
    }

    Ok(sink)
}

/// Record kinds enabled for a destination.
pub fn enabled_kinds(dest: &ExportDestination) -> Vec<RecordKind> {
    use strum::IntoEnumIterator;

    RecordKind::iter()
        .filter(|kind| dest.export.is_enabled(*kind))
        .collect()
}

/// Disconnects a sink, logging instead of propagating a failure.
pub async fn disconnect_logged(sink: &mut dyn DataSink) {
    if let Err(e) = sink.disconnect().await {
        log::error!("Error disconnecting from DB {}: {}", sink.name(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportParams;

    fn destination(kind: DataSourceKind, connection: &str, export: ExportParams) -> ExportDestination {
        ExportDestination {
            name: "test".to_string(),
            kind,
            connection: connection.to_string(),
            export,
        }
    }

    #[test]
    fn test_build_sink_prepares_enabled_kinds() {
        let dest = destination(
            DataSourceKind::Sqlite,
            "sqlite://export.db",
            ExportParams {
                current_data: true,
                current_data_query: "INSERT INTO t VALUES (:channelNum)".to_string(),
                ..Default::default()
            },
        );

        let sink = build_sink(&dest).unwrap();
        assert_eq!(sink.name(), "test (SQLite)");
        assert!(!sink.is_connected());
        assert_eq!(enabled_kinds(&dest), vec![RecordKind::CurrentData]);
    }

    #[test]
    fn test_build_sink_rejects_missing_query() {
        let dest = destination(
            DataSourceKind::Postgres,
            "postgres://localhost/scada",
            ExportParams {
                events: true,
                ..Default::default()
            },
        );

        let err = build_sink(&dest).err().unwrap();
        assert!(matches!(
            err,
            ExportError::Configuration {
                kind: RecordKind::Event,
                ..
            }
        ));
    }

    #[test]
    fn test_build_sink_rejects_bad_connection_string() {
        let dest = destination(
            DataSourceKind::Postgres,
            "not a url",
            ExportParams::default(),
        );

        assert!(matches!(
            build_sink(&dest),
            Err(ExportError::ConnectionSettings(_))
        ));
    }
}
