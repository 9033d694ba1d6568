//! SQLite data sink.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};

use super::params::{Dialect, ParamValue, PreparedQuery};
use super::DataSink;
use crate::config::CONNECT_TIMEOUT;
use crate::error_handling::ExportError;
use crate::models::{Record, RecordKind};

/// Exports records into a SQLite database file.
///
/// The connection is a single-connection pool opened on [`DataSink::connect`]
/// and closed on [`DataSink::disconnect`]. The database file must already
/// exist; the sink never creates schema.
pub struct SqliteSink {
    name: String,
    options: SqliteConnectOptions,
    pool: Option<SqlitePool>,
    writers: HashMap<RecordKind, PreparedQuery>,
}

impl SqliteSink {
    /// Parses the connection URL (e.g. `sqlite:///data/export.db`).
    ///
    /// # Errors
    ///
    /// Returns `ExportError::ConnectionSettings` if the URL is not a valid
    /// SQLite connection string.
    pub fn new(name: String, connection: &str) -> Result<Self, ExportError> {
        let options = SqliteConnectOptions::from_str(connection)
            .map_err(|e| ExportError::ConnectionSettings(e.to_string()))?;

        Ok(SqliteSink {
            name,
            options,
            pool: None,
            writers: HashMap::new(),
        })
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: ParamValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        ParamValue::Null => query.bind(None::<i32>),
        ParamValue::Int(v) => query.bind(v),
        ParamValue::Float(v) => query.bind(v),
        ParamValue::Bool(v) => query.bind(v),
        ParamValue::Text(v) => query.bind(v),
        ParamValue::Bytes(v) => query.bind(v),
        ParamValue::Timestamp(v) => query.bind(v),
    }
}

fn write_error(e: sqlx::Error) -> ExportError {
    ExportError::Write(e.to_string())
}

#[async_trait]
impl DataSink for SqliteSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    async fn connect(&mut self) -> Result<(), ExportError> {
        if self.pool.is_some() {
            return Ok(());
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(self.options.clone())
            .await
            .map_err(|e| ExportError::Connection(e.to_string()))?;

        log::debug!("Connected to DB {}", self.name);
        self.pool = Some(pool);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ExportError> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            log::debug!("Disconnected from DB {}", self.name);
        }
        Ok(())
    }

    fn prepare_writer(
        &mut self,
        kind: RecordKind,
        template: Option<&str>,
    ) -> Result<(), ExportError> {
        let template = template
            .ok_or_else(|| ExportError::configuration(kind, "write query is not set"))?;
        let prepared = PreparedQuery::compile(kind, template, Dialect::Sqlite)?;
        self.writers.insert(kind, prepared);
        Ok(())
    }

    async fn write(&mut self, record: &Record) -> Result<(), ExportError> {
        let kind = record.kind();
        let query = self
            .writers
            .get(&kind)
            .ok_or_else(|| ExportError::Write(format!("{} export is not enabled", kind)))?;
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| ExportError::Write("not connected".to_string()))?;

        let rows = query.bind(record)?;
        if rows.is_empty() {
            return Ok(());
        }

        // one transaction per record: a snapshot lands whole or not at all
        let mut tx = pool.begin().await.map_err(write_error)?;
        for row in rows {
            let mut q = sqlx::query(&query.sql);
            for (_, value) in row {
                q = bind_value(q, value);
            }
            q.execute(&mut *tx).await.map_err(write_error)?;
        }
        tx.commit().await.map_err(write_error)?;

        Ok(())
    }
}
