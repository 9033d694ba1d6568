// Shared test helpers: in-memory data sinks and record builders.
//
// This module provides common utilities used across multiple test files to reduce duplication.

#![allow(dead_code)] // Each test file uses a different subset

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use db_export::sink::{BoundRow, Dialect, PreparedQuery};
use db_export::{
    ChannelEntry, DataSink, Event, ExportError, Exporter, ExporterOptions, Record, RecordKind,
    Snapshot,
};

/// Everything a [`RecordingSink`] observed.
#[derive(Debug, Default)]
pub struct SinkLog {
    pub connects: usize,
    pub disconnects: usize,
    pub write_attempts: usize,
    pub written: Vec<Record>,
    /// Parameter rows bound for each write, in write order
    pub rows: Vec<BoundRow>,
}

pub type SharedLog = Arc<Mutex<SinkLog>>;

/// What a sink does when asked to connect or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Connect and write succeed
    Healthy,
    /// Connect succeeds, every write fails
    FailingWrites,
    /// Every connect fails immediately
    Unreachable,
    /// Connect never completes
    HangingConnect,
    /// Connect succeeds, write never completes
    HangingWrite,
    /// Every write fails and releasing the broken connection reports an error
    FailingDisconnect,
}

/// In-memory sink that records what it was asked to do.
///
/// Writers are compiled with the real template compiler, so bound rows match
/// what a database sink would receive.
pub struct RecordingSink {
    name: String,
    behavior: Behavior,
    connected: bool,
    writers: Vec<PreparedQuery>,
    log: SharedLog,
}

impl RecordingSink {
    pub fn new(name: &str, behavior: Behavior) -> (Self, SharedLog) {
        let log = SharedLog::default();
        let sink = RecordingSink {
            name: name.to_string(),
            behavior,
            connected: false,
            writers: Vec::new(),
            log: Arc::clone(&log),
        };
        (sink, log)
    }
}

#[async_trait]
impl DataSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<(), ExportError> {
        match self.behavior {
            Behavior::Unreachable => Err(ExportError::Connection("host unreachable".to_string())),
            Behavior::HangingConnect => std::future::pending().await,
            _ => {
                self.connected = true;
                self.log.lock().unwrap().connects += 1;
                Ok(())
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), ExportError> {
        if self.connected {
            self.connected = false;
            self.log.lock().unwrap().disconnects += 1;
        }
        match self.behavior {
            Behavior::FailingDisconnect => {
                Err(ExportError::Disconnect("connection reset by peer".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn prepare_writer(
        &mut self,
        kind: RecordKind,
        template: Option<&str>,
    ) -> Result<(), ExportError> {
        let template = template.ok_or_else(|| ExportError::Configuration {
            kind,
            message: "write query is not set".to_string(),
        })?;
        self.writers
            .push(PreparedQuery::compile(kind, template, Dialect::Sqlite)?);
        Ok(())
    }

    async fn write(&mut self, record: &Record) -> Result<(), ExportError> {
        self.log.lock().unwrap().write_attempts += 1;

        match self.behavior {
            Behavior::FailingWrites | Behavior::FailingDisconnect => {
                return Err(ExportError::Write("constraint violation".to_string()))
            }
            Behavior::HangingWrite => {
                std::future::pending::<()>().await;
            }
            _ => {}
        }

        let rows = match self.writers.iter().find(|q| q.kind == record.kind()) {
            Some(query) => query.bind(record)?,
            None => Vec::new(),
        };

        let mut log = self.log.lock().unwrap();
        log.rows.extend(rows);
        log.written.push(record.clone());
        Ok(())
    }
}

pub const CURRENT_QUERY: &str =
    "INSERT INTO cur (ts, cnl, val, stat) VALUES (:timestamp, :channelNum, :value, :status)";
pub const ARCHIVE_QUERY: &str =
    "INSERT INTO arc (ts, cnl, val, stat) VALUES (:dateTime, :cnlNum, :val, :stat)";
pub const EVENT_QUERY: &str = "INSERT INTO ev (ts, cnl, old_val, new_val, descr) \
     VALUES (:timestamp, :channelNum, :oldValue, :newValue, :description)";

fn template(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::CurrentData => CURRENT_QUERY,
        RecordKind::ArchiveData => ARCHIVE_QUERY,
        RecordKind::Event => EVENT_QUERY,
    }
}

/// Options with millisecond-scale retry pacing.
pub fn fast_options() -> ExporterOptions {
    ExporterOptions {
        queue_capacity: 1_000,
        max_connect_failures: 3,
        retry_initial_delay: Duration::from_millis(2),
        retry_max_delay: Duration::from_millis(20),
    }
}

/// Builds an idle exporter over a recording sink exporting `kinds`.
pub fn recording_exporter(
    name: &str,
    behavior: Behavior,
    kinds: &[RecordKind],
    options: ExporterOptions,
) -> (Exporter, SharedLog) {
    let (mut sink, log) = RecordingSink::new(name, behavior);
    for kind in kinds {
        sink.prepare_writer(*kind, Some(template(*kind)))
            .expect("test templates compile");
    }
    let exporter = Exporter::new(Box::new(sink), kinds.to_vec(), options);
    (exporter, log)
}

pub fn timestamp(second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, second % 60)
        .unwrap()
}

/// Snapshot whose channels are `first..first + count` with value = channel / 10.
pub fn snapshot(second: u32, first: i32, count: i32) -> Snapshot {
    let channels = (first..first + count)
        .map(|channel_num| ChannelEntry {
            channel_num,
            value: f64::from(channel_num) / 10.0,
            status: channel_num % 3,
        })
        .collect();
    Snapshot::new(timestamp(second), channels)
}

pub fn event(second: u32, channel_num: i32) -> Event {
    Event {
        timestamp: timestamp(second),
        object_num: 1,
        device_num: 2,
        parameter_id: 3,
        channel_num,
        old_value: 0.0,
        old_status: 0,
        new_value: 1.0,
        new_status: 1,
        acknowledged: false,
        user_id: 0,
        description: format!("channel {} changed", channel_num),
        data: Vec::new(),
    }
}

/// Polls `condition` every few milliseconds until it holds or `limit` elapses.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
