//! Query templates and parameter binding.
//!
//! A query template is plain SQL with named placeholders (`:name` or `@name`).
//! Compiling a template resolves every placeholder to a record field and
//! rewrites it into the positional form of the target dialect. Binding a record
//! then yields one row of values per execution: one row per channel entry for
//! snapshots, a single row for events.

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error_handling::ExportError;
use crate::models::{ChannelEntry, Event, Record, RecordKind, Snapshot};

/// Matches, in order of precedence: line and block comments, quoted strings,
/// quoted identifiers, `::` casts, and named placeholders (capture group 1).
const PLACEHOLDER_PATTERN: &str =
    r#"--[^\n]*|/\*(?s:.*?)\*/|'(?:[^']|'')*'|"(?:[^"]|"")*"|::|[:@]([A-Za-z_][A-Za-z0-9_]*)"#;

/// Record field that can appear as a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Timestamp,
    ChannelNum,
    Value,
    Status,
    ObjectNum,
    DeviceNum,
    ParameterId,
    OldValue,
    OldStatus,
    NewValue,
    NewStatus,
    Acknowledged,
    UserId,
    Description,
    Data,
}

impl Param {
    /// Resolves a placeholder name. Matching is case-insensitive and accepts
    /// the legacy short names (`cnlNum`, `val`, `kpNum`, ...).
    pub fn from_name(name: &str) -> Option<Param> {
        let param = match name.to_ascii_lowercase().as_str() {
            "timestamp" | "datetime" => Param::Timestamp,
            "channelnum" | "cnlnum" => Param::ChannelNum,
            "value" | "val" => Param::Value,
            "status" | "stat" => Param::Status,
            "objectnum" | "objnum" => Param::ObjectNum,
            "devicenum" | "kpnum" => Param::DeviceNum,
            "parameterid" | "paramid" => Param::ParameterId,
            "oldvalue" | "oldcnlval" => Param::OldValue,
            "oldstatus" | "oldcnlstat" => Param::OldStatus,
            "newvalue" | "newcnlval" => Param::NewValue,
            "newstatus" | "newcnlstat" => Param::NewStatus,
            "acknowledged" | "checked" => Param::Acknowledged,
            "userid" => Param::UserId,
            "description" | "descr" => Param::Description,
            "data" => Param::Data,
            _ => return None,
        };
        Some(param)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Param::Timestamp => "timestamp",
            Param::ChannelNum => "channelNum",
            Param::Value => "value",
            Param::Status => "status",
            Param::ObjectNum => "objectNum",
            Param::DeviceNum => "deviceNum",
            Param::ParameterId => "parameterId",
            Param::OldValue => "oldValue",
            Param::OldStatus => "oldStatus",
            Param::NewValue => "newValue",
            Param::NewStatus => "newStatus",
            Param::Acknowledged => "acknowledged",
            Param::UserId => "userId",
            Param::Description => "description",
            Param::Data => "data",
        }
    }

    /// Whether the field exists on records of `kind`.
    pub fn applies_to(&self, kind: RecordKind) -> bool {
        match kind {
            RecordKind::CurrentData | RecordKind::ArchiveData => matches!(
                self,
                Param::Timestamp | Param::ChannelNum | Param::Value | Param::Status
            ),
            RecordKind::Event => !matches!(self, Param::Value | Param::Status),
        }
    }

    fn from_snapshot(&self, snapshot: &Snapshot, entry: &ChannelEntry) -> ParamValue {
        match self {
            Param::Timestamp => ParamValue::Timestamp(snapshot.timestamp),
            Param::ChannelNum => ParamValue::Int(entry.channel_num),
            Param::Value => ParamValue::Float(entry.value),
            Param::Status => ParamValue::Int(entry.status),
            // compile() rejects event-only params for snapshot queries
            _ => ParamValue::Null,
        }
    }

    fn from_event(&self, ev: &Event) -> ParamValue {
        match self {
            Param::Timestamp => ParamValue::Timestamp(ev.timestamp),
            Param::ChannelNum => ParamValue::Int(ev.channel_num),
            Param::ObjectNum => ParamValue::Int(ev.object_num),
            Param::DeviceNum => ParamValue::Int(ev.device_num),
            Param::ParameterId => ParamValue::Int(ev.parameter_id),
            Param::OldValue => ParamValue::Float(ev.old_value),
            Param::OldStatus => ParamValue::Int(ev.old_status),
            Param::NewValue => ParamValue::Float(ev.new_value),
            Param::NewStatus => ParamValue::Int(ev.new_status),
            Param::Acknowledged => ParamValue::Bool(ev.acknowledged),
            Param::UserId => ParamValue::Int(ev.user_id),
            Param::Description => ParamValue::Text(ev.description.clone()),
            Param::Data => ParamValue::Bytes(ev.data.clone()),
            Param::Value | Param::Status => ParamValue::Null,
        }
    }
}

/// A value bound to one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Int(i32),
    Float(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
}

/// Values for one execution of a prepared query, in placeholder order.
pub type BoundRow = Vec<(Param, ParamValue)>;

/// Positional placeholder syntax of the target store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `?` for every placeholder
    Sqlite,
    /// `$1`, `$2`, ...
    Postgres,
}

/// A template compiled for one record kind.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub kind: RecordKind,
    pub sql: String,
    pub params: Vec<Param>,
}

impl PreparedQuery {
    /// Compiles `template` for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Configuration` if the template is empty, names an
    /// unknown placeholder, or names a field that records of `kind` do not have.
    pub fn compile(
        kind: RecordKind,
        template: &str,
        dialect: Dialect,
    ) -> Result<Self, ExportError> {
        if template.trim().is_empty() {
            return Err(ExportError::configuration(kind, "write query is not set"));
        }

        let re = Regex::new(PLACEHOLDER_PATTERN)
            .map_err(|e| ExportError::configuration(kind, e.to_string()))?;

        let mut sql = String::with_capacity(template.len());
        let mut params = Vec::new();
        let mut last = 0;

        for caps in re.captures_iter(template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            sql.push_str(&template[last..whole.start()]);
            last = whole.end();

            let Some(name) = caps.get(1) else {
                // comment, literal, quoted identifier or cast
                sql.push_str(whole.as_str());
                continue;
            };

            let param = Param::from_name(name.as_str()).ok_or_else(|| {
                ExportError::configuration(
                    kind,
                    format!("unknown query parameter '{}'", name.as_str()),
                )
            })?;
            if !param.applies_to(kind) {
                return Err(ExportError::configuration(
                    kind,
                    format!("parameter '{}' is not available for {}", name.as_str(), kind),
                ));
            }

            params.push(param);
            match dialect {
                Dialect::Sqlite => sql.push('?'),
                Dialect::Postgres => sql.push_str(&format!("${}", params.len())),
            }
        }
        sql.push_str(&template[last..]);

        Ok(PreparedQuery { kind, sql, params })
    }

    /// Binds a record to this query.
    ///
    /// Snapshots produce one row per channel entry (an empty snapshot produces
    /// no rows); events produce exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Write` if the record kind does not match the query.
    pub fn bind(&self, record: &Record) -> Result<Vec<BoundRow>, ExportError> {
        if record.kind() != self.kind {
            return Err(ExportError::Write(format!(
                "{} record cannot be written with the {} query",
                record.kind(),
                self.kind
            )));
        }

        let rows = match record {
            Record::CurrentSnapshot(snapshot) | Record::ArchivedSnapshot(snapshot) => snapshot
                .channels
                .iter()
                .map(|entry| {
                    self.params
                        .iter()
                        .map(|p| (*p, p.from_snapshot(snapshot, entry)))
                        .collect()
                })
                .collect(),
            Record::Event(ev) => vec![self.params.iter().map(|p| (*p, p.from_event(ev))).collect()],
        };

        Ok(rows)
    }
}
