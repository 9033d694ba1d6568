//! Record types flowing from the host to the export destinations.
//!
//! A [`Record`] is one of three kinds: a current-data snapshot, an archived-data
//! snapshot, or a discrete event. Records are immutable once handed to the
//! supervisor; the same record is shared (via `Arc`) by every exporter queue it
//! is fanned out to.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

/// The three record kinds a destination can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Snapshot of current channel data, produced as the host processes it
    CurrentData,
    /// Snapshot of archived channel data
    ArchiveData,
    /// Discrete channel event
    Event,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::CurrentData => "current data",
            RecordKind::ArchiveData => "archive data",
            RecordKind::Event => "event",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value and status of one channel at the snapshot instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub channel_num: i32,
    pub value: f64,
    pub status: i32,
}

/// Timestamped set of channel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub channels: Vec<ChannelEntry>,
}

impl Snapshot {
    pub fn new(timestamp: NaiveDateTime, channels: Vec<ChannelEntry>) -> Self {
        Snapshot {
            timestamp,
            channels,
        }
    }

    /// Looks up the entry of a channel.
    pub fn channel(&self, channel_num: i32) -> Option<&ChannelEntry> {
        self.channels.iter().find(|c| c.channel_num == channel_num)
    }

    /// Builds a snapshot holding exactly `channel_nums`, in that order, taking
    /// values from `source`.
    ///
    /// Channels absent from `source` are exported with value `0.0` and status `0`.
    pub fn restrict(timestamp: NaiveDateTime, channel_nums: &[i32], source: &Snapshot) -> Self {
        let channels = channel_nums
            .iter()
            .map(|&channel_num| match source.channel(channel_num) {
                Some(entry) => *entry,
                None => ChannelEntry {
                    channel_num,
                    value: 0.0,
                    status: 0,
                },
            })
            .collect();

        Snapshot {
            timestamp,
            channels,
        }
    }
}

/// Discrete notification of a channel value transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: NaiveDateTime,
    pub object_num: i32,
    pub device_num: i32,
    pub parameter_id: i32,
    pub channel_num: i32,
    pub old_value: f64,
    pub old_status: i32,
    pub new_value: f64,
    pub new_status: i32,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub user_id: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// One exported record.
///
/// JSON form is externally tagged, e.g. `{"current_snapshot": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Record {
    CurrentSnapshot(Snapshot),
    ArchivedSnapshot(Snapshot),
    Event(Event),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::CurrentSnapshot(_) => RecordKind::CurrentData,
            Record::ArchivedSnapshot(_) => RecordKind::ArchiveData,
            Record::Event(_) => RecordKind::Event,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Record::CurrentSnapshot(s) | Record::ArchivedSnapshot(s) => s.timestamp,
            Record::Event(e) => e.timestamp,
        }
    }
}
