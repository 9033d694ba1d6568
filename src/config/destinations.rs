//! Export destinations file.
//!
//! Destinations are described in TOML:
//!
//! ```toml
//! [[destination]]
//! name = "archive"
//! kind = "sqlite"
//! connection = "sqlite:///var/lib/scada/export.db"
//!
//! [destination.export]
//! current_data = true
//! current_data_query = "INSERT INTO cur_data (ts, cnl, val, stat) VALUES (:timestamp, :channelNum, :value, :status)"
//! events = true
//! event_query = "INSERT INTO events (ts, cnl, new_val) VALUES (@timestamp, @channelNum, @newValue)"
//! ```
//!
//! The file is read once at startup; destinations are never reconfigured at runtime.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error_handling::ConfigError;
use crate::models::RecordKind;

/// Store technology behind a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Sqlite,
    Postgres,
}

impl DataSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Sqlite => "SQLite",
            DataSourceKind::Postgres => "PostgreSQL",
        }
    }
}

/// Which record kinds a destination exports and the write query for each.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    pub current_data: bool,
    pub current_data_query: String,
    pub archive_data: bool,
    pub archive_data_query: String,
    pub events: bool,
    pub event_query: String,
}

impl ExportParams {
    pub fn is_enabled(&self, kind: RecordKind) -> bool {
        match kind {
            RecordKind::CurrentData => self.current_data,
            RecordKind::ArchiveData => self.archive_data,
            RecordKind::Event => self.events,
        }
    }

    /// Query template of an enabled kind. `None` when the kind is disabled.
    pub fn query(&self, kind: RecordKind) -> Option<&str> {
        if !self.is_enabled(kind) {
            return None;
        }
        Some(match kind {
            RecordKind::CurrentData => self.current_data_query.as_str(),
            RecordKind::ArchiveData => self.archive_data_query.as_str(),
            RecordKind::Event => self.event_query.as_str(),
        })
    }
}

/// One configured external store.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportDestination {
    pub name: String,
    pub kind: DataSourceKind,
    /// Connection URL understood by the store driver
    pub connection: String,
    #[serde(default)]
    pub export: ExportParams,
}

impl ExportDestination {
    /// Display name used in logs and the status report.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.kind.as_str())
    }
}

/// Contents of the destinations file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DestinationsConfig {
    #[serde(default, rename = "destination")]
    pub destinations: Vec<ExportDestination>,
}

impl DestinationsConfig {
    /// Load destinations from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// contains unnamed or duplicate destinations.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for dest in &self.destinations {
            if dest.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "destination is missing a name".to_string(),
                ));
            }
            if !seen.insert(dest.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "destination '{}' is defined more than once",
                    dest.name
                )));
            }
        }
        Ok(())
    }
}

impl FromStr for DestinationsConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: DestinationsConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
