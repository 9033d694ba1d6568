//! Error type definitions.
//!
//! This module defines the error taxonomy of the export engine and the
//! counters tracked per exporter.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::models::RecordKind;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the logger with custom message (e.g., file creation).
    #[error("Logger initialization error: {0}")]
    LoggerSetupError(String),
}

/// Errors loading the destinations file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected layout.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but describes an unusable setup.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by a data sink while serving one destination.
///
/// None of these ever leave the destination they occurred in: the worker logs
/// them, stores the message as the exporter's last error, and moves on.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Missing or invalid write query for an enabled record kind. Fatal to the
    /// destination only: it is excluded at startup.
    #[error("Configuration error for {kind}: {message}")]
    Configuration { kind: RecordKind, message: String },

    /// Connection parameters could not be turned into a usable data source.
    #[error("Invalid connection settings: {0}")]
    ConnectionSettings(String),

    /// The external store could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single record could not be delivered.
    #[error("Write error: {0}")]
    Write(String),

    /// Releasing the connection failed.
    #[error("Disconnect error: {0}")]
    Disconnect(String),
}

impl ExportError {
    pub(crate) fn configuration(kind: RecordKind, message: impl Into<String>) -> Self {
        ExportError::Configuration {
            kind,
            message: message.into(),
        }
    }
}

/// Per-exporter counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ExportCounter {
    /// Records delivered to the store
    Sent,
    /// Records whose write failed (not retried)
    WriteFailed,
    /// Failed connection attempts
    ConnectFailed,
    /// Head records dropped after repeated connection failures
    Dropped,
    /// Records evicted by the drop-oldest backpressure policy
    Evicted,
    /// Records refused at enqueue (kind disabled or exporter not running)
    Rejected,
}

impl ExportCounter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportCounter::Sent => "sent",
            ExportCounter::WriteFailed => "write errors",
            ExportCounter::ConnectFailed => "connect errors",
            ExportCounter::Dropped => "dropped",
            ExportCounter::Evicted => "evicted",
            ExportCounter::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ExportCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
