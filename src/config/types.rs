//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_QUEUE_CAPACITY, DESTINATIONS_FILE, INFO_FILE_NAME, LOG_FILE_NAME,
    MAX_CONSECUTIVE_CONNECT_FAILURES, RETRY_INITIAL_DELAY_MS, RETRY_MAX_DELAY_SECS,
    STATUS_INTERVAL, WAIT_FOR_STOP,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with timestamp and colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration.
///
/// Parsed from the command line by the binary, or built programmatically:
///
/// ```no_run
/// use db_export::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     destinations: PathBuf::from("export.toml"),
///     input: PathBuf::from("records.jsonl"),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(name = "db_export", version, about)]
pub struct Config {
    /// JSON-lines file to read records from (`-` for stdin)
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// TOML file describing the export destinations
    #[arg(long, short = 'd', default_value = DESTINATIONS_FILE)]
    pub destinations: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Append the log to this file instead of stderr (`--log-file` alone uses db_export.log)
    #[arg(long, num_args = 0..=1, default_missing_value = LOG_FILE_NAME)]
    pub log_file: Option<PathBuf>,

    /// Status report file, overwritten at every reporting interval
    #[arg(long, default_value = INFO_FILE_NAME)]
    pub status_file: PathBuf,

    /// Status report interval in milliseconds
    #[arg(long, default_value_t = STATUS_INTERVAL.as_millis() as u64)]
    pub status_interval_ms: u64,

    /// Graceful shutdown budget in milliseconds before exporters are aborted
    #[arg(long, default_value_t = WAIT_FOR_STOP.as_millis() as u64)]
    pub stop_timeout_ms: u64,

    /// Maximum records queued per destination (oldest of the same kind is evicted when full)
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Consecutive connection failures after which the head record is dropped
    #[arg(long, default_value_t = MAX_CONSECUTIVE_CONNECT_FAILURES)]
    pub max_connect_failures: u32,

    /// Initial reconnect delay in milliseconds
    #[arg(long, default_value_t = RETRY_INITIAL_DELAY_MS)]
    pub retry_initial_delay_ms: u64,

    /// Maximum reconnect delay in seconds
    #[arg(long, default_value_t = RETRY_MAX_DELAY_SECS)]
    pub retry_max_delay_secs: u64,
}

impl Config {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("-"),
            destinations: PathBuf::from(DESTINATIONS_FILE),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            log_file: None,
            status_file: PathBuf::from(INFO_FILE_NAME),
            status_interval_ms: STATUS_INTERVAL.as_millis() as u64,
            stop_timeout_ms: WAIT_FOR_STOP.as_millis() as u64,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_connect_failures: MAX_CONSECUTIVE_CONNECT_FAILURES,
            retry_initial_delay_ms: RETRY_INITIAL_DELAY_MS,
            retry_max_delay_secs: RETRY_MAX_DELAY_SECS,
        }
    }
}
