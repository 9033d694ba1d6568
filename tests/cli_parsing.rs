//! Tests for command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use db_export::config::{DESTINATIONS_FILE, INFO_FILE_NAME, LOG_FILE_NAME};
use db_export::{Config, LogFormat, LogLevel};

#[test]
fn test_defaults() {
    let config = Config::try_parse_from(["db_export"]).unwrap();

    assert_eq!(config.input, PathBuf::from("-"));
    assert_eq!(config.destinations, PathBuf::from(DESTINATIONS_FILE));
    assert_eq!(config.status_file, PathBuf::from(INFO_FILE_NAME));
    assert!(matches!(config.log_level, LogLevel::Info));
    assert!(matches!(config.log_format, LogFormat::Plain));
    assert!(config.log_file.is_none());
    assert_eq!(config.status_interval(), Duration::from_millis(500));
    assert_eq!(config.stop_timeout(), Duration::from_secs(10));
    assert_eq!(config.max_connect_failures, 3);
}

#[test]
fn test_all_options() {
    let config = Config::try_parse_from([
        "db_export",
        "records.jsonl",
        "-d",
        "/etc/scada/export.toml",
        "--log-level",
        "debug",
        "--log-format",
        "json",
        "--log-file",
        "/var/log/db_export.log",
        "--status-file",
        "/run/db_export.txt",
        "--status-interval-ms",
        "1000",
        "--stop-timeout-ms",
        "2500",
        "--queue-capacity",
        "64",
        "--max-connect-failures",
        "5",
        "--retry-initial-delay-ms",
        "100",
        "--retry-max-delay-secs",
        "30",
    ])
    .unwrap();

    assert_eq!(config.input, PathBuf::from("records.jsonl"));
    assert_eq!(config.destinations, PathBuf::from("/etc/scada/export.toml"));
    assert!(matches!(config.log_level, LogLevel::Debug));
    assert!(matches!(config.log_format, LogFormat::Json));
    assert_eq!(config.log_file, Some(PathBuf::from("/var/log/db_export.log")));
    assert_eq!(config.status_file, PathBuf::from("/run/db_export.txt"));
    assert_eq!(config.status_interval(), Duration::from_secs(1));
    assert_eq!(config.stop_timeout(), Duration::from_millis(2500));
    assert_eq!(config.queue_capacity, 64);
    assert_eq!(config.max_connect_failures, 5);
    assert_eq!(config.retry_initial_delay_ms, 100);
    assert_eq!(config.retry_max_delay_secs, 30);
}

#[test]
fn test_log_file_flag_without_value_uses_default_name() {
    let config = Config::try_parse_from(["db_export", "--log-file"]).unwrap();
    assert_eq!(config.log_file, Some(PathBuf::from(LOG_FILE_NAME)));
}

#[test]
fn test_invalid_log_level_rejected() {
    assert!(Config::try_parse_from(["db_export", "--log-level", "verbose"]).is_err());
}

#[test]
fn test_non_numeric_timeout_rejected() {
    assert!(Config::try_parse_from(["db_export", "--stop-timeout-ms", "soon"]).is_err());
}
