//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom formatting.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger with the specified level, format and destination.
///
/// Configures `env_logger` with custom formatting. Supports both plain text
/// (timestamped, with colors and emojis on a terminal) and JSON formats for
/// structured logging.
///
/// The logger reads from the `RUST_LOG` environment variable by default, but
/// the provided `level` parameter will override it.
///
/// # Arguments
///
/// * `level` - Minimum log level to display (overrides `RUST_LOG` if set)
/// * `format` - Log format (Plain or Json)
/// * `log_file` - Append to this file instead of writing to stderr
///
/// # Errors
///
/// Returns `InitializationError::LoggerSetupError` if the log file cannot be
/// opened, or `InitializationError::LoggerError` if a logger is already set.
///
/// # Examples
///
/// ```bash
/// # Override RUST_LOG with the CLI level
/// RUST_LOG=debug db_export records.jsonl --log-level info
///
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=db_export=debug,sqlx=warn db_export records.jsonl
/// ```
pub fn init_logger_with(
    level: LevelFilter,
    format: LogFormat,
    log_file: Option<&Path>,
) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    // CLI-provided level takes precedence over RUST_LOG
    builder.filter_level(level);
    builder.filter_module("sqlx", LevelFilter::Warn);
    builder.filter_module("db_export", level);

    let use_color = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    InitializationError::LoggerSetupError(format!(
                        "Failed to open log file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            false
        }
        None => true,
    };
    colored::control::set_override(use_color);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(move |buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };
                let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

                if !use_color {
                    return writeln!(buf, "{} [{}] {}", ts, colored_level, record.args());
                }

                let emoji = match level {
                    log::Level::Error => "❌",
                    log::Level::Warn => "⚠️",
                    log::Level::Info => "✔️",
                    log::Level::Debug => "🔍",
                    log::Level::Trace => "🔬",
                };

                writeln!(
                    buf,
                    "{} {} {} [{}] {}",
                    ts,
                    emoji,
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    // try_init() so a second initialization (tests) returns an error instead of panicking
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}
