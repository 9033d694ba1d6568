//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (intervals, timeouts, queue limits)
//! - CLI option types and parsing
//! - The export destinations file

mod constants;
mod destinations;
mod types;

// Re-export all constants
pub use constants::*;
pub use destinations::{DataSourceKind, DestinationsConfig, ExportDestination, ExportParams};
pub use types::{Config, LogFormat, LogLevel};
