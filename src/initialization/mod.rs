//! Application initialization.
//!
//! Sets up the process-wide logger and loads the export destinations.

mod logger;

use std::path::Path;

use crate::config::DestinationsConfig;
use crate::error_handling::ConfigError;

// Re-export public API
pub use logger::init_logger_with;

/// Loads and validates the destinations file.
///
/// # Errors
///
/// Returns a `ConfigError` when the file is missing, malformed or invalid. The
/// caller switches the module to the `error` work state.
pub fn init_destinations(path: &Path) -> Result<DestinationsConfig, ConfigError> {
    let config = DestinationsConfig::from_file(path)?;
    log::info!(
        "Loaded {} destination(s) from {}",
        config.destinations.len(),
        path.display()
    );
    Ok(config)
}
