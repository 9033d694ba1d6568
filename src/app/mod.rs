//! Main application modules.
//!
//! Record input, shutdown handling and final statistics used by the export run.

pub mod input;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use input::{open_input, parse_record_line};
pub use shutdown::{cancel_on_ctrl_c, shutdown_gracefully};
pub use statistics::log_final_statistics;
