//! Configuration constants.
//!
//! This module defines the defaults used throughout the export engine:
//! queue sizing, retry pacing, shutdown timing and file names.

use std::time::Duration;

/// Name of the export module, used in start/stop log lines
pub const MODULE_NAME: &str = "DbExport";

// Files
/// Default log file name (written in the log directory)
pub const LOG_FILE_NAME: &str = "db_export.log";
/// Default status report file name (overwritten every reporting interval)
pub const INFO_FILE_NAME: &str = "db_export.txt";
/// Default destinations file
pub const DESTINATIONS_FILE: &str = "./db_export.toml";

// Status reporting
/// Interval between status report refreshes
pub const STATUS_INTERVAL: Duration = Duration::from_millis(500);

// Queueing
/// Maximum number of records held per exporter before drop-oldest eviction kicks in
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

// Connection retry policy
/// Consecutive connection failures after which the head record is dropped
/// so an unreachable store cannot stall the queue forever
pub const MAX_CONSECUTIVE_CONNECT_FAILURES: u32 = 3;
/// Initial delay in milliseconds before reconnecting after a failed attempt
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Maximum delay between reconnection attempts in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 15;

// Shutdown timing
/// Budget for graceful drain of every exporter before stragglers are aborted
pub const WAIT_FOR_STOP: Duration = Duration::from_secs(10);
/// Interval at which exporter states are polled while waiting for drain
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Upper bound on a single disconnect during worker cleanup
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Time given to aborted workers to release their connection before they are detached
pub const ABORT_GRACE: Duration = Duration::from_secs(1);

// Store connections
/// Upper bound on establishing a store connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
