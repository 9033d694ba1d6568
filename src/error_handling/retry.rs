//! Reconnect pacing.
//!
//! A destination that cannot be reached is retried with exponential backoff
//! so a dead store does not get hammered in a tight loop.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

/// Creates the backoff used between failed connection attempts.
///
/// Delays start at `initial`, double with each failure and are capped at
/// `max`. The iterator is unbounded; the worker restarts it after every
/// successful connect.
pub fn reconnect_strategy(initial: Duration, max: Duration) -> ExponentialBackoff {
    // ExponentialBackoff yields base^n * factor, so base 2 with half the
    // initial delay as factor gives initial, 2*initial, 4*initial, ...
    let factor = (initial.as_millis() as u64 / 2).max(1);
    ExponentialBackoff::from_millis(2)
        .factor(factor)
        .max_delay(max)
}
