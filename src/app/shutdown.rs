//! Graceful shutdown handling.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::status_report::StatusReporter;
use crate::supervisor::{StopReport, Supervisor};

/// Returns a token cancelled when the process receives Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Interrupt received, stopping export");
                token.cancel();
            }
            Err(e) => log::warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
    cancel
}

/// Stops every exporter within `timeout`, then stops the status reporter so
/// its final report shows the terminal states.
pub async fn shutdown_gracefully(
    supervisor: &Supervisor,
    reporter: StatusReporter,
    timeout: Duration,
) -> StopReport {
    let report = supervisor.stop_all(timeout).await;
    reporter.stop().await;
    report
}
