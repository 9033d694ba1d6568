//! Periodic status report.
//!
//! A background task rewrites a plain-text report file at a fixed interval
//! with the module state and one line per exporter. Publication failures are
//! logged and retried at the next tick; they never stop the reporter.

mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::supervisor::Registry;

pub use report::{build_report, write_report};

/// Writes the current report of `registry` to `path`, logging any failure.
pub async fn publish(registry: &Registry, path: &std::path::Path) {
    let text = build_report(registry.work_state(), &registry.statuses());
    if let Err(e) = write_report(path, &text).await {
        log::error!("Error writing status report {}: {}", path.display(), e);
    }
}

/// Handle to the running status reporter task.
pub struct StatusReporter {
    registry: Arc<Registry>,
    path: PathBuf,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StatusReporter {
    /// Spawns the reporter. The first report is written immediately.
    pub fn spawn(registry: Arc<Registry>, path: PathBuf, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task_registry = Arc::clone(&registry);
        let task_path = path.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        publish(&task_registry, &task_path).await;
                    }
                }
            }
        });

        StatusReporter {
            registry,
            path,
            cancel,
            handle,
        }
    }

    /// Stops the periodic task and writes one final report reflecting the
    /// current exporter states.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            log::error!("Status reporter task failed: {}", e);
        }
        publish(&self.registry, &self.path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::Supervisor;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reporter_writes_and_stops() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.txt");
        let supervisor = Supervisor::failed();

        let reporter =
            StatusReporter::spawn(supervisor.registry(), path.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(path.exists());

        std::fs::remove_file(&path).unwrap();
        reporter.stop().await;

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("State: error"));
        assert!(text.ends_with("No\n"));
    }

    #[tokio::test]
    async fn test_reporter_survives_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("status.txt");
        let supervisor = Supervisor::failed();

        let reporter =
            StatusReporter::spawn(supervisor.registry(), path.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;

        std::fs::create_dir(dir.path().join("missing")).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(path.exists());

        reporter.stop().await;
    }
}
