//! Status report file contents and refresh.

mod helpers;

use std::path::Path;
use std::time::Duration;

use db_export::{RecordKind, StatusReporter, Supervisor};
use helpers::{fast_options, recording_exporter, wait_until, Behavior};
use tempfile::TempDir;

fn destination_lines(path: &Path) -> Vec<String> {
    let text = std::fs::read_to_string(path).unwrap_or_default();
    text.lines()
        .skip_while(|line| *line != "Data Sources")
        .skip(2)
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_report_lists_every_exporter_numbered_from_one() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db_export.txt");

    let exporters = ["first", "second", "third"]
        .iter()
        .map(|name| {
            recording_exporter(name, Behavior::Healthy, &[RecordKind::Event], fast_options()).0
        })
        .collect();
    let supervisor = Supervisor::with_exporters(exporters);
    let reporter =
        StatusReporter::spawn(supervisor.registry(), path.clone(), Duration::from_millis(20));

    assert!(wait_until(Duration::from_secs(2), || destination_lines(&path).len() == 3).await);
    let lines = destination_lines(&path);
    assert!(lines[0].starts_with("1. first: running"));
    assert!(lines[1].starts_with("2. second: running"));
    assert!(lines[2].starts_with("3. third: running"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Export Data Module\n------------------\nState: normal\n"));

    supervisor.stop_all(Duration::from_secs(1)).await;
    reporter.stop().await;

    let lines = destination_lines(&path);
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|line| line.contains(": terminated,")));
}

#[tokio::test]
async fn test_report_refreshes_after_state_change() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db_export.txt");
    let interval = Duration::from_millis(25);

    let (exporter, _) = recording_exporter(
        "flaky",
        Behavior::HangingConnect,
        &[RecordKind::CurrentData],
        fast_options(),
    );
    let supervisor = Supervisor::with_exporters(vec![exporter]);
    let reporter = StatusReporter::spawn(supervisor.registry(), path.clone(), interval);

    assert!(wait_until(Duration::from_secs(2), || {
        destination_lines(&path)
            .first()
            .is_some_and(|l| l.contains("running"))
    })
    .await);

    supervisor.registry().exporters()[0].abort();

    // one interval plus scheduling slack
    assert!(wait_until(interval * 4, || {
        destination_lines(&path)
            .first()
            .is_some_and(|l| l.contains("aborted"))
    })
    .await);

    reporter.stop().await;
    supervisor.stop_all(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_report_without_destinations_says_no() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db_export.txt");

    let supervisor = Supervisor::with_exporters(Vec::new());
    let reporter =
        StatusReporter::spawn(supervisor.registry(), path.clone(), Duration::from_millis(10));
    reporter.stop().await;

    assert_eq!(destination_lines(&path), vec!["No".to_string()]);
}
