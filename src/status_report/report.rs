//! Status report text and publication.

use std::path::{Path, PathBuf};

use crate::exporter::ExporterStatus;
use crate::supervisor::WorkState;

const BANNER: &str = "Export Data Module";
const SOURCES_HEADER: &str = "Data Sources";

fn underline(title: &str) -> String {
    "-".repeat(title.chars().count())
}

/// Renders the status report.
///
/// ```text
/// Export Data Module
/// ------------------
/// State: normal
///
/// Data Sources
/// ------------
/// 1. archive (SQLite): running, queue 0, sent 42, ...
/// ```
///
/// With no exporters the list is replaced by `No`.
pub fn build_report(work_state: WorkState, statuses: &[ExporterStatus]) -> String {
    let mut text = String::new();
    text.push_str(BANNER);
    text.push('\n');
    text.push_str(&underline(BANNER));
    text.push('\n');
    text.push_str(&format!("State: {}\n\n", work_state));
    text.push_str(SOURCES_HEADER);
    text.push('\n');
    text.push_str(&underline(SOURCES_HEADER));
    text.push('\n');

    if statuses.is_empty() {
        text.push_str("No\n");
    } else {
        for (i, status) in statuses.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, status));
        }
    }

    text
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces the report file atomically: the text goes to a sibling temp file
/// which is then renamed over `path`.
pub async fn write_report(path: &Path, text: &str) -> std::io::Result<()> {
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, text).await?;
    tokio::fs::rename(&tmp, path).await
}
