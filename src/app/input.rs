//! Record input: JSON lines from a file or stdin.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

use crate::models::Record;

/// Line reader over the record input.
pub type RecordLines = Lines<BufReader<Box<dyn AsyncRead + Unpin + Send>>>;

/// Opens `path` for line-by-line reading; `-` means stdin.
pub async fn open_input(path: &Path) -> Result<RecordLines> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = if path.as_os_str() == "-" {
        log::info!("Reading records from stdin");
        Box::new(tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        log::info!("Reading records from {}", path.display());
        Box::new(file)
    };

    Ok(BufReader::new(reader).lines())
}

/// Parses one input line.
///
/// Blank lines and `#` comments yield `None` silently; malformed lines are
/// logged and yield `None`.
pub fn parse_record_line(line: &str, line_no: usize) -> Option<Record> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    match serde_json::from_str(trimmed) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("Skipping invalid record on line {}: {}", line_no, e);
            None
        }
    }
}
