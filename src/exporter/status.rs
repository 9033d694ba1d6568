//! Exporter status snapshot.

use std::fmt;

use super::ExporterState;
use crate::error_handling::ExportCounter;

/// Point-in-time view of one exporter, as shown in the status report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExporterStatus {
    pub name: String,
    pub state: ExporterState,
    pub queue_depth: usize,
    pub last_error: Option<String>,
    pub counters: Vec<(ExportCounter, usize)>,
}

impl ExporterStatus {
    pub fn counter(&self, counter: ExportCounter) -> usize {
        self.counters
            .iter()
            .find(|(c, _)| *c == counter)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// One line: `name: state, queue N, sent N, ... [, last error: ...]`.
impl fmt::Display for ExporterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}, queue {}", self.name, self.state, self.queue_depth)?;
        for (counter, value) in &self.counters {
            write!(f, ", {} {}", counter, value)?;
        }
        if let Some(error) = &self.last_error {
            // keep the report one line per exporter
            let error = error.replace(['\r', '\n'], " ");
            write!(f, ", last error: {}", error)?;
        }
        Ok(())
    }
}
