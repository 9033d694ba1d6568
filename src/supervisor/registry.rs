//! Registry of live exporters.

use crate::exporter::{Exporter, ExporterStatus};

/// Overall state of the export module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkState {
    /// Destinations loaded; records are dispatched
    Normal,
    /// Destinations could not be loaded; nothing is exported this run
    Error,
}

impl WorkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkState::Normal => "normal",
            WorkState::Error => "error",
        }
    }
}

impl std::fmt::Display for WorkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exporters created at startup, plus the module work state.
///
/// Built once by the supervisor and shared (behind an `Arc`) with the status
/// reporter. The set of exporters never changes after construction.
pub struct Registry {
    work_state: WorkState,
    exporters: Vec<Exporter>,
}

impl Registry {
    pub(crate) fn new(work_state: WorkState, exporters: Vec<Exporter>) -> Self {
        Registry {
            work_state,
            exporters,
        }
    }

    pub fn work_state(&self) -> WorkState {
        self.work_state
    }

    pub fn exporters(&self) -> &[Exporter] {
        &self.exporters
    }

    pub fn len(&self) -> usize {
        self.exporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exporters.is_empty()
    }

    /// Current status of every exporter, in registration order.
    pub fn statuses(&self) -> Vec<ExporterStatus> {
        self.exporters.iter().map(Exporter::status).collect()
    }

    /// Whether every exporter has reached Terminated or Aborted.
    pub fn all_done(&self) -> bool {
        self.exporters.iter().all(|e| e.state().is_terminal())
    }
}
