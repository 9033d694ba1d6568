//! Exporter lifecycle state.
//!
//! `Idle -> Running -> Terminating -> {Terminated, Aborted}`, with `Aborted`
//! reachable from every non-terminal state. The state lives in a single atomic
//! so producers, the worker, the supervisor and the status reporter all read it
//! without locking.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of an exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExporterState {
    /// Constructed, not started
    Idle = 0,
    /// Worker is draining the queue and enqueues are accepted
    Running = 1,
    /// Graceful stop requested: worker drains what is queued, enqueues are refused
    Terminating = 2,
    /// Queue fully drained and connection released
    Terminated = 3,
    /// Forced stop: queued records were discarded
    Aborted = 4,
}

impl ExporterState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ExporterState::Idle,
            1 => ExporterState::Running,
            2 => ExporterState::Terminating,
            3 => ExporterState::Terminated,
            _ => ExporterState::Aborted,
        }
    }

    /// Terminated and Aborted both mean "exporter is done".
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExporterState::Terminated | ExporterState::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExporterState::Idle => "idle",
            ExporterState::Running => "running",
            ExporterState::Terminating => "terminating",
            ExporterState::Terminated => "terminated",
            ExporterState::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for ExporterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic cell holding an [`ExporterState`].
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: ExporterState) -> Self {
        AtomicState(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> ExporterState {
        ExporterState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Moves from `from` to `to`. Returns `false` (and changes nothing) if the
    /// current state is not `from`.
    pub(crate) fn transition(&self, from: ExporterState, to: ExporterState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Forces `Aborted` from any non-terminal state. Returns `false` if the
    /// state was already terminal.
    pub(crate) fn abort(&self) -> bool {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            if ExporterState::from_u8(current).is_terminal() {
                return false;
            }
            match self.0.compare_exchange(
                current,
                ExporterState::Aborted as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}
