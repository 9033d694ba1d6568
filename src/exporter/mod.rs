//! Per-destination exporter.
//!
//! An [`Exporter`] owns one destination: a bounded queue that producers append
//! to, and a background worker task that drains it into the destination's
//! [`DataSink`]. Producers never block on the network; the only lock they take
//! is the short queue lock.
//!
//! Lifecycle: [`start`](Exporter::start) spawns the worker,
//! [`terminate`](Exporter::terminate) asks it to drain what is queued and stop,
//! [`abort`](Exporter::abort) discards the queue and interrupts any in-flight
//! connect or write.

mod queue;
mod state;
mod status;
mod worker;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{
    Config, DEFAULT_QUEUE_CAPACITY, MAX_CONSECUTIVE_CONNECT_FAILURES, RETRY_INITIAL_DELAY_MS,
    RETRY_MAX_DELAY_SECS,
};
use crate::error_handling::{ExportCounter, ExportError, ExportStats};
use crate::models::{Event, Record, RecordKind, Snapshot};
use crate::sink::DataSink;

use queue::{ExportQueue, PushOutcome};
use state::AtomicState;
use worker::Worker;

pub use state::ExporterState;
pub use status::ExporterStatus;

/// Tuning knobs shared by every exporter of a run.
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    pub queue_capacity: usize,
    /// Consecutive connection failures after which the head record is dropped
    pub max_connect_failures: u32,
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        ExporterOptions {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_connect_failures: MAX_CONSECUTIVE_CONNECT_FAILURES,
            retry_initial_delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
            retry_max_delay: Duration::from_secs(RETRY_MAX_DELAY_SECS),
        }
    }
}

impl From<&Config> for ExporterOptions {
    fn from(config: &Config) -> Self {
        ExporterOptions {
            queue_capacity: config.queue_capacity,
            max_connect_failures: config.max_connect_failures.max(1),
            retry_initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            retry_max_delay: Duration::from_secs(config.retry_max_delay_secs),
        }
    }
}

/// State shared between the exporter handle and its worker task.
pub(crate) struct ExporterShared {
    pub(crate) name: String,
    pub(crate) state: AtomicState,
    pub(crate) queue: ExportQueue,
    pub(crate) stats: ExportStats,
    last_error: ArcSwapOption<String>,
    pub(crate) cancel: CancellationToken,
}

impl ExporterShared {
    pub(crate) fn set_last_error(&self, error: &ExportError) {
        self.last_error.store(Some(Arc::new(error.to_string())));
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.load_full().map(|e| e.as_ref().clone())
    }
}

/// Exports records to one destination.
///
/// All methods take `&self`: an exporter is shared between the supervisor,
/// the status reporter and any number of producers.
pub struct Exporter {
    shared: Arc<ExporterShared>,
    accepted: Vec<RecordKind>,
    options: ExporterOptions,
    sink: Mutex<Option<Box<dyn DataSink>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Exporter {
    /// Creates an idle exporter over `sink`, accepting only `accepted` kinds.
    pub fn new(sink: Box<dyn DataSink>, accepted: Vec<RecordKind>, options: ExporterOptions) -> Self {
        let shared = Arc::new(ExporterShared {
            name: sink.name().to_string(),
            state: AtomicState::new(ExporterState::Idle),
            queue: ExportQueue::new(options.queue_capacity),
            stats: ExportStats::new(),
            last_error: ArcSwapOption::empty(),
            cancel: CancellationToken::new(),
        });

        Exporter {
            shared,
            accepted,
            options,
            sink: Mutex::new(Some(sink)),
            worker: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> ExporterState {
        self.shared.state.load()
    }

    /// Whether this destination exports records of `kind`.
    pub fn accepts(&self, kind: RecordKind) -> bool {
        self.accepted.contains(&kind)
    }

    /// Spawns the worker task. Only the first call on an idle exporter has an
    /// effect; returns whether the worker was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let sink = {
            let mut slot = self.sink.lock().unwrap_or_else(|e| e.into_inner());
            if !self
                .shared
                .state
                .transition(ExporterState::Idle, ExporterState::Running)
            {
                return false;
            }
            match slot.take() {
                Some(sink) => sink,
                None => return false,
            }
        };

        let worker = Worker::new(Arc::clone(&self.shared), sink, self.options.clone());
        let handle = tokio::spawn(worker.run());
        *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);

        log::info!("Exporter {} started", self.name());
        true
    }

    /// Requests a graceful stop: the worker finishes what is queued, then
    /// disconnects. Enqueues are refused from now on.
    ///
    /// Calling this on an exporter that is not running has no effect.
    pub fn terminate(&self) {
        if self
            .shared
            .state
            .transition(ExporterState::Running, ExporterState::Terminating)
        {
            log::info!(
                "Exporter {} terminating, {} records left to export",
                self.name(),
                self.shared.queue.len()
            );
            self.shared.queue.wake();
        }
    }

    /// Forces an immediate stop: queued records are discarded and an
    /// in-flight connect or write is interrupted.
    ///
    /// Calling this on a terminated or aborted exporter has no effect.
    pub fn abort(&self) {
        if !self.shared.state.abort() {
            return;
        }

        let discarded = self.shared.queue.clear();
        if discarded > 0 {
            self.shared.stats.add(ExportCounter::Dropped, discarded);
        }
        self.shared.cancel.cancel();
        log::warn!(
            "Exporter {} aborted, {} queued records discarded",
            self.name(),
            discarded
        );
    }

    /// Queues a current-data snapshot.
    pub fn enqueue_current_data(&self, snapshot: Snapshot) -> bool {
        self.enqueue(Arc::new(Record::CurrentSnapshot(snapshot)))
    }

    /// Queues an archived-data snapshot.
    pub fn enqueue_archive_data(&self, snapshot: Snapshot) -> bool {
        self.enqueue(Arc::new(Record::ArchivedSnapshot(snapshot)))
    }

    /// Queues an event.
    pub fn enqueue_event(&self, event: Event) -> bool {
        self.enqueue(Arc::new(Record::Event(event)))
    }

    /// Appends a record to the queue and wakes the worker.
    ///
    /// Returns `false` when the record was refused: its kind is not enabled for
    /// this destination, or the exporter is not running. Refusals are counted
    /// but never reported as errors to the producer.
    pub fn enqueue(&self, record: Arc<Record>) -> bool {
        let kind = record.kind();
        if !self.accepts(kind) {
            self.shared.stats.increment(ExportCounter::Rejected);
            log::trace!("Exporter {} does not export {}", self.name(), kind);
            return false;
        }

        let state = &self.shared.state;
        match self
            .shared
            .queue
            .push(record, || state.load() == ExporterState::Running)
        {
            PushOutcome::Queued => true,
            PushOutcome::Evicted(old) => {
                self.shared.stats.increment(ExportCounter::Evicted);
                log::warn!(
                    "Export queue of {} is full, evicted {} from {}",
                    self.name(),
                    old.kind(),
                    old.timestamp()
                );
                true
            }
            PushOutcome::Rejected => {
                self.shared.stats.increment(ExportCounter::Rejected);
                false
            }
        }
    }

    /// Number of records waiting to be exported.
    pub fn queue_depth(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn counter(&self, counter: ExportCounter) -> usize {
        self.shared.stats.get(counter)
    }

    /// Point-in-time view of this exporter for status reporting.
    pub fn status(&self) -> ExporterStatus {
        ExporterStatus {
            name: self.shared.name.clone(),
            state: self.state(),
            queue_depth: self.shared.queue.len(),
            last_error: self.shared.last_error(),
            counters: self.shared.stats.snapshot(),
        }
    }

    /// Waits up to `limit` for the worker task to finish.
    ///
    /// Returns `true` when the worker has finished (or was never started). A
    /// worker still running after `limit` is detached and `false` is returned.
    pub async fn join(&self, limit: Duration) -> bool {
        let handle = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(handle) = handle else {
            return true;
        };

        match tokio::time::timeout(limit, handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::error!("Exporter {} worker failed: {}", self.name(), e);
                true
            }
            Err(_) => {
                log::warn!(
                    "Exporter {} worker did not finish within {:?}, detaching it",
                    self.name(),
                    limit
                );
                false
            }
        }
    }
}
