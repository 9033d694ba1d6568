//! Exporter worker task.
//!
//! The worker is the only owner of the destination's connection. It drains the
//! queue in FIFO order, connecting lazily before each record if needed, and
//! stops either when a graceful stop has emptied the queue or immediately when
//! the exporter is aborted.

use std::sync::Arc;

use tokio_retry::strategy::ExponentialBackoff;

use super::{ExporterOptions, ExporterShared, ExporterState};
use crate::config::DISCONNECT_TIMEOUT;
use crate::error_handling::{reconnect_strategy, ExportCounter};
use crate::models::Record;
use crate::sink::{disconnect_logged, DataSink};

pub(crate) struct Worker {
    shared: Arc<ExporterShared>,
    sink: Box<dyn DataSink>,
    options: ExporterOptions,
    connect_failures: u32,
    backoff: Option<ExponentialBackoff>,
}

impl Worker {
    pub(crate) fn new(
        shared: Arc<ExporterShared>,
        sink: Box<dyn DataSink>,
        options: ExporterOptions,
    ) -> Self {
        Worker {
            shared,
            sink,
            options,
            connect_failures: 0,
            backoff: None,
        }
    }

    pub(crate) async fn run(mut self) {
        let cancel = self.shared.cancel.clone();

        let drained = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = self.drain() => true,
        };

        if self.sink.is_connected() {
            let disconnect = disconnect_logged(self.sink.as_mut());
            if tokio::time::timeout(DISCONNECT_TIMEOUT, disconnect)
                .await
                .is_err()
            {
                log::warn!(
                    "Disconnecting from DB {} timed out after {:?}",
                    self.shared.name,
                    DISCONNECT_TIMEOUT
                );
            }
        }

        if drained
            && self
                .shared
                .state
                .transition(ExporterState::Terminating, ExporterState::Terminated)
        {
            log::info!("Exporter {} terminated", self.shared.name);
        } else {
            // records pushed between abort's clear and the worker exit
            self.shared.queue.clear();
            log::info!("Exporter {} stopped after abort", self.shared.name);
        }
    }

    /// Exports queued records until a graceful stop finds the queue empty.
    async fn drain(&mut self) {
        loop {
            // state is read before the queue so a record accepted while still
            // running is always seen by the emptiness check below
            let state = self.shared.state.load();
            if state.is_terminal() {
                return;
            }

            if self.shared.queue.is_empty() {
                if state == ExporterState::Terminating {
                    return;
                }
                self.shared.queue.wait().await;
                continue;
            }

            if !self.sink.is_connected() && !self.connect().await {
                continue;
            }

            if let Some(record) = self.shared.queue.pop() {
                self.write(&record).await;
            }
        }
    }

    /// Tries to connect once. On failure waits out the backoff delay and, after
    /// too many consecutive failures, drops the record at the head of the queue.
    async fn connect(&mut self) -> bool {
        match self.sink.connect().await {
            Ok(()) => {
                if self.connect_failures > 0 {
                    log::info!(
                        "Connected to DB {} after {} failed attempts",
                        self.shared.name,
                        self.connect_failures
                    );
                }
                self.connect_failures = 0;
                self.backoff = None;
                true
            }
            Err(e) => {
                self.connect_failures += 1;
                self.shared.stats.increment(ExportCounter::ConnectFailed);
                self.shared.set_last_error(&e);
                log::error!("Error connecting to DB {}: {}", self.shared.name, e);

                if self.connect_failures >= self.options.max_connect_failures {
                    if let Some(dropped) = self.shared.queue.pop() {
                        self.shared.stats.increment(ExportCounter::Dropped);
                        log::warn!(
                            "Dropped {} from {} for {} after {} consecutive connection failures",
                            dropped.kind(),
                            dropped.timestamp(),
                            self.shared.name,
                            self.connect_failures
                        );
                    }
                }

                let delay = self.next_delay();
                tokio::time::sleep(delay).await;
                false
            }
        }
    }

    fn next_delay(&mut self) -> std::time::Duration {
        let options = &self.options;
        self.backoff
            .get_or_insert_with(|| {
                reconnect_strategy(options.retry_initial_delay, options.retry_max_delay)
            })
            .next()
            .unwrap_or(options.retry_max_delay)
    }

    /// Writes one record. A failed record is not retried; the connection is
    /// released so the next record starts from a fresh one.
    async fn write(&mut self, record: &Record) {
        match self.sink.write(record).await {
            Ok(()) => {
                self.shared.stats.increment(ExportCounter::Sent);
            }
            Err(e) => {
                self.shared.stats.increment(ExportCounter::WriteFailed);
                self.shared.set_last_error(&e);
                log::error!(
                    "Error exporting {} to DB {}: {}",
                    record.kind(),
                    self.shared.name,
                    e
                );
                disconnect_logged(self.sink.as_mut()).await;
            }
        }
    }
}
