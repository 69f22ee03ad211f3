//! Bounded statistics queue and its background worker.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use serde_json::Value;

use super::snapshot::{self, PendingRecord};
use crate::debug::Debuggable;
use crate::plugin::{ClientIdentity, ServerCore};
use crate::{Error, Result};

/// One queued statistic: a client identity and an opaque payload.
#[derive(Debug, Clone)]
pub struct StatisticRecord {
    /// Which managed node the statistic describes.
    pub client: ClientIdentity,
    /// The statistic itself; the queue never looks inside.
    pub payload: Value,
}

/// Per-plugin statistics processing, supplied by the concrete plugin.
pub trait StatisticsHandler: Send + Sync {
    /// Process one dequeued statistic.
    ///
    /// # Errors
    ///
    /// May fail per record; the worker logs the failure and keeps going.
    fn handle_statistic(&self, client: &ClientIdentity, payload: &Value) -> Result<()>;
}

/// Durable asynchronous statistics queue.
///
/// Producers are arbitrary request-handling contexts; the single consumer
/// is a long-lived worker thread spawned at construction. The worker
/// restores any pending snapshot before processing live records, and
/// snapshots whatever is still queued when the core's termination signal
/// is observed. Producers never block and never see an error; a full
/// queue drops the record silently.
pub struct ThreadedStatistics {
    name: &'static str,
    queue_tx: Sender<StatisticRecord>,
    worker: Option<JoinHandle<()>>,
    debug: AtomicBool,
}

impl ThreadedStatistics {
    /// Create the queue and spawn its worker for a named plugin.
    ///
    /// Capacity, dequeue timeout, and the pending-snapshot path all come
    /// from the core's configuration.
    ///
    /// # Errors
    ///
    /// Returns an `Init` error if the worker thread cannot be spawned.
    pub fn new(
        name: &'static str,
        core: Arc<dyn ServerCore>,
        handler: Arc<dyn StatisticsHandler>,
    ) -> Result<Self> {
        let (queue_tx, queue_rx) = bounded(core.config().stats_capacity);
        let pending_path = core.config().pending_path(name);
        let dequeue_timeout = core.config().dequeue_timeout;

        let worker = StatsWorker {
            queue_tx: queue_tx.clone(),
            queue_rx,
            pending_path,
            dequeue_timeout,
            core,
            handler,
        };

        let handle = std::thread::Builder::new()
            .name(format!("statistics-{name}"))
            .spawn(move || worker.run())
            .map_err(|e| Error::init(format!("failed to spawn statistics worker: {e}")))?;

        Ok(Self {
            name,
            queue_tx,
            worker: Some(handle),
            debug: AtomicBool::new(false),
        })
    }

    /// Submit one statistic from a request-handling path.
    ///
    /// Enqueues a copy of the record, so a producer mutating its payload
    /// after submission cannot corrupt queued state. Never blocks and
    /// never fails: when the queue is full the record is dropped.
    pub fn process_statistics(&self, client: &ClientIdentity, payload: &Value) {
        let record = StatisticRecord {
            client: client.clone(),
            payload: payload.clone(),
        };
        if self.queue_tx.try_send(record).is_err() {
            self.debug_log(
                &format!("queue full, dropping statistic for {}", client.hostname()),
                false,
            );
        }
    }

    /// Current queue depth.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue_tx.len()
    }

    /// Wait for the worker to observe termination and finish its shutdown
    /// snapshot.
    pub fn join(mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!(plugin = self.name, "Statistics worker panicked");
            }
        }
    }
}

impl Debuggable for ThreadedStatistics {
    fn debug_flag(&self) -> &AtomicBool {
        &self.debug
    }

    fn component_name(&self) -> &str {
        self.name
    }
}

/// Consumer side: owns the receiver, the snapshot path, and the shutdown
/// protocol. Kept separate from [`ThreadedStatistics`] so `save`/`load`
/// are testable without a running thread.
struct StatsWorker {
    queue_tx: Sender<StatisticRecord>,
    queue_rx: Receiver<StatisticRecord>,
    pending_path: PathBuf,
    dequeue_timeout: Duration,
    core: Arc<dyn ServerCore>,
    handler: Arc<dyn StatisticsHandler>,
}

impl StatsWorker {
    /// Worker loop: restore pending records, process until termination,
    /// snapshot the remainder.
    fn run(&self) {
        if !self.load() {
            tracing::error!(
                path = %self.pending_path.display(),
                "Failed to restore pending statistics; snapshot left in place"
            );
        }

        let termination = self.core.termination().clone();
        while !termination.is_cancelled() {
            match self.queue_rx.recv_timeout(self.dequeue_timeout) {
                Ok(record) => {
                    if let Err(e) = self.handler.handle_statistic(&record.client, &record.payload)
                    {
                        tracing::error!(
                            client = record.client.hostname(),
                            error = %e,
                            "Statistics handler failed"
                        );
                    }
                }
                // The timeout only exists so this loop periodically
                // re-observes the termination signal.
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.save();
    }

    /// Drain the queue without blocking and write the collected records to
    /// the pending snapshot. Failures are logged, never raised; losing the
    /// snapshot on a failing disk must not turn shutdown into a crash.
    fn save(&self) {
        let mut collected = Vec::new();
        while let Ok(record) = self.queue_rx.try_recv() {
            collected.push(PendingRecord {
                client: record.client.hostname().to_string(),
                payload: record.payload.to_string(),
            });
        }

        match snapshot::write_pending(&self.pending_path, &collected) {
            Ok(()) => tracing::info!(
                count = collected.len(),
                path = %self.pending_path.display(),
                "Saved pending statistics"
            ),
            Err(e) => tracing::error!(error = %e, "Failed to save pending statistics"),
        }
    }

    /// Restore records from the pending snapshot, if one exists.
    ///
    /// Returns `false` only when a snapshot exists but cannot be read; the
    /// file is then left in place for inspection. A record that fails
    /// identity reconstruction, payload parsing, or enqueueing is dropped
    /// alone; the rest of the snapshot still loads, and the file is
    /// deleted once the full pass is complete.
    fn load(&self) -> bool {
        if !self.pending_path.exists() {
            return true;
        }

        let records = match snapshot::read_pending(&self.pending_path) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read pending statistics");
                return false;
            }
        };

        for record in records {
            let client = match self.core.build_identity(&record.client) {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(client = %record.client, error = %e, "Dropping unrestorable client");
                    continue;
                }
            };
            let payload: Value = match serde_json::from_str(&record.payload) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(client = %record.client, error = %e, "Dropping unparsable payload");
                    continue;
                }
            };
            if self
                .queue_tx
                .try_send(StatisticRecord { client, payload })
                .is_err()
            {
                tracing::warn!(client = %record.client, "Queue full, dropping restored record");
            }
        }

        if let Err(e) = fs::remove_file(&self.pending_path) {
            tracing::warn!(error = %e, "Failed to delete consumed snapshot");
        }
        true
    }
}
