use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::store::store::{ExplorationStore, PersistenceRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    pub written: usize,
    pub failed: usize,
}

/// Fire-and-forget queue in front of an [`ExplorationStore`].
///
/// `send` never waits. Records are applied in order on the blocking pool, so
/// store I/O never stalls the runtime. Write failures are logged and counted,
/// never surfaced to the sender.
pub struct PersistenceSink {
    tx: mpsc::UnboundedSender<PersistenceRecord>,
    worker: JoinHandle<SinkReport>,
}

impl PersistenceSink {
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn ExplorationStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistenceRecord>();
        let worker = tokio::task::spawn_blocking(move || {
            let mut report = SinkReport::default();
            while let Some(record) = rx.blocking_recv() {
                match store.apply(&record) {
                    Ok(()) => report.written += 1,
                    Err(e) => {
                        warn!("persistence write failed: {}", e);
                        report.failed += 1;
                    }
                }
            }
            debug!(written = report.written, failed = report.failed, "persistence sink drained");
            report
        });
        Self { tx, worker }
    }

    pub fn send(&self, record: PersistenceRecord) {
        if self.tx.send(record).is_err() {
            warn!("persistence sink closed, record dropped");
        }
    }

    /// Close the queue and wait for the remaining records to be written.
    pub async fn finish(self) -> SinkReport {
        drop(self.tx);
        match self.worker.await {
            Ok(report) => report,
            Err(e) => {
                warn!("persistence sink task failed: {}", e);
                SinkReport::default()
            }
        }
    }
}
