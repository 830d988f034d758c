//! Deferred ledger appends.
//!
//! Violation records are handed to a background task through a bounded
//! queue, so the allow/deny decision never waits on audit persistence.
//! Appends are best effort: a failed write is retried a few times with
//! backoff, then dropped with an error log.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use super::{Ledger, ViolationRecord};

/// Queue depth before records are dropped.
const QUEUE_DEPTH: usize = 1024;
/// Append attempts per record.
const MAX_ATTEMPTS: u32 = 3;
/// Delay before the first retry; doubles per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

enum WriterMsg {
    Append(ViolationRecord),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background ledger writer task.
pub struct LedgerWriter {
    tx: mpsc::Sender<WriterMsg>,
}

impl LedgerWriter {
    /// Spawn the writer task over the given ledger.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(ledger: Arc<dyn Ledger>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(run(ledger, rx));
        Self { tx }
    }

    /// Enqueue a record without waiting for the append.
    ///
    /// A full or closed queue drops the record with a warning; the
    /// decision this record describes has already been returned.
    pub fn record(&self, record: ViolationRecord) {
        if let Err(e) = self.tx.try_send(WriterMsg::Append(record)) {
            warn!(error = %e, "Dropping violation record, ledger queue unavailable");
        }
    }

    /// Wait until every record enqueued before this call has been appended.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriterMsg::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run(ledger: Arc<dyn Ledger>, mut rx: mpsc::Receiver<WriterMsg>) {
    debug!("Ledger writer started");

    while let Some(msg) = rx.recv().await {
        match msg {
            WriterMsg::Append(record) => append_with_retry(&*ledger, &record).await,
            WriterMsg::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Ledger writer stopped");
}

async fn append_with_retry(ledger: &dyn Ledger, record: &ViolationRecord) {
    for attempt in 0..MAX_ATTEMPTS {
        match ledger.append(record).await {
            Ok(()) => return,
            Err(e) => {
                warn!(
                    id = %record.id,
                    attempt = attempt + 1,
                    error = %e,
                    "Ledger append failed"
                );
            }
        }

        let backoff = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..25));
        tokio::time::sleep(backoff + jitter).await;
    }

    error!(id = %record.id, "Dropping violation record after {} attempts", MAX_ATTEMPTS);
}
