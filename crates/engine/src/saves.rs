//! Remote cell saves.
//!
//! Every save goes through one worker task, so the backend sees them in the
//! order they were issued. Two saves to the same cell can never land out of
//! order, and draining the queue is just a marker job that completes once
//! everything ahead of it has.

use std::collections::BTreeMap;
use std::sync::Arc;

use shiftgrid_core::{DerivedCounters, Scope, ShiftValue};
use shiftgrid_remote::{RemoteError, RemoteScheduleStore};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::notice::{Notice, Notifier};

/// Latest derived counters and the scope they were computed for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterBoard {
    pub scope: Option<Scope>,
    pub rows: BTreeMap<usize, DerivedCounters>,
}

/// A queued cell save. Dropping it lets the save finish unobserved.
pub struct PendingSave {
    pub row: usize,
    pub day: usize,
    done: oneshot::Receiver<Result<(), RemoteError>>,
}

impl PendingSave {
    /// Wait for the save (and the counter refresh that follows a success).
    pub async fn settled(self) -> Result<(), RemoteError> {
        self.done
            .await
            .unwrap_or_else(|_| Err(RemoteError::Network("save worker stopped".to_string())))
    }
}

pub(crate) async fn publish_counters(
    remote: &dyn RemoteScheduleStore,
    scope: Scope,
    board: &watch::Sender<CounterBoard>,
) {
    match remote.fetch_derived_counters(&scope).await {
        Ok(rows) => {
            board.send_replace(CounterBoard {
                scope: Some(scope),
                rows,
            });
        }
        Err(e) => warn!(scope = %scope, error = %e, "counter refresh failed, keeping previous values"),
    }
}

enum SaveJob {
    Cell {
        scope: Scope,
        row: usize,
        day: usize,
        value: ShiftValue,
        done: oneshot::Sender<Result<(), RemoteError>>,
    },
    Flush(oneshot::Sender<()>),
}

pub(crate) struct SaveQueue {
    remote: Arc<dyn RemoteScheduleStore>,
    counters: Arc<watch::Sender<CounterBoard>>,
    notifier: Notifier,
    tx: Option<mpsc::UnboundedSender<SaveJob>>,
}

impl SaveQueue {
    pub(crate) fn new(
        remote: Arc<dyn RemoteScheduleStore>,
        counters: Arc<watch::Sender<CounterBoard>>,
        notifier: Notifier,
    ) -> Self {
        Self {
            remote,
            counters,
            notifier,
            tx: None,
        }
    }

    /// The worker starts on first use, so a session can be built outside a
    /// runtime.
    fn sender(&mut self) -> &mpsc::UnboundedSender<SaveJob> {
        if self.tx.as_ref().is_some_and(|tx| tx.is_closed()) {
            warn!("save worker exited, starting a new one");
            self.tx = None;
        }
        self.tx.get_or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(run_worker(
                Arc::clone(&self.remote),
                Arc::clone(&self.counters),
                self.notifier.clone(),
                rx,
            ));
            tx
        })
    }

    pub(crate) fn push(&mut self, scope: Scope, row: usize, day: usize, value: ShiftValue) -> PendingSave {
        let (done, rx) = oneshot::channel();
        let job = SaveJob::Cell {
            scope,
            row,
            day,
            value,
            done,
        };
        if self.sender().send(job).is_err() {
            warn!(row, day, "save worker unavailable, save dropped");
        }
        PendingSave { row, day, done: rx }
    }

    /// Wait until every save queued so far has finished, whatever its
    /// outcome.
    pub(crate) async fn drain(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done, rx) = oneshot::channel();
        if tx.send(SaveJob::Flush(done)).is_ok() {
            let _ = rx.await;
        }
    }
}

async fn run_worker(
    remote: Arc<dyn RemoteScheduleStore>,
    board: Arc<watch::Sender<CounterBoard>>,
    notifier: Notifier,
    mut jobs: mpsc::UnboundedReceiver<SaveJob>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            SaveJob::Cell {
                scope,
                row,
                day,
                value,
                done,
            } => {
                let result = match remote.save_cell(&scope, row, day, &value).await {
                    Ok(()) => {
                        notifier.send(Notice::Saved { row, day });
                        publish_counters(remote.as_ref(), scope, &board).await;
                        Ok(())
                    }
                    Err(e) => {
                        warn!(scope = %scope, row, day, error = %e, "cell save failed");
                        notifier.send(Notice::SaveFailed {
                            row,
                            day,
                            message: e.to_string(),
                        });
                        Err(e)
                    }
                };
                // The caller may have dropped its handle.
                let _ = done.send(result);
            }
            SaveJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("save worker stopped");
}
