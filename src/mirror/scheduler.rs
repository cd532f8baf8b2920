use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use log::{error, info, warn};
use parking_lot::Mutex;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Multiplier on the worker count bounding how many submitted-but-unfinished
/// tasks the walk may accumulate before recursion pauses.
pub(crate) const BACKPRESSURE_FACTOR: usize = 10;

/// One queued binary fetch. Owns its URL and destination outright, so a
/// worker needs nothing from the walk that submitted it.
#[derive(Debug, Clone)]
pub(crate) struct DownloadTask {
    pub(crate) url: String,
    pub(crate) dest: PathBuf,
}

/// A task that did not complete, kept for the end-of-run report.
#[derive(Debug, Clone)]
pub(crate) struct FailedDownload {
    pub(crate) url: String,
    pub(crate) dest: PathBuf,
    pub(crate) reason: String,
}

#[derive(Debug, Error)]
enum DownloadError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fixed-size pool of download workers fed by a bounded queue.
///
/// The queue capacity is `workers * BACKPRESSURE_FACTOR`, so a submission on
/// a full queue blocks instead of growing memory, and [Scheduler::wait_below_limit]
/// lets the walker pause recursion on the same bound. [Scheduler::drain]
/// consumes the scheduler, which is what makes "no submissions after drain"
/// hold.
pub(crate) struct Scheduler {
    tx: flume::Sender<DownloadTask>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
    /// Tasks submitted but not yet completed: queued plus in-flight.
    pending: Arc<AtomicUsize>,
    /// Signalled on every task completion; wakes the backpressure gate.
    completed: Arc<Notify>,
    failures: Arc<Mutex<Vec<FailedDownload>>>,
}

impl Scheduler {
    pub(crate) fn new(client: Client, worker_count: usize) -> Self {
        let (tx, rx) = flume::bounded(worker_count * BACKPRESSURE_FACTOR);
        let pending = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(Notify::new());
        let failures = Arc::new(Mutex::new(Vec::new()));

        let workers = (0..worker_count)
            .map(|_| {
                let rx = rx.clone();
                let client = client.clone();
                let pending = Arc::clone(&pending);
                let completed = Arc::clone(&completed);
                let failures = Arc::clone(&failures);
                tokio::spawn(async move {
                    while let Ok(task) = rx.recv_async().await {
                        match fetch_to_file(&client, &task).await {
                            Ok(()) => info!("downloaded {}", task.dest.display()),
                            Err(err) => {
                                error!("download of {} failed: {err}", task.url);
                                failures.lock().push(FailedDownload {
                                    url: task.url,
                                    dest: task.dest,
                                    reason: err.to_string(),
                                });
                            }
                        }
                        pending.fetch_sub(1, Ordering::SeqCst);
                        completed.notify_waiters();
                    }
                })
            })
            .collect();

        Scheduler {
            tx,
            workers,
            worker_count,
            pending,
            completed,
            failures,
        }
    }

    /// Queues a task for the workers. Blocks only when the queue is full.
    pub(crate) async fn submit(&self, task: DownloadTask) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send_async(task).await.is_err() {
            // Unreachable while the scheduler is alive; the channel only
            // closes when drain drops the sender.
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("download queue closed, task dropped");
        }
    }

    /// Tasks submitted but not yet completed.
    pub(crate) fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Blocks until the pending count is back under the backpressure bound.
    pub(crate) async fn wait_below_limit(&self) {
        let limit = self.worker_count * BACKPRESSURE_FACTOR;
        loop {
            // Register for the wakeup before re-checking, otherwise a
            // completion between the check and the await is lost.
            let notified = self.completed.notified();
            if self.pending_count() < limit {
                return;
            }
            notified.await;
        }
    }

    /// Waits for every submitted task to complete and returns the failures.
    /// Consuming `self` is what rejects submissions after the drain.
    pub(crate) async fn drain(self) -> Vec<FailedDownload> {
        // Workers exit their receive loop once the queue empties and the
        // sender side is gone.
        drop(self.tx);
        for result in join_all(self.workers).await {
            if let Err(err) = result {
                error!("download worker panicked: {err}");
            }
        }
        self.failures.lock().drain(..).collect()
    }
}

/// Streams one remote file to disk. A failure may leave a partially written
/// destination behind; the next run's skip check will not re-fetch it.
async fn fetch_to_file(client: &Client, task: &DownloadTask) -> Result<(), DownloadError> {
    let mut response = client.get(&task.url).send().await?.error_for_status()?;
    let mut file = File::create(&task.dest).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
