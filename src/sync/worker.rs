//! Debounced background sync.
//!
//! Every snapshot handed to the worker restarts a quiet-period timer. Once no
//! new snapshot has arrived for the debounce window, the latest one is synced
//! and the outcome is reported on the outcome channel. Closing the worker
//! flushes a snapshot still waiting for its timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::manager::{SyncManager, SyncOutcome};
use crate::store::Snapshot;

/// Default quiet period before a sync fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

pub struct SyncWorker {
    snapshot_tx: mpsc::UnboundedSender<Snapshot>,
    handle: JoinHandle<()>,
}

impl SyncWorker {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(manager: Arc<SyncManager>, debounce: Duration) -> (Self, mpsc::Receiver<SyncOutcome>) {
        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::channel(16);
        let handle = tokio::spawn(run(manager, snapshot_rx, outcome_tx, debounce));
        (Self { snapshot_tx, handle }, outcome_rx)
    }

    /// Queue `snapshot` for sync. Returns false once the worker has stopped.
    pub fn notify(&self, snapshot: Snapshot) -> bool {
        self.snapshot_tx.send(snapshot).is_ok()
    }

    /// Stop accepting snapshots and wait for the final sync to finish
    pub async fn shutdown(self) {
        drop(self.snapshot_tx);
        if let Err(e) = self.handle.await {
            tracing::error!(error = ?e, "Sync worker panicked");
        }
    }
}

async fn run(
    manager: Arc<SyncManager>,
    mut snapshot_rx: mpsc::UnboundedReceiver<Snapshot>,
    outcome_tx: mpsc::Sender<SyncOutcome>,
    debounce: Duration,
) {
    while let Some(mut latest) = snapshot_rx.recv().await {
        let mut coalesced = 0usize;
        loop {
            tokio::select! {
                next = snapshot_rx.recv() => match next {
                    Some(snapshot) => {
                        latest = snapshot;
                        coalesced += 1;
                    }
                    None => break,
                },
                _ = tokio::time::sleep(debounce) => break,
            }
        }

        tracing::debug!(loops = latest.len(), coalesced, "Debounce elapsed, syncing");
        let outcome = manager.sync(&latest).await;
        if outcome_tx.send(outcome).await.is_err() {
            tracing::debug!("Outcome receiver dropped");
        }
    }
    tracing::debug!("Sync worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Loop, LoopKind, Tier};
    use crate::storage::MemoryStorage;
    use crate::sync::client::{SyncClient, SyncError, SyncResponse};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    struct CountingClient {
        pushed: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl SyncClient for CountingClient {
        async fn sync(
            &self,
            loops: &[Loop],
            _last_sync: Option<DateTime<Utc>>,
        ) -> std::result::Result<SyncResponse, SyncError> {
            self.pushed.lock().unwrap().push(loops.len());
            Ok(SyncResponse {
                loops: loops.to_vec(),
                server_timestamp: Utc::now(),
                conflicts: vec![],
            })
        }

        async fn fetch_loops(&self) -> std::result::Result<Vec<Loop>, SyncError> {
            Ok(vec![])
        }

        fn is_authenticated(&self) -> bool {
            true
        }
    }

    fn snapshot(n: usize) -> Snapshot {
        (0..n)
            .map(|i| Loop::new(Tier::Daily, LoopKind::Open, format!("Loop {}", i), "2024-03-05"))
            .collect::<Vec<_>>()
            .into()
    }

    fn setup() -> (Arc<SyncManager>, Arc<CountingClient>) {
        let client = Arc::new(CountingClient {
            pushed: Mutex::new(Vec::new()),
        });
        let manager = Arc::new(SyncManager::new(client.clone(), Arc::new(MemoryStorage::new())));
        (manager, client)
    }

    #[tokio::test]
    async fn test_burst_is_coalesced_into_one_sync() {
        let (manager, client) = setup();
        let (worker, mut outcomes) = SyncWorker::spawn(manager, Duration::from_millis(50));

        worker.notify(snapshot(1));
        worker.notify(snapshot(2));
        worker.notify(snapshot(3));

        let outcome = tokio::time::timeout(Duration::from_secs(2), outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.is_synced());
        assert_eq!(*client.pushed.lock().unwrap(), vec![3]);

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_snapshot() {
        let (manager, client) = setup();
        let (worker, mut outcomes) = SyncWorker::spawn(manager, Duration::from_secs(60));

        worker.notify(snapshot(2));
        worker.shutdown().await;

        assert_eq!(*client.pushed.lock().unwrap(), vec![2]);
        assert!(outcomes.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_separate_bursts_sync_separately() {
        let (manager, client) = setup();
        let (worker, mut outcomes) = SyncWorker::spawn(manager, Duration::from_millis(30));

        worker.notify(snapshot(1));
        outcomes.recv().await.unwrap();
        worker.notify(snapshot(4));
        outcomes.recv().await.unwrap();

        assert_eq!(*client.pushed.lock().unwrap(), vec![1, 4]);
        worker.shutdown().await;
    }
}
