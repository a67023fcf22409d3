//! Persistence and sync integration tests
//!
//! Uses a mock sync client against real on-disk storage.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use loopcycle::domain::{Loop, LoopKind, Tier};
use loopcycle::error::Result;
use loopcycle::storage::{JsonlStorage, Persistence, build_seed};
use loopcycle::store::LoopStore;
use loopcycle::sync::{SyncClient, SyncConflict, SyncError, SyncManager, SyncOutcome, SyncResponse};
use tempfile::TempDir;

/// Mock server holding its own copy of the collection
struct MockServer {
    online: bool,
    loops: Mutex<Vec<Loop>>,
    last_sync_seen: Mutex<Vec<Option<DateTime<Utc>>>>,
}

impl MockServer {
    fn new(online: bool) -> Self {
        Self {
            online,
            loops: Mutex::new(Vec::new()),
            last_sync_seen: Mutex::new(Vec::new()),
        }
    }
}

fn server_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 18, 0, 0).unwrap()
}

#[async_trait]
impl SyncClient for MockServer {
    async fn sync(
        &self,
        loops: &[Loop],
        last_sync: Option<DateTime<Utc>>,
    ) -> std::result::Result<SyncResponse, SyncError> {
        if !self.online {
            return Err(SyncError::Network("connection refused".to_string()));
        }
        self.last_sync_seen.lock().unwrap().push(last_sync);
        let conflicts = if last_sync.is_some() {
            vec![SyncConflict {
                client_id: loops[0].id.clone(),
                reason: "server_modified".to_string(),
            }]
        } else {
            vec![]
        };
        *self.loops.lock().unwrap() = loops.to_vec();
        Ok(SyncResponse {
            loops: loops.to_vec(),
            server_timestamp: server_time(),
            conflicts,
        })
    }

    async fn fetch_loops(&self) -> std::result::Result<Vec<Loop>, SyncError> {
        if !self.online {
            return Err(SyncError::Network("connection refused".to_string()));
        }
        Ok(self.loops.lock().unwrap().clone())
    }

    fn is_authenticated(&self) -> bool {
        true
    }
}

#[test]
fn test_store_survives_restart() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

    let toggled_id = {
        let storage = JsonlStorage::new(temp_dir.path())?;
        let mut store = LoopStore::new(storage.load()?.unwrap_or_else(|| build_seed(today)));
        store.toggle_subtask("d1", "g2")?;
        store.append_subtask("w1", "Write docs")?;
        storage.save(store.loops())?;
        "g2"
    };

    let storage = JsonlStorage::new(temp_dir.path())?;
    let store = LoopStore::new(storage.load()?.expect("saved collection"));
    let d1 = store.get("d1").unwrap();
    assert!(d1.subtasks.iter().find(|s| s.id == toggled_id).unwrap().done);
    assert_eq!(store.get("w1").unwrap().subtasks.last().unwrap().text, "Write docs");
    assert_eq!(store.len(), 12);
    Ok(())
}

#[tokio::test]
async fn test_sync_then_offline_keeps_local_state() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = Arc::new(JsonlStorage::new(temp_dir.path())?);
    let local = vec![Loop::new(Tier::Monthly, LoopKind::Open, "Ship", "2024-03")];

    let online = SyncManager::new(Arc::new(MockServer::new(true)), storage.clone());
    match online.sync(&local).await {
        SyncOutcome::Synced { loops, conflicts } => {
            assert_eq!(loops, local);
            assert!(conflicts.is_empty());
        }
        other => panic!("expected synced, got {:?}", other),
    }
    let state = storage.load_sync_state()?;
    assert_eq!(state.last_sync, Some(server_time()));
    assert!(!state.pending_changes);

    let offline = SyncManager::new(Arc::new(MockServer::new(false)), storage.clone());
    assert_eq!(offline.sync(&local).await, SyncOutcome::Offline);
    let state = storage.load_sync_state()?;
    assert!(state.pending_changes);
    assert_eq!(state.last_sync, Some(server_time()));
    assert_eq!(storage.load()?, Some(local));
    Ok(())
}

#[tokio::test]
async fn test_second_sync_reports_conflicts() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = Arc::new(JsonlStorage::new(temp_dir.path())?);
    let server = Arc::new(MockServer::new(true));
    let manager = SyncManager::new(server.clone(), storage);
    let local = vec![Loop::new(Tier::Weekly, LoopKind::Open, "Ship", "2024-W10")];

    manager.sync(&local).await;
    match manager.sync(&local).await {
        SyncOutcome::Synced { conflicts, .. } => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].client_id, local[0].id);
        }
        other => panic!("expected synced, got {:?}", other),
    }
    assert_eq!(*server.last_sync_seen.lock().unwrap(), vec![None, Some(server_time())]);
    Ok(())
}

#[tokio::test]
async fn test_migration_pushes_seed_to_empty_server() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = Arc::new(JsonlStorage::new(temp_dir.path())?);
    let server = Arc::new(MockServer::new(true));
    let manager = SyncManager::new(server.clone(), storage.clone());
    let seed = build_seed(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());

    let migration = manager.migrate_local_to_server(&seed).await?;
    assert_eq!(migration.migrated, 12);
    assert_eq!(server.loops.lock().unwrap().len(), 12);
    assert_eq!(storage.load()?.map(|l| l.len()), Some(12));

    // a second device finds the server populated and adopts it
    let other_dir = TempDir::new()?;
    let other_storage = Arc::new(JsonlStorage::new(other_dir.path())?);
    let other = SyncManager::new(server, other_storage.clone());
    let local_only = vec![Loop::new(Tier::Daily, LoopKind::Open, "Local", "2024-03-05")];
    let adopted = other.migrate_local_to_server(&local_only).await?;
    assert_eq!(adopted.migrated, 0);
    assert_eq!(adopted.loops.len(), 12);
    assert!(other_storage.load_sync_state()?.last_sync.is_some());
    Ok(())
}
