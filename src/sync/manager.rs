//! Sync manager: reconciles the local collection with the server.
//!
//! Local storage is the source of truth while offline. A successful sync
//! replaces it with the server's merged state; any failure leaves it alone
//! and marks changes as pending.

use std::sync::Arc;

use chrono::Utc;

use super::client::{SyncClient, SyncConflict, SyncError};
use crate::domain::Loop;
use crate::error::Result;
use crate::storage::{Persistence, SyncState};

/// How a sync attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Server state accepted; callers should `replace_all` with `loops`
    Synced {
        loops: Vec<Loop>,
        conflicts: Vec<SyncConflict>,
    },
    /// Server unreachable or failing; local data kept, changes pending
    Offline,
    /// Credentials rejected
    AuthError,
    /// No credentials configured
    SignedOut,
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }
}

/// Result of the first sync after signing in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Number of local loops pushed to the server
    pub migrated: usize,
    /// Collection to use from now on
    pub loops: Vec<Loop>,
}

pub struct SyncManager {
    client: Arc<dyn SyncClient>,
    persistence: Arc<dyn Persistence>,
}

impl SyncManager {
    pub fn new(client: Arc<dyn SyncClient>, persistence: Arc<dyn Persistence>) -> Self {
        Self { client, persistence }
    }

    pub fn persistence(&self) -> &Arc<dyn Persistence> {
        &self.persistence
    }

    /// Push `loops` and adopt the server's merged state
    pub async fn sync(&self, loops: &[Loop]) -> SyncOutcome {
        if !self.client.is_authenticated() {
            tracing::debug!("Sync skipped: signed out");
            return SyncOutcome::SignedOut;
        }

        let last_sync = match self.persistence.load_sync_state() {
            Ok(state) => state.last_sync,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read sync state, doing a full sync");
                None
            }
        };

        match self.client.sync(loops, last_sync).await {
            Ok(response) => {
                tracing::info!(
                    pushed = loops.len(),
                    received = response.loops.len(),
                    conflicts = response.conflicts.len(),
                    server_timestamp = %response.server_timestamp,
                    "Sync complete"
                );
                self.store_server_state(&response.loops, SyncState {
                    last_sync: Some(response.server_timestamp),
                    pending_changes: false,
                });
                SyncOutcome::Synced {
                    loops: response.loops,
                    conflicts: response.conflicts,
                }
            }
            Err(SyncError::Unauthorized) => {
                tracing::warn!("Sync rejected: unauthorized");
                SyncOutcome::AuthError
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sync failed, keeping local data");
                if let Err(e) = self.persistence.mark_pending(true) {
                    tracing::error!(error = %e, "Failed to mark pending changes");
                }
                SyncOutcome::Offline
            }
        }
    }

    /// First sync after signing in.
    ///
    /// A server that already holds loops wins over local data. Otherwise the
    /// local collection is pushed with no last-sync time. A failed fetch is
    /// treated as an empty server; a failed push is an error.
    pub async fn migrate_local_to_server(&self, local: &[Loop]) -> Result<Migration> {
        let server_loops = match self.client.fetch_loops().await {
            Ok(loops) => loops,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch server loops");
                Vec::new()
            }
        };

        if !server_loops.is_empty() {
            tracing::info!(count = server_loops.len(), "Server has data, using server loops");
            self.persistence.save(&server_loops)?;
            self.persistence.save_sync_state(&SyncState {
                last_sync: Some(Utc::now()),
                pending_changes: false,
            })?;
            return Ok(Migration {
                migrated: 0,
                loops: server_loops,
            });
        }

        if local.is_empty() {
            return Ok(Migration {
                migrated: 0,
                loops: Vec::new(),
            });
        }

        tracing::info!(count = local.len(), "Server empty, migrating local loops");
        let response = self.client.sync(local, None).await?;
        self.persistence.save(&response.loops)?;
        self.persistence.save_sync_state(&SyncState {
            last_sync: Some(response.server_timestamp),
            pending_changes: false,
        })?;
        Ok(Migration {
            migrated: local.len(),
            loops: response.loops,
        })
    }

    fn store_server_state(&self, loops: &[Loop], state: SyncState) {
        if let Err(e) = self.persistence.save(loops) {
            tracing::error!(error = %e, "Failed to save server loops");
            return;
        }
        if let Err(e) = self.persistence.save_sync_state(&state) {
            tracing::error!(error = %e, "Failed to save sync state");
        }
    }
}
