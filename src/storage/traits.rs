//! Persistence trait and the sync bookkeeping record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Loop;
use crate::error::Result;

/// Sync bookkeeping stored next to the loops
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// Server timestamp of the last successful sync
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,

    /// Local changes not yet pushed
    #[serde(default)]
    pub pending_changes: bool,
}

/// Durable home for the loop collection.
///
/// Implementations must replace the stored collection atomically on `save`:
/// a reader sees either the old or the new collection, never a mix.
pub trait Persistence: Send + Sync {
    /// Load the stored collection. `None` when nothing (or nothing non-empty) is stored.
    fn load(&self) -> Result<Option<Vec<Loop>>>;

    /// Replace the stored collection with `loops`
    fn save(&self, loops: &[Loop]) -> Result<()>;

    fn load_sync_state(&self) -> Result<SyncState>;

    fn save_sync_state(&self, state: &SyncState) -> Result<()>;

    /// Set or clear the pending-changes flag, keeping the last sync time
    fn mark_pending(&self, pending: bool) -> Result<()> {
        let mut state = self.load_sync_state()?;
        state.pending_changes = pending;
        self.save_sync_state(&state)
    }
}
