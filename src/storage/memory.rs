//! In-memory persistence for tests and embedding.

use std::sync::RwLock;

use super::traits::{Persistence, SyncState};
use crate::domain::Loop;
use crate::error::{LoopcycleError, Result};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    loops: RwLock<Vec<Loop>>,
    state: RwLock<SyncState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loops(loops: Vec<Loop>) -> Self {
        Self {
            loops: RwLock::new(loops),
            state: RwLock::new(SyncState::default()),
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> LoopcycleError {
    LoopcycleError::Storage(e.to_string())
}

impl Persistence for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<Loop>>> {
        let loops = self.loops.read().map_err(poisoned)?;
        Ok((!loops.is_empty()).then(|| loops.clone()))
    }

    fn save(&self, loops: &[Loop]) -> Result<()> {
        *self.loops.write().map_err(poisoned)? = loops.to_vec();
        Ok(())
    }

    fn load_sync_state(&self) -> Result<SyncState> {
        Ok(self.state.read().map_err(poisoned)?.clone())
    }

    fn save_sync_state(&self, state: &SyncState) -> Result<()> {
        *self.state.write().map_err(poisoned)? = state.clone();
        Ok(())
    }
}
