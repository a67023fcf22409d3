//! JSONL-based storage with an in-memory cache.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/
//! ├── loops.jsonl       # one loop per line
//! └── sync_state.json   # { "lastSync": ..., "pendingChanges": ... }
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::debug;

use super::traits::{Persistence, SyncState};
use crate::domain::Loop;
use crate::error::{LoopcycleError, Result};

const LOOPS_FILE: &str = "loops.jsonl";
const SYNC_STATE_FILE: &str = "sync_state.json";

/// JSONL-based storage with in-memory caching.
pub struct JsonlStorage {
    base_path: PathBuf,
    cache: RwLock<Option<Vec<Loop>>>,
}

impl std::fmt::Debug for JsonlStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlStorage")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

impl JsonlStorage {
    /// Create a new JsonlStorage at the given path.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            cache: RwLock::new(None),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn loops_path(&self) -> PathBuf {
        self.base_path.join(LOOPS_FILE)
    }

    fn sync_state_path(&self) -> PathBuf {
        self.base_path.join(SYNC_STATE_FILE)
    }

    fn read_loops(&self) -> Result<Vec<Loop>> {
        let path = self.loops_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut loops = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let l: Loop = serde_json::from_str(&line).map_err(|e| {
                LoopcycleError::Storage(format!("{} line {}: {}", path.display(), index + 1, e))
            })?;
            loops.push(l);
        }
        Ok(loops)
    }

    /// Write `contents` to a sibling temp file, then rename over `path`.
    fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Persistence for JsonlStorage {
    fn load(&self) -> Result<Option<Vec<Loop>>> {
        {
            let cache = self.cache.read().map_err(|e| LoopcycleError::Storage(e.to_string()))?;
            if let Some(loops) = cache.as_ref() {
                return Ok((!loops.is_empty()).then(|| loops.clone()));
            }
        }

        let loops = self.read_loops()?;
        debug!("Loaded {} loops from {}", loops.len(), self.loops_path().display());

        let mut cache = self.cache.write().map_err(|e| LoopcycleError::Storage(e.to_string()))?;
        *cache = Some(loops.clone());
        Ok((!loops.is_empty()).then_some(loops))
    }

    fn save(&self, loops: &[Loop]) -> Result<()> {
        let mut buf = Vec::new();
        for l in loops {
            serde_json::to_writer(&mut buf, l)?;
            buf.push(b'\n');
        }
        Self::write_atomic(&self.loops_path(), &buf)?;

        let mut cache = self.cache.write().map_err(|e| LoopcycleError::Storage(e.to_string()))?;
        *cache = Some(loops.to_vec());
        debug!("Saved {} loops to {}", loops.len(), self.loops_path().display());
        Ok(())
    }

    fn load_sync_state(&self) -> Result<SyncState> {
        let path = self.sync_state_path();
        if !path.exists() {
            return Ok(SyncState::default());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(SyncState::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save_sync_state(&self, state: &SyncState) -> Result<()> {
        let content = serde_json::to_vec_pretty(state)?;
        Self::write_atomic(&self.sync_state_path(), &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LoopKind, Tier};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_storage() -> (JsonlStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonlStorage::new(temp_dir.path()).unwrap();
        (storage, temp_dir)
    }

    fn sample() -> Vec<Loop> {
        vec![
            Loop::new(Tier::Monthly, LoopKind::Open, "Ship", "2024-03").with_steps(["scope", "launch"]),
            Loop::new(Tier::Daily, LoopKind::Windowed, "Read", "2024-03-05").recurring(),
        ]
    }

    #[test]
    fn test_load_missing_is_none() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let (storage, _temp) = create_test_storage();
        let loops = sample();
        storage.save(&loops).unwrap();
        assert_eq!(storage.load().unwrap(), Some(loops));
    }

    #[test]
    fn test_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let loops = sample();
        {
            let storage = JsonlStorage::new(temp_dir.path()).unwrap();
            storage.save(&loops).unwrap();
        }
        let storage = JsonlStorage::new(temp_dir.path()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(loops));
    }

    #[test]
    fn test_one_loop_per_line() {
        let (storage, temp) = create_test_storage();
        storage.save(&sample()).unwrap();
        let content = fs::read_to_string(temp.path().join(LOOPS_FILE)).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"linkedTo\":null"));
        assert!(!temp.path().join("loops.tmp").exists());
    }

    #[test]
    fn test_save_empty_loads_none() {
        let (storage, _temp) = create_test_storage();
        storage.save(&sample()).unwrap();
        storage.save(&[]).unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_line_is_storage_error() {
        let (storage, temp) = create_test_storage();
        fs::write(temp.path().join(LOOPS_FILE), "{not json}\n").unwrap();
        assert!(matches!(storage.load(), Err(LoopcycleError::Storage(_))));
    }

    #[test]
    fn test_sync_state_round_trip() {
        let (storage, temp) = create_test_storage();
        assert_eq!(storage.load_sync_state().unwrap(), SyncState::default());

        let state = SyncState {
            last_sync: Some(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()),
            pending_changes: true,
        };
        storage.save_sync_state(&state).unwrap();
        assert_eq!(storage.load_sync_state().unwrap(), state);

        let raw = fs::read_to_string(temp.path().join(SYNC_STATE_FILE)).unwrap();
        assert!(raw.contains("pendingChanges"));
    }

    #[test]
    fn test_mark_pending_keeps_last_sync() {
        let (storage, _temp) = create_test_storage();
        let when = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        storage
            .save_sync_state(&SyncState {
                last_sync: Some(when),
                pending_changes: false,
            })
            .unwrap();

        storage.mark_pending(true).unwrap();
        let state = storage.load_sync_state().unwrap();
        assert!(state.pending_changes);
        assert_eq!(state.last_sync, Some(when));
    }
}
