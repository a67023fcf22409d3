//! In-memory loop collection with immutable snapshots.

use std::sync::Arc;

use log::info;

use super::validate::{validate_link, validate_new_loop};
use crate::domain::{Loop, Subtask, Tier};
use crate::error::{LoopcycleError, Result};

/// Shared, read-only view of the loop collection at one point in time
pub type Snapshot = Arc<[Loop]>;

/// Single source of truth for the loop collection.
///
/// Every mutation builds a new collection and swaps it in; snapshots handed
/// out earlier keep seeing the data they were taken from.
#[derive(Debug, Clone)]
pub struct LoopStore {
    current: Snapshot,
}

impl Default for LoopStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LoopStore {
    pub fn new(loops: Vec<Loop>) -> Self {
        Self { current: loops.into() }
    }

    /// The current snapshot (cheap `Arc` clone)
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.current)
    }

    pub fn loops(&self) -> &[Loop] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Loop> {
        self.current.iter().find(|l| l.id == id)
    }

    /// Loops of `tier` placed in `period`, in store order
    pub fn loops_in(&self, tier: Tier, period: &str) -> Vec<&Loop> {
        self.current
            .iter()
            .filter(|l| l.tier == tier && l.period == period)
            .collect()
    }

    /// All loops linked to `id`, expired ones included
    pub fn children_of(&self, id: &str) -> Vec<&Loop> {
        self.current
            .iter()
            .filter(|l| l.linked_to.as_deref() == Some(id))
            .collect()
    }

    /// Active loops of the tier above `loop_id`'s tier
    pub fn link_candidates(&self, loop_id: &str) -> Result<Vec<&Loop>> {
        let l = self.require(loop_id)?;
        Ok(match l.tier.parent() {
            Some(parent_tier) => self
                .current
                .iter()
                .filter(|p| p.tier == parent_tier && p.is_active())
                .collect(),
            None => Vec::new(),
        })
    }

    /// Add a new loop at the front of the collection
    pub fn add_loop(&mut self, l: Loop) -> Result<Snapshot> {
        validate_new_loop(&l, &self.current)?;
        let mut loops = Vec::with_capacity(self.current.len() + 1);
        loops.push(l);
        loops.extend(self.current.iter().cloned());
        Ok(self.commit(loops))
    }

    /// Flip the done flag of one subtask
    pub fn toggle_subtask(&mut self, loop_id: &str, subtask_id: &str) -> Result<Snapshot> {
        self.update(loop_id, |l| {
            let subtask = l.subtasks.iter_mut().find(|s| s.id == subtask_id).ok_or_else(|| {
                LoopcycleError::SubtaskNotFound {
                    loop_id: loop_id.to_string(),
                    subtask_id: subtask_id.to_string(),
                }
            })?;
            subtask.done = !subtask.done;
            Ok(())
        })
    }

    /// Append a new, not-done subtask at the end of the list
    pub fn append_subtask(&mut self, loop_id: &str, text: &str) -> Result<Snapshot> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LoopcycleError::InvalidLoop("subtask text is empty".to_string()));
        }
        self.update(loop_id, |l| {
            l.subtasks.push(Subtask::new(text));
            Ok(())
        })
    }

    /// Link `loop_id` to `parent_id`, or unlink with `None`
    pub fn set_link(&mut self, loop_id: &str, parent_id: Option<&str>) -> Result<Snapshot> {
        if let Some(parent_id) = parent_id {
            validate_link(self.require(loop_id)?, parent_id, &self.current)?;
        }
        self.update(loop_id, |l| {
            l.linked_to = parent_id.map(str::to_string);
            Ok(())
        })
    }

    /// Replace the whole collection, e.g. with a persisted or server copy
    pub fn replace_all(&mut self, loops: Vec<Loop>) -> Snapshot {
        info!("Replacing loop collection: {} -> {} loops", self.current.len(), loops.len());
        self.commit(loops)
    }

    fn require(&self, id: &str) -> Result<&Loop> {
        self.get(id).ok_or_else(|| LoopcycleError::LoopNotFound(id.to_string()))
    }

    fn update<F>(&mut self, loop_id: &str, f: F) -> Result<Snapshot>
    where
        F: FnOnce(&mut Loop) -> Result<()>,
    {
        let index = self
            .current
            .iter()
            .position(|l| l.id == loop_id)
            .ok_or_else(|| LoopcycleError::LoopNotFound(loop_id.to_string()))?;
        let mut loops = self.current.to_vec();
        f(&mut loops[index])?;
        Ok(self.commit(loops))
    }

    fn commit(&mut self, loops: Vec<Loop>) -> Snapshot {
        self.current = loops.into();
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LoopKind, LoopStatus};

    fn with_id(mut l: Loop, id: &str) -> Loop {
        l.id = id.to_string();
        l
    }

    fn seeded() -> LoopStore {
        let m = with_id(Loop::new(Tier::Monthly, LoopKind::Open, "Ship", "2024-03"), "m1");
        let w = with_id(
            Loop::new(Tier::Weekly, LoopKind::Open, "Auth", "2024-W10").with_steps(["a", "b"]),
            "w1",
        );
        let d = with_id(Loop::new(Tier::Daily, LoopKind::Windowed, "Login", "2024-03-05"), "d1");
        LoopStore::new(vec![m, w, d])
    }

    #[test]
    fn test_add_loop_prepends() {
        let mut store = seeded();
        let l = with_id(Loop::new(Tier::Daily, LoopKind::Open, "New", "2024-03-05"), "d2");
        let snap = store.add_loop(l).unwrap();
        assert_eq!(snap.len(), 4);
        assert_eq!(snap[0].id, "d2");
    }

    #[test]
    fn test_add_loop_validates() {
        let mut store = seeded();
        let bad = Loop::new(Tier::Monthly, LoopKind::Open, "Bad", "2024-W10");
        assert!(store.add_loop(bad).is_err());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_toggle_subtask_flips_done() {
        let mut store = seeded();
        let sid = store.get("w1").unwrap().subtasks[0].id.clone();

        let snap = store.toggle_subtask("w1", &sid).unwrap();
        assert!(snap.iter().find(|l| l.id == "w1").unwrap().subtasks[0].done);

        store.toggle_subtask("w1", &sid).unwrap();
        assert!(!store.get("w1").unwrap().subtasks[0].done);
    }

    #[test]
    fn test_toggle_unknown_ids() {
        let mut store = seeded();
        assert!(matches!(
            store.toggle_subtask("nope", "x"),
            Err(LoopcycleError::LoopNotFound(_))
        ));
        assert!(matches!(
            store.toggle_subtask("w1", "x"),
            Err(LoopcycleError::SubtaskNotFound { .. })
        ));
    }

    #[test]
    fn test_append_subtask() {
        let mut store = seeded();
        store.append_subtask("w1", "  Protect routes ").unwrap();
        let w = store.get("w1").unwrap();
        assert_eq!(w.subtasks.len(), 3);
        assert_eq!(w.subtasks[2].text, "Protect routes");
        assert!(!w.subtasks[2].done);
        assert!(store.append_subtask("w1", "   ").is_err());
    }

    #[test]
    fn test_set_link_and_unlink() {
        let mut store = seeded();
        store.set_link("w1", Some("m1")).unwrap();
        store.set_link("d1", Some("w1")).unwrap();
        assert_eq!(store.get("d1").unwrap().linked_to.as_deref(), Some("w1"));
        assert_eq!(store.children_of("m1").len(), 1);

        store.set_link("d1", None).unwrap();
        assert!(store.get("d1").unwrap().linked_to.is_none());
    }

    #[test]
    fn test_set_link_rejects_wrong_tier() {
        let mut store = seeded();
        assert!(store.set_link("d1", Some("m1")).is_err());
        assert!(store.set_link("m1", Some("w1")).is_err());
    }

    #[test]
    fn test_link_candidates() {
        let store = seeded();
        let ids: Vec<_> = store.link_candidates("d1").unwrap().iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, vec!["w1"]);
        assert!(store.link_candidates("m1").unwrap().is_empty());
    }

    #[test]
    fn test_snapshots_are_not_aliased() {
        let mut store = seeded();
        let before = store.snapshot();
        let sid = store.get("w1").unwrap().subtasks[0].id.clone();
        store.toggle_subtask("w1", &sid).unwrap();

        let old = before.iter().find(|l| l.id == "w1").unwrap();
        assert!(!old.subtasks[0].done);
        assert!(store.get("w1").unwrap().subtasks[0].done);
    }

    #[test]
    fn test_replace_all_is_idempotent() {
        let mut store = seeded();
        let mut loops = store.loops().to_vec();
        loops[0].status = LoopStatus::Expired;

        let a = store.replace_all(loops.clone());
        let b = store.replace_all(loops);
        assert_eq!(&*a, &*b);
    }

    #[test]
    fn test_replace_all_accepts_dangling_links() {
        let mut store = LoopStore::default();
        let d = Loop::new(Tier::Daily, LoopKind::Open, "Orphan", "2024-03-05").link_to("gone");
        store.replace_all(vec![d]);
        assert_eq!(store.len(), 1);
    }
}
