//! Invariant checks applied when loops enter the store through user actions.
//!
//! Collaborator data arriving through `replace_all` skips these checks; the
//! engine tolerates dangling links there instead.

use std::collections::HashSet;

use crate::calendar;
use crate::domain::Loop;
use crate::error::{LoopcycleError, Result};

/// Check a new loop against the data-model invariants and the existing collection
pub fn validate_new_loop(l: &Loop, existing: &[Loop]) -> Result<()> {
    if l.id.trim().is_empty() {
        return Err(LoopcycleError::InvalidLoop("id is empty".to_string()));
    }
    if existing.iter().any(|e| e.id == l.id) {
        return Err(LoopcycleError::InvalidLoop(format!("duplicate id {}", l.id)));
    }
    if l.title.trim().is_empty() {
        return Err(LoopcycleError::InvalidLoop("title is empty".to_string()));
    }
    calendar::validate_key(l.tier, &l.period)?;
    if let Some(recurrence) = l.recurrence {
        if recurrence != l.tier {
            return Err(LoopcycleError::InvalidLoop(format!(
                "{} loop cannot recur {}",
                l.tier, recurrence
            )));
        }
    }

    let mut seen = HashSet::new();
    for s in &l.subtasks {
        if !seen.insert(s.id.as_str()) {
            return Err(LoopcycleError::InvalidLoop(format!("duplicate subtask id {}", s.id)));
        }
    }

    if let Some(parent_id) = &l.linked_to {
        validate_link(l, parent_id, existing)?;
    }
    Ok(())
}

/// Check that `child` may link to `parent_id`.
///
/// The parent must exist, be active, and sit exactly one tier above the child.
pub fn validate_link(child: &Loop, parent_id: &str, loops: &[Loop]) -> Result<()> {
    let expected = child
        .tier
        .parent()
        .ok_or_else(|| LoopcycleError::InvalidLink(format!("{} loops cannot link", child.tier)))?;

    let parent = loops
        .iter()
        .find(|l| l.id == parent_id)
        .ok_or_else(|| LoopcycleError::InvalidLink(format!("parent {} does not exist", parent_id)))?;

    if parent.tier != expected {
        return Err(LoopcycleError::InvalidLink(format!(
            "{} loop must link to a {} loop, {} is {}",
            child.tier, expected, parent_id, parent.tier
        )));
    }
    if !parent.is_active() {
        return Err(LoopcycleError::InvalidLink(format!("parent {} is not active", parent_id)));
    }
    Ok(())
}
