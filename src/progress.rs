//! Progress calculation for loops.
//!
//! Own progress looks only at a loop's subtasks. Cascade progress also counts
//! each non-expired child loop as one unit that is done when the child itself
//! cascades to 100%.

use crate::domain::{Loop, LoopStatus, Tier};

/// Integer percentage of `done / total`, rounded half-up. Zero when `total` is 0.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((200 * done + total) / (2 * total)) as u8
}

/// Percentage of the loop's own subtasks marked done.
///
/// A loop with no subtasks is at 0, not 100.
pub fn own_progress(l: &Loop) -> u8 {
    percent(l.done_count(), l.subtasks.len())
}

/// Loops linked to `parent` that still count toward its progress.
///
/// Only loops exactly one tier below `parent` qualify. A link that skips a
/// tier, points at its own tier or at itself is treated as dangling.
pub fn active_children<'a>(parent: &'a Loop, all: &'a [Loop]) -> impl Iterator<Item = &'a Loop> + 'a {
    all.iter().filter(move |c| {
        c.linked_to.as_deref() == Some(parent.id.as_str())
            && c.tier.parent() == Some(parent.tier)
            && !c.is_expired()
    })
}

/// Completion of a loop including its linked children.
///
/// Each recursion step descends one tier, so depth is at most two.
pub fn cascade_progress(l: &Loop, all: &[Loop]) -> u8 {
    let mut done = l.done_count();
    let mut total = l.subtasks.len();
    for child in active_children(l, all) {
        total += 1;
        if cascade_progress(child, all) == 100 {
            done += 1;
        }
    }
    percent(done, total)
}

/// Status to show for a loop: closed once it cascades to 100%
pub fn display_status(l: &Loop, all: &[Loop]) -> LoopStatus {
    if cascade_progress(l, all) == 100 {
        LoopStatus::Closed
    } else if l.is_expired() {
        LoopStatus::Expired
    } else {
        LoopStatus::Active
    }
}

/// Mean cascade progress across `loops`, rounded half-up; 0 for an empty set
pub fn momentum(loops: &[&Loop], all: &[Loop]) -> u8 {
    let sum: usize = loops.iter().map(|l| cascade_progress(l, all) as usize).sum();
    percent(sum, loops.len() * 100)
}

/// Momentum of every loop in one period of a tier, expired ones included
pub fn period_momentum(all: &[Loop], tier: Tier, period: &str) -> u8 {
    let loops: Vec<&Loop> = all.iter().filter(|l| l.tier == tier && l.period == period).collect();
    momentum(&loops, all)
}
