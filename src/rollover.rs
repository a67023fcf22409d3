//! Rollover engine: moving a tier from one period to the next.
//!
//! Each loop of the outgoing period gets a disposition:
//!
//! ```text
//! cascade == 100                      → Closed     (nothing happens)
//! windowed, active, cascade < 100     → Expire     (status flips in place)
//! open, active, cascade < 100         → Carry      (new instance in target)
//! anything else                       → Untouched
//! ```
//!
//! Independently of progress, every recurring title of the tier gets a fresh
//! instance in the target period. `apply_rollover` is a pure function of its
//! inputs and never looks at the clock; running it twice with the same
//! periods produces nothing new the second time.

use std::collections::HashMap;

use log::debug;

use crate::domain::{Loop, LoopKind, LoopStatus, Tier};
use crate::progress::{cascade_progress, percent};

/// What rollover will do with one loop of the outgoing period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Closed,
    Expire,
    Carry,
    Untouched,
}

/// Decide the disposition of `l` given the full collection
pub fn classify(l: &Loop, all: &[Loop]) -> Disposition {
    if cascade_progress(l, all) == 100 {
        return Disposition::Closed;
    }
    if !l.is_active() {
        return Disposition::Untouched;
    }
    match l.kind {
        LoopKind::Windowed => Disposition::Expire,
        LoopKind::Open => Disposition::Carry,
    }
}

/// End-of-period breakdown shown before a rollover is confirmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSummary {
    pub closed: Vec<Loop>,
    pub expired: Vec<Loop>,
    pub rolling: Vec<Loop>,
}

impl PeriodSummary {
    pub fn total(&self) -> usize {
        self.closed.len() + self.expired.len() + self.rolling.len()
    }

    /// Whether the period has anything a user should see before moving on
    pub fn has_unresolved(&self) -> bool {
        self.total() > 0
    }

    /// Share of summarized loops that closed, rounded half-up
    pub fn closed_percent(&self) -> u8 {
        percent(self.closed.len(), self.total())
    }
}

/// Summarize the loops of `tier` in `period`
pub fn period_summary(loops: &[Loop], period: &str, tier: Tier) -> PeriodSummary {
    let mut summary = PeriodSummary::default();
    for l in loops.iter().filter(|l| l.tier == tier && l.period == period) {
        match classify(l, loops) {
            Disposition::Closed => summary.closed.push(l.clone()),
            Disposition::Expire => summary.expired.push(l.clone()),
            Disposition::Carry => summary.rolling.push(l.clone()),
            Disposition::Untouched => {}
        }
    }
    summary
}

/// Produce the loop collection after rolling `tier` from `source` to `target`.
///
/// Passes run in order: expire, recurrence, carry-forward. Carry-forward runs
/// last so its duplicate check sees the recurring instances just created.
pub fn apply_rollover(loops: &[Loop], source: &str, target: &str, tier: Tier) -> Vec<Loop> {
    let mut next = expire_pass(loops, source, tier);
    let created_recurring = recurrence_pass(loops, &mut next, target, tier);
    let created_carried = carry_pass(&mut next, source, target, tier);
    debug!(
        "Rollover {} {} -> {}: {} recurring, {} carried",
        tier, source, target, created_recurring, created_carried
    );
    next
}

fn in_period(l: &Loop, tier: Tier, period: &str) -> bool {
    l.tier == tier && l.period == period
}

fn expire_pass(loops: &[Loop], source: &str, tier: Tier) -> Vec<Loop> {
    loops
        .iter()
        .map(|l| {
            if in_period(l, tier, source) && classify(l, loops) == Disposition::Expire {
                Loop {
                    status: LoopStatus::Expired,
                    ..l.clone()
                }
            } else {
                l.clone()
            }
        })
        .collect()
}

/// Templates are picked from the collection as it was before this rollover
/// expired anything, so a windowed recurring loop that just expired still
/// regenerates.
fn recurrence_pass(before: &[Loop], next: &mut Vec<Loop>, target: &str, tier: Tier) -> usize {
    let mut latest: HashMap<&str, &Loop> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for l in before.iter().filter(|l| l.tier == tier && l.is_recurring() && !l.is_expired()) {
        match latest.get(l.title.as_str()) {
            Some(current) if current.period >= l.period => {}
            Some(_) => {
                latest.insert(l.title.as_str(), l);
            }
            None => {
                order.push(l.title.as_str());
                latest.insert(l.title.as_str(), l);
            }
        }
    }

    let mut created = Vec::new();
    for title in order {
        let exists = next
            .iter()
            .any(|l| in_period(l, tier, target) && l.title == title && l.is_recurring());
        if !exists {
            created.push(latest[title].regenerated_for(target));
        }
    }
    let count = created.len();
    next.extend(created);
    count
}

/// Duplicate guard is keyed on title: a target loop with the same title that
/// was either carried from `source` or is a recurring instance blocks the copy.
fn carry_pass(next: &mut Vec<Loop>, source: &str, target: &str, tier: Tier) -> usize {
    let all: &[Loop] = next.as_slice();
    let candidates: Vec<Loop> = all
        .iter()
        .filter(|l| in_period(l, tier, source) && classify(l, all) == Disposition::Carry)
        .cloned()
        .collect();

    let mut count = 0;
    for src in candidates {
        let exists = next.iter().any(|l| {
            in_period(l, tier, target)
                && l.title == src.title
                && (l.rolled_from.as_deref() == Some(source) || l.is_recurring())
        });
        if !exists {
            next.push(src.carried_into(source, target));
            count += 1;
        }
    }
    count
}
