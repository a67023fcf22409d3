//! Period navigator: the `(day, week, month)` pointer and forward rollover.
//!
//! Moving backward only changes the pointer. Moving forward rolls the tier
//! over from the outgoing period into the next one. When the outgoing period
//! has anything to show, the move is returned as a [`PendingRollover`] and only
//! happens once [`Navigator::confirm`] is called with it.

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, Direction};
use crate::domain::Tier;
use crate::error::{LoopcycleError, Result};
use crate::rollover::{PeriodSummary, apply_rollover, period_summary};
use crate::store::{LoopStore, Snapshot};

/// Current period of each tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    pub day: String,
    pub week: String,
    pub month: String,
}

impl Pointer {
    /// Pointer with every tier on the period containing `date`
    pub fn at(date: NaiveDate) -> Self {
        Self {
            day: calendar::day_key(date),
            week: calendar::iso_week_key(date),
            month: calendar::month_key(date),
        }
    }

    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Daily => &self.day,
            Tier::Weekly => &self.week,
            Tier::Monthly => &self.month,
        }
    }

    /// Pointer after moving `tier` to `key`.
    ///
    /// A day move resets week and month to the ones containing the day. A
    /// week move resets the month to the one holding the week's Monday. A
    /// month move leaves day and week where they are.
    pub fn moved(&self, tier: Tier, key: &str) -> Result<Self> {
        match tier {
            Tier::Daily => Ok(Self::at(calendar::parse_day(key)?)),
            Tier::Weekly => Ok(Self {
                day: self.day.clone(),
                week: key.to_string(),
                month: calendar::month_of_week(key)?,
            }),
            Tier::Monthly => {
                calendar::validate_key(Tier::Monthly, key)?;
                Ok(Self {
                    month: key.to_string(),
                    ..self.clone()
                })
            }
        }
    }
}

/// A forward move waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRollover {
    pub tier: Tier,
    pub source: String,
    pub target: String,
    pub summary: PeriodSummary,
    from: Pointer,
    next: Pointer,
}

impl PendingRollover {
    /// Pointer the navigator will hold once confirmed
    pub fn next_pointer(&self) -> &Pointer {
        &self.next
    }
}

/// Result of a forward move
#[derive(Debug, Clone)]
pub enum Advance {
    /// Rolled over and moved; carries the new store snapshot
    Moved(Snapshot),
    /// Outgoing period needs review first
    Pending(PendingRollover),
}

#[derive(Debug, Clone)]
pub struct Navigator {
    pointer: Pointer,
}

impl Navigator {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            pointer: Pointer::at(today),
        }
    }

    pub fn from_pointer(pointer: Pointer) -> Self {
        Self { pointer }
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// Step `tier` back one period. Never rolls anything over.
    pub fn retreat(&mut self, tier: Tier) -> Result<&Pointer> {
        let previous = calendar::neighbor(self.pointer.get(tier), tier, Direction::Prev)?;
        self.pointer = self.pointer.moved(tier, &previous)?;
        Ok(&self.pointer)
    }

    /// Step `tier` forward one period, rolling the outgoing period over
    pub fn advance(&mut self, tier: Tier, store: &mut LoopStore) -> Result<Advance> {
        let source = self.pointer.get(tier).to_string();
        let target = calendar::neighbor(&source, tier, Direction::Next)?;
        let next = self.pointer.moved(tier, &target)?;
        let summary = period_summary(store.loops(), &source, tier);

        if summary.has_unresolved() {
            debug!(
                "Advance {} {} -> {} pending: {} closed, {} expiring, {} rolling",
                tier,
                source,
                target,
                summary.closed.len(),
                summary.expired.len(),
                summary.rolling.len()
            );
            return Ok(Advance::Pending(PendingRollover {
                tier,
                source,
                target,
                summary,
                from: self.pointer.clone(),
                next,
            }));
        }

        let snapshot = self.roll(store, &source, &target, tier, next);
        Ok(Advance::Moved(snapshot))
    }

    /// Apply a pending rollover and move the pointer.
    ///
    /// Fails when the pointer has moved since `pending` was issued.
    pub fn confirm(&mut self, pending: PendingRollover, store: &mut LoopStore) -> Result<Snapshot> {
        if pending.from != self.pointer {
            return Err(LoopcycleError::InvalidState(format!(
                "pointer moved since {} rollover {} -> {} was issued",
                pending.tier, pending.source, pending.target
            )));
        }
        Ok(self.roll(store, &pending.source, &pending.target, pending.tier, pending.next))
    }

    fn roll(&mut self, store: &mut LoopStore, source: &str, target: &str, tier: Tier, next: Pointer) -> Snapshot {
        let loops = apply_rollover(store.loops(), source, target, tier);
        let snapshot = store.replace_all(loops);
        self.pointer = next;
        snapshot
    }
}
