//! Domain types for loopcycle
//!
//! - Tier: daily, weekly and monthly time tiers
//! - Loop: one goal instance in a single period, with its subtasks

pub mod loop_record;
pub mod tier;

pub use loop_record::{Loop, LoopKind, LoopStatus, PALETTE, Subtask};
pub use tier::Tier;
