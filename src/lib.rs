//! Loopcycle - goal loops in daily, weekly and monthly tiers
//!
//! Loops live in a single period of their tier. Progress cascades up through
//! linked loops, and moving a tier into its next period rolls it over:
//! windowed loops expire, open loops carry forward, recurring loops regenerate.

pub mod calendar;
pub mod domain;
pub mod error;
pub mod id;
pub mod navigator;
pub mod progress;
pub mod rollover;
pub mod storage;
pub mod store;
pub mod sync;

pub use error::{LoopcycleError, Result};
