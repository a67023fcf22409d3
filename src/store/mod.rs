//! Loop store: the in-memory source of truth for the loop collection.
//!
//! # Example
//!
//! ```ignore
//! use loopcycle::domain::{Loop, LoopKind, Tier};
//! use loopcycle::store::LoopStore;
//!
//! let mut store = LoopStore::default();
//! let snapshot = store.add_loop(Loop::new(Tier::Daily, LoopKind::Windowed, "Read", "2024-03-05"))?;
//! assert_eq!(snapshot.len(), 1);
//! ```

mod loop_store;
mod validate;

pub use loop_store::{LoopStore, Snapshot};
pub use validate::{validate_link, validate_new_loop};
