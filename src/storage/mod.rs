//! Storage layer: durable home for the loop collection and sync bookkeeping.

mod jsonl;
mod memory;
pub mod seed;
mod traits;

pub use jsonl::JsonlStorage;
pub use memory::MemoryStorage;
pub use seed::build_seed;
pub use traits::{Persistence, SyncState};
