//! ID generation utilities
//!
//! Loops and subtasks get opaque ids; nothing in the engine parses them.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a unique loop ID
///
/// Format: `l{timestamp_ms}-{random_hex}`
/// Example: `l1738300800123-a1b2c3d4`
pub fn generate_loop_id() -> String {
    let random: u32 = rand::rng().random();
    format!("l{}-{:08x}", now_ms(), random)
}

/// Generate a unique subtask ID
///
/// Format: `s{timestamp_ms}-{random_hex}`
pub fn generate_subtask_id() -> String {
    let random: u32 = rand::rng().random();
    format!("s{}-{:08x}", now_ms(), random)
}
