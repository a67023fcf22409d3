//! Error types for loopcycle
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in the loop engine
#[derive(Debug, Error)]
pub enum LoopcycleError {
    /// Loop not found in the store
    #[error("Loop not found: {0}")]
    LoopNotFound(String),

    /// Subtask not found on the given loop
    #[error("Subtask not found: {subtask_id} on loop {loop_id}")]
    SubtaskNotFound { loop_id: String, subtask_id: String },

    /// Period key does not parse for its tier
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Link target is missing or in the wrong tier
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    /// Loop record violates a data-model invariant
    #[error("Invalid loop: {0}")]
    InvalidLoop(String),

    /// Operation not valid in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Sync server error
    #[error("Sync error: {0}")]
    Sync(#[from] crate::sync::SyncError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for loopcycle operations
pub type Result<T> = std::result::Result<T, LoopcycleError>;
