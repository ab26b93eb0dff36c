//! Errors raised by the persistence layer.

use thiserror::Error;

/// Failure reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("persisted record is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend itself could not be reached (e.g. `localStorage` disabled).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
