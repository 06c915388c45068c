//! Event store errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid event file: {0}")]
    InvalidFile(String),

    #[error("Journal sequence gap: expected {expected}, got {actual}")]
    SequenceGap { expected: u64, actual: u64 },
}
