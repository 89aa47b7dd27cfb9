//! Failures in framing and message handling.

use thiserror::Error;

/// Result alias for framing operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame exceeds the size cap.
    #[error("message of {size} bytes exceeds the {max} byte limit")]
    MessageTooLarge { size: u32, max: u32 },

    /// JSON encoding or decoding failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// The length prefix announced a zero-byte payload.
    #[error("empty message")]
    EmptyMessage,

    /// An I/O phase outlived its deadline.
    #[error("timeout during {operation}")]
    Timeout { operation: String },
}
