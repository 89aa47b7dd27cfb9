//! IPC framing and request/response types for wheretomeet.
//!
//! Client and server exchange length-prefixed JSON over a Unix socket:
//! 4 bytes big-endian payload length, then the JSON payload. Every message
//! is wrapped in an [`Envelope`] carrying the protocol version and a
//! request id for correlation.

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_payload, encode_frame, read_length_prefix};
pub use types::{Envelope, ErrorCode, ErrorResponse, Request, Response, StatusInfo};

/// Protocol version constant.
pub const PROTOCOL_VERSION: &str = "1";

/// Maximum message size (1 MB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;
