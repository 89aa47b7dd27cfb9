//! Length-prefixed message framing.
//!
//! A framed message is a 4-byte big-endian payload length followed by the
//! JSON payload:
//!
//! ```text
//! +----------------+------------------+
//! | length (4 BE)  |  JSON payload    |
//! +----------------+------------------+
//! ```
//!
//! Both sides read the prefix first, then exactly `length` payload bytes,
//! so these helpers split the two steps: [`encode_frame`] produces a full
//! frame, [`read_length_prefix`] validates a prefix, and [`decode_payload`]
//! parses payload bytes already read off the wire.

use serde::{Serialize, de::DeserializeOwned};

use crate::MAX_MESSAGE_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

/// Encodes a message into a complete frame (length prefix + JSON payload).
pub fn encode_frame<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let json = serde_json::to_vec(message)?;
    let len = json.len() as u32;

    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut frame = Vec::with_capacity(4 + json.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&json);
    Ok(frame)
}

/// Validates a 4-byte length prefix and returns the payload length.
///
/// Rejects zero-length and oversized payloads before any allocation.
pub fn read_length_prefix(prefix: [u8; 4]) -> ProtocolResult<usize> {
    let len = u32::from_be_bytes(prefix);

    if len == 0 {
        return Err(ProtocolError::EmptyMessage);
    }
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    Ok(len as usize)
}

/// Decodes a message from payload bytes (without the length prefix).
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> ProtocolResult<T> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Envelope, Request};

    #[test]
    fn encode_decode_roundtrip() {
        let envelope = Envelope::request("req-123", Request::Ping);
        let frame = encode_frame(&envelope).unwrap();

        let prefix: [u8; 4] = frame[0..4].try_into().unwrap();
        let len = read_length_prefix(prefix).unwrap();
        assert_eq!(len, frame.len() - 4);

        let decoded: Envelope<Request> = decode_payload(&frame[4..]).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn rejects_zero_length_prefix() {
        let result = read_length_prefix(0u32.to_be_bytes());
        assert!(matches!(result, Err(ProtocolError::EmptyMessage)));
    }

    #[test]
    fn rejects_oversized_prefix() {
        let result = read_length_prefix((MAX_MESSAGE_SIZE + 1).to_be_bytes());
        assert!(matches!(
            result,
            Err(ProtocolError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn decode_rejects_malformed_payload() {
        let result: ProtocolResult<Envelope<Request>> = decode_payload(b"not json");
        assert!(matches!(result, Err(ProtocolError::Serialization(_))));
    }

    #[test]
    fn frame_length_matches_payload() {
        let envelope = Envelope::request("r", Request::Status);
        let frame = encode_frame(&envelope).unwrap();
        let json = serde_json::to_vec(&envelope).unwrap();
        assert_eq!(frame.len(), 4 + json.len());
        assert_eq!(&frame[4..], json.as_slice());
    }
}
