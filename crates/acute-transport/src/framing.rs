//! Length-prefixed framing for point-to-point payloads.
//!
//! The length prefix is 64 bits wide: shard sizes scale with model size,
//! and a 32-bit prefix would cap a single shard at 2 GiB.

use crate::error::TransportError;

/// Prepend an 8-byte little-endian length prefix to `payload`.
#[must_use]
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(8 + payload.len());
    framed.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// Split a framed buffer back into its declared length and payload,
/// rejecting a buffer whose actual length disagrees with the prefix.
pub fn decode_frame(framed: &[u8]) -> Result<&[u8], TransportError> {
    if framed.len() < 8 {
        return Err(TransportError::FrameMismatch {
            expected: 8,
            got: framed.len() as u64,
        });
    }
    let (len_bytes, payload) = framed.split_at(8);
    let expected = u64::from_le_bytes(len_bytes.try_into().unwrap());
    if payload.len() as u64 != expected {
        return Err(TransportError::FrameMismatch {
            expected,
            got: payload.len() as u64,
        });
    }
    Ok(payload)
}
