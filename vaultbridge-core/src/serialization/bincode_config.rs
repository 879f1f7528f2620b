//! Bincode options shared by every encoder in the workspace.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::SerializationError;

/// Fixed-width little-endian integers; trailing bytes are an error.
fn config() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Encode a value with the wire configuration.
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    config()
        .serialize(value)
        .map_err(|e| SerializationError::EncodeFailed(e.to_string()))
}

/// Decode a value, rejecting malformed input and trailing bytes.
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    config()
        .deserialize(bytes)
        .map_err(|e| SerializationError::DecodeFailed(e.to_string()))
}

/// Encoded length of a value, without allocating the buffer.
///
/// Transport fees are quoted per byte, so callers use this to price a
/// message before it is built for dispatch.
pub fn serialized_size<T: Serialize>(value: &T) -> Result<u64, SerializationError> {
    config()
        .serialized_size(value)
        .map_err(|e| SerializationError::EncodeFailed(e.to_string()))
}
