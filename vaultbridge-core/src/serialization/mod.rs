//! Deterministic binary encoding for cross-chain messages.
//!
//! Every payload that leaves a chain is encoded with one fixed bincode
//! configuration, so the byte length used for fee quotes and the bytes
//! checked on the receiving side are identical on every platform.

mod bincode_config;

pub use bincode_config::{deserialize, serialize, serialized_size};
