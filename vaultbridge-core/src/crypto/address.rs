//! Address derivation.

use super::hashing::sha256_concat;
use crate::types::{Address, ChainId};

/// Derive a deterministic address for a named principal on a chain.
///
/// The address is the first 20 bytes of SHA-256(label || chain_id_le).
pub fn derive_address(label: &str, chain_id: ChainId) -> Address {
    let hash = sha256_concat(&[label.as_bytes(), &chain_id.to_le_bytes()]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[..20]);
    address
}

/// Hex of the first four bytes, for log lines.
pub fn short_address(address: &Address) -> String {
    format!("0x{}", hex::encode(&address[..4]))
}
