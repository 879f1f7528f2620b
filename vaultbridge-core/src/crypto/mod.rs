//! Hashing and address derivation.
//!
//! Component and account addresses are 20 bytes, taken from the front of a
//! SHA-256 digest. Devnet deployments derive them from a label and chain id.

mod address;
mod hashing;

pub use address::{derive_address, short_address};
pub use hashing::{sha256, sha256_concat};
