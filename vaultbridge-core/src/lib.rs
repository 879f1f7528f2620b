//! # VaultBridge Core
//!
//! Shared building blocks for the cross-chain vault settlement protocol.
//!
//! This crate provides the foundation for the state machine and node crates:
//! - Identifier aliases (chain, vault, payload, transport) and 20-byte addresses
//! - 256-bit amounts with basis-point helpers
//! - User intents, payload records and the cross-chain wire message
//! - A reference ERC-4626-style vault behind the [`UnderlyingVault`] trait
//! - Deterministic binary serialization and SHA-256 address derivation

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crypto;
pub mod error;
pub mod serialization;
pub mod types;
pub mod u256;

pub use error::{CoreError, SerializationError, VaultError};
pub use types::{
    Address, ChainId, PayloadId, TransportId, TxId, VaultId, ZERO_ADDRESS,
    vault_chain, vault_id, VAULT_ID_STRIDE,
    BridgeRoute, LiquidityTransfer,
    CrossChainMessage, OutboundMessage,
    LiquidityIntent, StateIntent,
    Payload, PayloadKind, PayloadStatus,
    Role,
    Erc4626Vault, UnderlyingVault,
};
pub use u256::{U256, BPS_DENOMINATOR};
