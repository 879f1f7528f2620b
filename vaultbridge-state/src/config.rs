//! Per-chain deployment configuration.

use serde::{Deserialize, Serialize};
use vaultbridge_core::crypto::derive_address;
use vaultbridge_core::{Address, ChainId, U256};

/// Default delay before a proposed rescue can be finalized (24 hours).
pub const DEFAULT_RESCUE_DELAY: u64 = 86_400;

/// Devnet rescue delay (10 seconds).
pub const DEVNET_RESCUE_DELAY: u64 = 10;

/// Addresses of the protocol components deployed on one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// This chain.
    pub chain_id: ChainId,

    /// Administrator: grants roles, registers vaults, bridges and remotes.
    pub admin: Address,

    /// Position ledger.
    pub ledger: Address,

    /// State handler; the sender of every outbound message.
    pub handler: Address,

    /// Vault executor; holds vault shares and receives bridged assets.
    pub executor: Address,

    /// Multi-leg swap processor.
    pub swap_processor: Address,

    /// Position wrapper; custodies wrapped positions.
    pub wrapper: Address,

    /// Transport endpoint; the only caller allowed to deliver messages.
    pub transport_endpoint: Address,

    /// Seconds a rescue proposal stays disputable.
    pub rescue_delay: u64,
}

impl ChainConfig {
    /// Deterministic devnet deployment for `chain_id`.
    pub fn devnet(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            admin: derive_address("admin", chain_id),
            ledger: derive_address("ledger", chain_id),
            handler: derive_address("state-handler", chain_id),
            executor: derive_address("vault-executor", chain_id),
            swap_processor: derive_address("swap-processor", chain_id),
            wrapper: derive_address("position-wrapper", chain_id),
            transport_endpoint: derive_address("transport", chain_id),
            rescue_delay: DEVNET_RESCUE_DELAY,
        }
    }
}

/// Transport pricing towards one destination chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat fee per message.
    pub base_fee: U256,
    /// Fee per encoded byte.
    pub per_byte_fee: U256,
}

impl FeeSchedule {
    /// Schedule with the given flat and per-byte components.
    pub fn new(base_fee: u64, per_byte_fee: u64) -> Self {
        Self {
            base_fee: U256::from(base_fee),
            per_byte_fee: U256::from(per_byte_fee),
        }
    }

    /// Fee for a message of `len` bytes.
    pub fn quote(&self, len: u64) -> U256 {
        self.base_fee + self.per_byte_fee * U256::from(len)
    }
}
