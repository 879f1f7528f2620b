//! Identifier aliases.

/// 20-byte account or component address.
pub type Address = [u8; 20];

/// The all-zero address, used as "unset".
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Chain identifier.
pub type ChainId = u64;

/// Vault identifier, unique across all chains.
///
/// The hosting chain is encoded in the id: `chain * VAULT_ID_STRIDE + index`.
pub type VaultId = u64;

/// Maximum number of vaults one chain can register.
pub const VAULT_ID_STRIDE: u64 = 1_000;

/// Id of the `index`-th vault hosted on `chain`.
pub fn vault_id(chain: ChainId, index: u64) -> VaultId {
    chain * VAULT_ID_STRIDE + index
}

/// Chain hosting `vault_id`.
pub fn vault_chain(vault_id: VaultId) -> ChainId {
    vault_id / VAULT_ID_STRIDE
}

/// Payload identifier, unique per chain.
pub type PayloadId = u64;

/// Ledger transaction identifier, unique per origin chain.
pub type TxId = u64;

/// Identifier of a registered liquidity bridge.
pub type TransportId = u8;
