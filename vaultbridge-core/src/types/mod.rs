//! Core protocol data types.
//!
//! - Identifier aliases and addresses
//! - Roles granted by a chain's administrator
//! - User intents (liquidity leg + state leg)
//! - Payload records and their lifecycle status
//! - The cross-chain wire message and outbound envelope
//! - Liquidity transfers and the devnet bridge route
//! - The underlying vault interface and a reference vault

mod ids;
mod intent;
mod message;
mod payload;
mod role;
mod transfer;
mod vault;

pub use ids::{
    vault_chain, vault_id, Address, ChainId, PayloadId, TransportId, TxId, VaultId, VAULT_ID_STRIDE,
    ZERO_ADDRESS,
};
pub use intent::{LiquidityIntent, StateIntent};
pub use message::{CrossChainMessage, OutboundMessage};
pub use payload::{Payload, PayloadKind, PayloadStatus};
pub use role::Role;
pub use transfer::{BridgeRoute, LiquidityTransfer};
pub use vault::{Erc4626Vault, UnderlyingVault};
