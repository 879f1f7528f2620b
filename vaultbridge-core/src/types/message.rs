//! Cross-chain wire message.

use serde::{Deserialize, Serialize};

use super::ids::{Address, ChainId, PayloadId, TxId, VaultId};
use super::intent::LiquidityIntent;
use super::payload::PayloadKind;
use crate::error::SerializationError;
use crate::serialization::{deserialize, serialize, serialized_size};
use crate::u256::U256;

/// The body a state handler hands to the transport.
///
/// For RETURN messages `amounts` are the shares minted per vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainMessage {
    /// Requested action.
    pub kind: PayloadKind,
    /// Dispatching chain.
    pub src_chain: ChainId,
    /// Executing chain.
    pub dst_chain: ChainId,
    /// Payload id assigned by the dispatching handler.
    pub origin_payload_id: PayloadId,
    /// Ledger that created the originating transaction.
    pub origin_ledger: Address,
    /// Depositor or withdrawer.
    pub user: Address,
    /// Ledger transaction on the origin chain.
    pub tx_id: TxId,
    /// Declared amounts.
    pub amounts: Vec<U256>,
    /// Vaults, parallel to the amounts.
    pub vault_ids: Vec<VaultId>,
    /// Slippage bounds, parallel to the amounts.
    pub max_slippage_bps: Vec<u16>,
    /// Free-form flag.
    pub aux_flag: u8,
    /// Bridge transfer carrying the deposit's tokens.
    pub liquidity_transfer: Option<u64>,
    /// Route for assets leaving the destination.
    pub route_out: Option<LiquidityIntent>,
}

impl CrossChainMessage {
    /// Wire encoding.
    pub fn encode(&self) -> Result<Vec<u8>, SerializationError> {
        serialize(self)
    }

    /// Decode wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, SerializationError> {
        deserialize(bytes)
    }

    /// Encoded length, used to quote the transport fee.
    pub fn encoded_len(&self) -> Result<u64, SerializationError> {
        serialized_size(self)
    }
}

/// A message waiting in a chain's outbox for the transport to relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Dispatching chain.
    pub src_chain: ChainId,
    /// Executing chain.
    pub dst_chain: ChainId,
    /// Dispatching handler; checked against the trusted remote on arrival.
    pub sender: Address,
    /// Encoded [`CrossChainMessage`].
    pub bytes: Vec<u8>,
    /// Transport fee paid at dispatch.
    pub fee_paid: U256,
    /// Native value delivered to the destination executor.
    pub airdrop: U256,
}
