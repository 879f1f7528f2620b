//! Liquidity bridge transfers.

use serde::{Deserialize, Serialize};

use super::ids::{Address, ChainId, TransportId};
use crate::error::SerializationError;
use crate::serialization::{deserialize, serialize};
use crate::u256::U256;

/// Tokens handed to a bridge endpoint, queued for delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityTransfer {
    /// Per-chain transfer id.
    pub transfer_id: u64,
    /// Chain the tokens left.
    pub src_chain: ChainId,
    /// Chain the tokens are headed to.
    pub dst_chain: ChainId,
    /// Bridge used.
    pub transport_id: TransportId,
    /// Bridge endpoint now holding the tokens.
    pub endpoint: Address,
    /// Account the tokens came from.
    pub sender: Address,
    /// Token handed to the bridge.
    pub asset: Address,
    /// Amount handed to the bridge.
    pub amount: U256,
    /// Opaque route bytes.
    pub route: Vec<u8>,
    /// Native value forwarded with the leg.
    pub native_amount: U256,
}

/// Route understood by the devnet bridge: who receives, and in which token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRoute {
    /// Recipient on the destination chain.
    pub recipient: Address,
    /// Token delivered on the destination chain.
    pub output_asset: Address,
}

impl BridgeRoute {
    /// Encode as route bytes.
    pub fn encode(&self) -> Result<Vec<u8>, SerializationError> {
        serialize(self)
    }

    /// Decode route bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, SerializationError> {
        deserialize(bytes)
    }
}
