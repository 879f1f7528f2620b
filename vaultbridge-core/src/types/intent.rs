//! User intents.
//!
//! A deposit or withdrawal is expressed as a pair of parallel intents: the
//! liquidity leg says how tokens move, the state leg says which vaults and
//! how much slippage is tolerated.

use serde::{Deserialize, Serialize};

use super::ids::{Address, ChainId, TransportId, VaultId};
use crate::u256::{U256, BPS_DENOMINATOR};

/// How tokens move for one sub-intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityIntent {
    /// Registered bridge to route through.
    pub transport_id: TransportId,

    /// Opaque route bytes handed to the bridge.
    pub tx_data: Vec<u8>,

    /// Token leaving the sender.
    pub asset: Address,

    /// Bridge endpoint the tokens are sent to.
    pub transport_endpoint: Address,

    /// Token amount leaving the sender.
    pub amount: U256,

    /// Native value forwarded with the bridge leg.
    pub native_amount: U256,
}

/// Which vaults a sub-intent targets and under what bounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateIntent {
    /// Chain hosting the vaults.
    pub dst_chain: ChainId,

    /// Asset amounts (deposit) or share amounts (withdraw), one per vault.
    pub amounts: Vec<U256>,

    /// Target vaults.
    pub vault_ids: Vec<VaultId>,

    /// Per-vault slippage tolerance in basis points.
    pub max_slippage_bps: Vec<u16>,

    /// Free-form flag carried to the destination.
    pub aux_flag: u8,

    /// Native value forwarded to the destination executor.
    pub relayer_fee_budget: U256,
}

impl StateIntent {
    /// Number of vault elements, or None when the parallel arrays disagree
    /// or are empty.
    pub fn arity(&self) -> Option<usize> {
        let n = self.vault_ids.len();
        if n == 0 || self.amounts.len() != n || self.max_slippage_bps.len() != n {
            None
        } else {
            Some(n)
        }
    }

    /// First slippage bound above 10 000 bps, if any.
    pub fn invalid_slippage_bound(&self) -> Option<u16> {
        self.max_slippage_bps
            .iter()
            .copied()
            .find(|bps| u64::from(*bps) > BPS_DENOMINATOR)
    }

    /// Sum of all element amounts.
    pub fn total_amount(&self) -> U256 {
        self.amounts.iter().fold(U256::zero(), |acc, a| acc + *a)
    }
}
