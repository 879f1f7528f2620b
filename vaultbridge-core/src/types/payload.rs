//! Payload records.
//!
//! A payload is the durable record a state handler keeps for every message it
//! dispatched or received. Inbound records walk a small state machine driven
//! by the payload operator:
//!
//! ```text
//! AwaitingReconciliation --update--> Reconciled --process--> Processed
//!                              \                         ^
//!                               +--> PendingTransport ---+
//! ```

use serde::{Deserialize, Serialize};

use super::ids::{Address, ChainId, PayloadId, TxId, VaultId};
use super::intent::LiquidityIntent;
use crate::u256::U256;

/// What a payload asks the receiving chain to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PayloadKind {
    /// Deposit bridged assets into destination vaults.
    Deposit,
    /// Redeem custodied shares and route assets back.
    Withdraw,
    /// Report minted shares back to the origin ledger.
    Return,
}

/// Lifecycle status of a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PayloadStatus {
    /// Received; the operator has not yet reported actual amounts.
    AwaitingReconciliation,
    /// Actual amounts are final and the funds are present.
    Reconciled,
    /// Actual amounts are final but bridged funds have not arrived.
    PendingTransport,
    /// Executed. Terminal.
    Processed,
}

impl PayloadStatus {
    /// True once actual amounts are fixed (including the pending side-exit).
    pub fn is_reconciled(&self) -> bool {
        matches!(self, PayloadStatus::Reconciled | PayloadStatus::PendingTransport)
    }
}

/// A dispatched or received cross-chain payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Local payload id.
    pub id: PayloadId,

    /// Requested action.
    pub kind: PayloadKind,

    /// Chain the payload originated on.
    pub src_chain: ChainId,

    /// Chain that executes it.
    pub dst_chain: ChainId,

    /// Payload id on the source chain; with `src_chain`, the replay key.
    pub origin_payload_id: PayloadId,

    /// Ledger that created the originating transaction.
    pub origin_ledger: Address,

    /// Depositor or withdrawer.
    pub user: Address,

    /// Ledger transaction on the origin chain.
    pub tx_id: TxId,

    /// Amounts declared by the sender (assets or shares).
    pub declared_amounts: Vec<U256>,

    /// Amounts reported by the operator; None until reconciled.
    pub actual_amounts: Option<Vec<U256>>,

    /// Vaults, parallel to the amounts.
    pub vault_ids: Vec<VaultId>,

    /// Per-vault slippage tolerance in basis points.
    pub max_slippage_bps: Vec<u16>,

    /// Free-form flag from the originating intent.
    pub aux_flag: u8,

    /// Bridge transfer id on the source chain that carries the deposit's tokens.
    pub liquidity_transfer: Option<u64>,

    /// Route for assets leaving the destination (withdrawals).
    pub route_out: Option<LiquidityIntent>,

    /// Current lifecycle status.
    pub status: PayloadStatus,

    /// Timestamp the record was created.
    pub created_at: u64,
}

impl Payload {
    /// Amounts to execute with: actual if reconciled, else declared.
    pub fn settled_amounts(&self) -> &[U256] {
        self.actual_amounts.as_deref().unwrap_or(&self.declared_amounts)
    }

    /// Whether the payload has been executed.
    #[inline]
    pub fn is_processed(&self) -> bool {
        self.status == PayloadStatus::Processed
    }
}
