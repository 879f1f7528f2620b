//! Records kept alongside payloads.

use serde::{Deserialize, Serialize};
use vaultbridge_core::{Address, ChainId, PayloadId, PayloadKind, TxId, VaultId, U256};

/// Which component a state handler hands processed payloads to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerKind {
    /// Position ledger; receives RETURN payloads.
    Ledger,
    /// Vault executor; receives DEPOSIT and WITHDRAW payloads.
    Executor,
}

impl ControllerKind {
    /// Controller responsible for a payload kind.
    pub fn for_payload(kind: PayloadKind) -> Self {
        match kind {
            PayloadKind::Deposit | PayloadKind::Withdraw => ControllerKind::Executor,
            PayloadKind::Return => ControllerKind::Ledger,
        }
    }
}

/// Ledger history entry for a cross-chain transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Ledger transaction id.
    pub tx_id: TxId,
    /// Deposit or withdraw.
    pub kind: PayloadKind,
    /// Initiating user; receives minted positions.
    pub user: Address,
    /// Destination chain.
    pub dst_chain: ChainId,
    /// Target vaults.
    pub vault_ids: Vec<VaultId>,
    /// Declared amounts.
    pub amounts: Vec<U256>,
    /// Outbound payload carrying the transaction.
    pub payload_id: PayloadId,
    /// Set once a RETURN minted positions.
    pub synced: bool,
}

/// Elements of a deposit the executor could not place into their vaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDeposit {
    /// Inbound DEPOSIT payload.
    pub payload_id: PayloadId,
    /// Depositor; receives rescued assets.
    pub user: Address,
    /// Vaults that rejected the deposit.
    pub vault_ids: Vec<VaultId>,
    /// Assets held back per vault.
    pub amounts: Vec<U256>,
    /// Token per vault.
    pub assets: Vec<Address>,
    /// Operator proposal, if any.
    pub proposal: Option<RescueProposal>,
    /// Set once the rescue paid out.
    pub finalized: bool,
}

/// Amounts the operator proposes to return.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueProposal {
    /// Per-vault amounts, each at most the failed amount.
    pub amounts: Vec<U256>,
    /// Proposal timestamp; the dispute window starts here.
    pub proposed_at: u64,
}

/// Fungible wrapper over one vault's positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperToken {
    /// Wrapped vault.
    pub vault_id: VaultId,
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Wrapped supply; equals the positions the wrapper custodies.
    pub total_supply: U256,
}
