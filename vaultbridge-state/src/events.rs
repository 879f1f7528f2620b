//! Protocol events.
//!
//! Every successful state transition appends one or more events to the
//! chain's log. Keepers and the devnet summary read them; nothing inside the
//! state machine depends on them.

use serde::{Deserialize, Serialize};
use vaultbridge_core::{Address, ChainId, PayloadId, PayloadKind, Role, TxId, VaultId, U256};

/// An observable state transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Role granted by the administrator.
    RoleGranted { role: Role, account: Address },
    /// Role revoked by the administrator.
    RoleRevoked { role: Role, account: Address },
    /// Trusted remote handler set for a chain.
    TrustedRemoteSet { chain: ChainId, remote: Address },
    /// Vault mapped by the executor.
    VaultAdded { vault_id: VaultId, vault: Address },
    /// Ledger dispatched a cross-chain deposit or withdrawal.
    CrossChainInitiated { tx_id: TxId, payload_id: PayloadId, kind: PayloadKind, dst_chain: ChainId },
    /// Same-chain deposit settled in one call.
    SameChainDeposit { user: Address, vault_ids: Vec<VaultId>, shares: Vec<U256> },
    /// Same-chain withdrawal settled in one call.
    SameChainWithdraw { user: Address, vault_ids: Vec<VaultId>, assets: Vec<U256> },
    /// Handler recorded an inbound payload.
    PayloadReceived { payload_id: PayloadId, src_chain: ChainId, kind: PayloadKind },
    /// Operator reported actual amounts.
    PayloadUpdated { payload_id: PayloadId, pending_transport: bool },
    /// Payload executed.
    PayloadProcessed { payload_id: PayloadId },
    /// Withdrawn assets routed to the user.
    WithdrawRouted { payload_id: PayloadId, user: Address, assets: Vec<U256> },
    /// Executor could not deposit some elements; they await rescue.
    FailedDeposits { payload_id: PayloadId, vault_ids: Vec<VaultId>, amounts: Vec<U256> },
    /// Ledger minted positions from a RETURN.
    Completed { tx_id: TxId, user: Address },
    /// Rescue proposed by the operator.
    RescueProposed { payload_id: PayloadId, amounts: Vec<U256> },
    /// Rescue disputed.
    RescueDisputed { payload_id: PayloadId, by: Address },
    /// Rescue paid out.
    RescueFinalized { payload_id: PayloadId, user: Address },
    /// Swap processor sent a leg through a bridge.
    SwapLegSent { transfer_id: u64, dst_chain: ChainId, amount: U256 },
    /// Wrapper token created.
    WrapperRegistered { vault_id: VaultId, symbol: String },
    /// Positions wrapped.
    Wrapped { vault_id: VaultId, owner: Address, amount: U256 },
    /// Positions unwrapped.
    Unwrapped { vault_id: VaultId, owner: Address, amount: U256 },
}
