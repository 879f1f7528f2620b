//! Calls accepted by a chain and their receipts.

use serde::{Deserialize, Serialize};
use vaultbridge_core::{
    Address, ChainId, LiquidityIntent, PayloadId, Role, StateIntent, TransportId, TxId, VaultId,
    U256,
};

use crate::config::FeeSchedule;
use crate::state::ControllerKind;

use super::swap::SwapLeg;

/// Every externally callable operation, grouped by component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    // === Administration ===
    /// Grant a role (admin).
    GrantRole { role: Role, account: Address },
    /// Revoke a role (admin).
    RevokeRole { role: Role, account: Address },
    /// Trust a remote handler (core controller or admin).
    SetTrustedRemote { chain: ChainId, remote: Address },
    /// Register a bridge endpoint (admin).
    SetBridgeAddress { transport_id: TransportId, endpoint: Address },
    /// Set transport pricing towards a chain (admin).
    SetFeeSchedule { dst_chain: ChainId, schedule: FeeSchedule },
    /// Register the caller as a handler controller (core controller).
    RegisterController { kind: ControllerKind },

    // === Position Ledger ===
    /// Deposit into local or remote vaults. Payable.
    Deposit { liquidity: Vec<LiquidityIntent>, states: Vec<StateIntent> },
    /// Withdraw from local or remote vaults. Payable.
    Withdraw { states: Vec<StateIntent>, liquidity: Vec<LiquidityIntent> },
    /// Mint positions for a settled deposit (state handler only).
    StateSync { tx_id: TxId, src_chain: ChainId, vault_ids: Vec<VaultId>, shares: Vec<U256> },
    /// Approve or revoke an operator for all of the caller's positions.
    SetApprovalForAll { operator: Address, approved: bool },
    /// Move positions between owners.
    TransferPosition { from: Address, to: Address, vault_id: VaultId, amount: U256 },

    // === State Handler ===
    /// Deliver a message (transport endpoint only). Value is the airdrop.
    Receive { src_chain: ChainId, sender: Address, bytes: Vec<u8> },
    /// Report actual amounts for a deposit payload (payload operator).
    UpdateState { payload_id: PayloadId, actual_amounts: Vec<U256> },
    /// Execute a reconciled payload (payload operator).
    ProcessPayload { payload_id: PayloadId, aux_data: Vec<u8> },
    /// Propose returning failed deposit elements (payload operator).
    ProposeRescue { payload_id: PayloadId, amounts: Vec<U256> },
    /// Dispute a rescue proposal (depositor or admin).
    DisputeRescue { payload_id: PayloadId },
    /// Pay out an undisputed rescue after the delay.
    FinalizeRescue { payload_id: PayloadId },

    // === Vault Executor ===
    /// Map vault ids to deployed vaults (admin).
    AddVault { vault_ids: Vec<VaultId>, vaults: Vec<Address> },
    /// Accept a ledger as source for a chain (admin).
    SetSrcTokenDistributor { ledger: Address, chain: ChainId },

    // === Swap Processor ===
    /// Send one custodied leg through a bridge (swap operator).
    ProcessTx { leg: SwapLeg },
    /// Send several legs (swap operator).
    ProcessMultiTx { legs: Vec<SwapLeg> },

    // === Position Wrapper ===
    /// Create a wrapper token for a vault (admin).
    RegisterWrapper { vault_id: VaultId, name: String, symbol: String },
    /// Wrap positions 1:1.
    Wrap { vault_id: VaultId, amount: U256 },
    /// Unwrap positions 1:1.
    Unwrap { vault_id: VaultId, amount: U256 },
    /// Transfer wrapped tokens.
    TransferWrapped { vault_id: VaultId, to: Address, amount: U256 },

    // === Plain transfers ===
    /// Transfer tokens held by the caller.
    TransferToken { asset: Address, to: Address, amount: U256 },
    /// Send the attached value to `to`. Payable.
    TransferNative { to: Address },
}

impl Call {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Call::GrantRole { .. } => "grant_role",
            Call::RevokeRole { .. } => "revoke_role",
            Call::SetTrustedRemote { .. } => "set_trusted_remote",
            Call::SetBridgeAddress { .. } => "set_bridge_address",
            Call::SetFeeSchedule { .. } => "set_fee_schedule",
            Call::RegisterController { .. } => "register_controller",
            Call::Deposit { .. } => "deposit",
            Call::Withdraw { .. } => "withdraw",
            Call::StateSync { .. } => "state_sync",
            Call::SetApprovalForAll { .. } => "set_approval_for_all",
            Call::TransferPosition { .. } => "transfer_position",
            Call::Receive { .. } => "receive",
            Call::UpdateState { .. } => "update_state",
            Call::ProcessPayload { .. } => "process_payload",
            Call::ProposeRescue { .. } => "propose_rescue",
            Call::DisputeRescue { .. } => "dispute_rescue",
            Call::FinalizeRescue { .. } => "finalize_rescue",
            Call::AddVault { .. } => "add_vault",
            Call::SetSrcTokenDistributor { .. } => "set_src_token_distributor",
            Call::ProcessTx { .. } => "process_tx",
            Call::ProcessMultiTx { .. } => "process_multi_tx",
            Call::RegisterWrapper { .. } => "register_wrapper",
            Call::Wrap { .. } => "wrap",
            Call::Unwrap { .. } => "unwrap",
            Call::TransferWrapped { .. } => "transfer_wrapped",
            Call::TransferToken { .. } => "transfer_token",
            Call::TransferNative { .. } => "transfer_native",
        }
    }
}

/// What a successful call produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    /// Payload ids dispatched or recorded.
    pub payload_ids: Vec<PayloadId>,
    /// Ledger transaction ids created.
    pub tx_ids: Vec<TxId>,
    /// Shares minted, assets redeemed or tokens wrapped, per element.
    pub amounts: Vec<U256>,
    /// Native value returned to the caller.
    pub refund: U256,
}
