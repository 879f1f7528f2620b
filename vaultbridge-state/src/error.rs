//! Error types for state machine operations.

use thiserror::Error;
use vaultbridge_core::{
    Address, ChainId, PayloadId, PayloadKind, PayloadStatus, Role, TransportId, TxId, VaultError,
    VaultId, U256,
};

use crate::state::ControllerKind;

/// Coarse classification of a [`StateError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or inconsistent call arguments.
    InvalidInput,
    /// Reported amounts violate the declared slippage bound.
    Reconciliation,
    /// The payload is in the wrong lifecycle state.
    Lifecycle,
    /// Bridged funds have not arrived yet; retry later.
    Pending,
    /// The caller lacks the required role or identity.
    Authorization,
    /// Balances or custody do not cover the request.
    Custody,
}

/// All validation and execution errors for state transitions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    // === Input Errors ===
    /// Parallel arrays differ in length or are empty.
    #[error("arity mismatch: expected {expected} elements, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    /// Slippage bound above 10 000 bps.
    #[error("slippage bound {bps} bps exceeds 10000")]
    InvalidSlippageBound { bps: u16 },
    /// Zero amount where a positive one is required.
    #[error("amount must be non-zero")]
    ZeroAmount,
    /// Liquidity amount does not match the state intent.
    #[error("amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch { expected: U256, actual: U256 },
    /// Liquidity asset does not match the vault asset.
    #[error("asset mismatch for vault {vault_id}")]
    AssetMismatch { vault_id: VaultId },
    /// Vault id is not hosted on the chain it is addressed to.
    #[error("vault {vault_id} is not hosted on chain {chain}")]
    VaultChainMismatch { vault_id: VaultId, chain: ChainId },
    /// Attached value below the required fee.
    #[error("insufficient fee: required {required}, provided {provided}")]
    InsufficientFee { required: U256, provided: U256 },
    /// Native value sent to a call that does not accept it.
    #[error("call is not payable")]
    NonPayable,
    /// No fee schedule for the destination chain.
    #[error("unsupported destination chain {chain}")]
    UnsupportedDestination { chain: ChainId },
    /// No bridge registered under the transport id.
    #[error("bridge {transport_id} not registered")]
    BridgeNotRegistered { transport_id: TransportId },
    /// Liquidity endpoint differs from the registered bridge.
    #[error("transport endpoint {} does not match bridge {}", hex::encode(.actual), hex::encode(.expected))]
    InvalidTransportEndpoint { expected: Address, actual: Address },
    /// Inbound bytes could not be decoded.
    #[error("malformed message: {reason}")]
    MalformedMessage { reason: String },
    /// Message addressed to a different chain, or claims a different origin.
    #[error("message routed to chain {actual}, expected {expected}")]
    WrongDestination { expected: ChainId, actual: ChainId },

    // === Reconciliation Errors ===
    /// Reported amount above the declared amount.
    #[error("negative slippage at index {index}: actual {actual} exceeds declared {declared}")]
    NegativeSlippage { index: usize, declared: U256, actual: U256 },
    /// Reported amount below the slippage floor.
    #[error("slippage out of bounds at index {index}: actual {actual} below minimum {minimum}")]
    SlippageOutOfBounds { index: usize, actual: U256, minimum: U256 },

    // === Lifecycle Errors ===
    /// No payload with the id.
    #[error("payload {payload_id} not found")]
    PayloadNotFound { payload_id: PayloadId },
    /// Payload already reconciled.
    #[error("payload {payload_id} already updated (status {status:?})")]
    PayloadAlreadyUpdated { payload_id: PayloadId, status: PayloadStatus },
    /// Operation not valid for the payload kind.
    #[error("payload {payload_id} has kind {kind:?}")]
    InvalidPayloadKind { payload_id: PayloadId, kind: PayloadKind },
    /// Processing a payload whose amounts are not final.
    #[error("payload {payload_id} not reconciled")]
    NotReconciled { payload_id: PayloadId },
    /// Payload already executed.
    #[error("payload {payload_id} already processed")]
    AlreadyProcessed { payload_id: PayloadId },
    /// Message already received from this origin.
    #[error("duplicate message {origin_payload_id} from chain {src_chain}")]
    DuplicateMessage { src_chain: ChainId, origin_payload_id: PayloadId },
    /// Ledger transaction already synced.
    #[error("transaction {tx_id} already synced")]
    AlreadySynced { tx_id: TxId },
    /// Ledger transaction unknown.
    #[error("unknown transaction {tx_id}")]
    UnknownTransaction { tx_id: TxId },
    /// RETURN does not match the originating transaction.
    #[error("return does not match transaction {tx_id}")]
    InvalidReturn { tx_id: TxId },
    /// No controller registered for the payload kind.
    #[error("no {kind:?} controller registered")]
    ControllerNotRegistered { kind: ControllerKind },
    /// Vault id already mapped.
    #[error("vault {vault_id} already registered")]
    VaultAlreadyRegistered { vault_id: VaultId },
    /// Vault id not mapped by the executor.
    #[error("vault {vault_id} not found")]
    VaultNotFound { vault_id: VaultId },
    /// No vault deployed at the address.
    #[error("no vault deployed at {}", hex::encode(.address))]
    VaultNotDeployed { address: Address },
    /// Wrapper already exists for the vault.
    #[error("wrapper for vault {vault_id} already registered")]
    WrapperAlreadyRegistered { vault_id: VaultId },
    /// No wrapper for the vault.
    #[error("no wrapper for vault {vault_id}")]
    WrapperNotFound { vault_id: VaultId },

    // === Rescue Errors ===
    /// No failed deposit recorded for the payload.
    #[error("no failed deposit for payload {payload_id}")]
    NoFailedDeposit { payload_id: PayloadId },
    /// Rescue amounts inconsistent with the failed deposit.
    #[error("invalid rescue data for payload {payload_id}")]
    InvalidRescueData { payload_id: PayloadId },
    /// Rescue already proposed.
    #[error("rescue already proposed for payload {payload_id}")]
    RescueAlreadyProposed { payload_id: PayloadId },
    /// Nothing proposed yet.
    #[error("no rescue proposed for payload {payload_id}")]
    NoRescueProposed { payload_id: PayloadId },
    /// Dispute window closed.
    #[error("dispute window elapsed for payload {payload_id}")]
    DisputeWindowElapsed { payload_id: PayloadId },
    /// Rescue delay not yet elapsed.
    #[error("rescue for payload {payload_id} locked until {unlocks_at}")]
    RescueLocked { payload_id: PayloadId, unlocks_at: u64 },
    /// Rescue already paid out.
    #[error("rescue for payload {payload_id} already finalized")]
    RescueAlreadyFinalized { payload_id: PayloadId },

    // === Transport Errors ===
    /// Bridged tokens have not reached the executor.
    #[error("bridge tokens pending for payload {payload_id}: need {required}, have {available}")]
    BridgeTokensPending { payload_id: PayloadId, asset: Address, required: U256, available: U256 },

    // === Authorization Errors ===
    /// Caller is not the chain administrator.
    #[error("{} is not the administrator", hex::encode(.caller))]
    NotAdmin { caller: Address },
    /// Caller lacks a role.
    #[error("{} lacks role {role}", hex::encode(.account))]
    MissingRole { account: Address, role: Role },
    /// Caller is not the component allowed to make this call.
    #[error("unauthorized caller {}", hex::encode(.caller))]
    Unauthorized { caller: Address, expected: Address },
    /// Sender is not the trusted remote for the chain.
    #[error("untrusted remote {} for chain {src_chain}", hex::encode(.sender))]
    UntrustedRemote { src_chain: ChainId, sender: Address },
    /// No trusted remote configured for the destination.
    #[error("no trusted remote for chain {chain}")]
    NoTrustedRemote { chain: ChainId },
    /// Ledger is not the registered source for its chain.
    #[error("unknown source ledger {} for chain {chain}", hex::encode(.ledger))]
    UnknownSourceLedger { chain: ChainId, ledger: Address },
    /// Operator not approved by the owner.
    #[error("{} not approved by {}", hex::encode(.operator), hex::encode(.owner))]
    NotApproved { owner: Address, operator: Address },
    /// Caller may not dispute the rescue.
    #[error("{} may not dispute this rescue", hex::encode(.caller))]
    NotValidDisputer { caller: Address },

    // === Custody Errors ===
    /// Position balance below the requested amount.
    #[error("insufficient shares in vault {vault_id}: held {held}, requested {requested}")]
    InsufficientShares { vault_id: VaultId, held: U256, requested: U256 },
    /// Executor custody below the requested amount.
    #[error("insufficient vault shares in custody for vault {vault_id}: custodied {custodied}, requested {requested}")]
    InsufficientVaultShares { vault_id: VaultId, custodied: U256, requested: U256 },
    /// Token balance below the requested amount.
    #[error("insufficient balance of {}: available {available}, required {required}", hex::encode(.asset))]
    InsufficientBalance { asset: Address, holder: Address, available: U256, required: U256 },
    /// Native balance below the requested amount.
    #[error("insufficient native balance: available {available}, required {required}")]
    InsufficientNative { holder: Address, available: U256, required: U256 },
    /// Wrapped token balance below the requested amount.
    #[error("insufficient wrapped balance for vault {vault_id}: held {held}, requested {requested}")]
    InsufficientWrapped { vault_id: VaultId, held: U256, requested: U256 },

    // === Vault Errors ===
    /// The underlying vault rejected the operation.
    #[error("vault {vault_id} rejected operation: {source}")]
    Vault { vault_id: VaultId, source: VaultError },
}

impl StateError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        use StateError::*;
        match self {
            NegativeSlippage { .. } | SlippageOutOfBounds { .. } => ErrorKind::Reconciliation,
            BridgeTokensPending { .. } => ErrorKind::Pending,
            NotAdmin { .. }
            | MissingRole { .. }
            | Unauthorized { .. }
            | UntrustedRemote { .. }
            | NoTrustedRemote { .. }
            | UnknownSourceLedger { .. }
            | NotApproved { .. }
            | NotValidDisputer { .. } => ErrorKind::Authorization,
            InsufficientShares { .. }
            | InsufficientVaultShares { .. }
            | InsufficientBalance { .. }
            | InsufficientNative { .. }
            | InsufficientWrapped { .. }
            | Vault { .. } => ErrorKind::Custody,
            PayloadNotFound { .. }
            | PayloadAlreadyUpdated { .. }
            | InvalidPayloadKind { .. }
            | NotReconciled { .. }
            | AlreadyProcessed { .. }
            | DuplicateMessage { .. }
            | AlreadySynced { .. }
            | UnknownTransaction { .. }
            | InvalidReturn { .. }
            | ControllerNotRegistered { .. }
            | VaultAlreadyRegistered { .. }
            | VaultNotFound { .. }
            | VaultNotDeployed { .. }
            | WrapperAlreadyRegistered { .. }
            | WrapperNotFound { .. }
            | NoFailedDeposit { .. }
            | RescueAlreadyProposed { .. }
            | NoRescueProposed { .. }
            | DisputeWindowElapsed { .. }
            | RescueLocked { .. }
            | RescueAlreadyFinalized { .. } => ErrorKind::Lifecycle,
            _ => ErrorKind::InvalidInput,
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Pending
    }
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_operator_messages() {
        let e = StateError::SlippageOutOfBounds {
            index: 0,
            actual: U256::from(800u64),
            minimum: U256::from(900u64),
        };
        assert!(e.to_string().starts_with("slippage out of bounds"));

        let e = StateError::NegativeSlippage {
            index: 0,
            declared: U256::from(1000u64),
            actual: U256::from(1001u64),
        };
        assert!(e.to_string().starts_with("negative slippage"));
    }

    #[test]
    fn test_only_pending_is_retryable() {
        let pending = StateError::BridgeTokensPending {
            payload_id: 1,
            asset: [0u8; 20],
            required: U256::one(),
            available: U256::zero(),
        };
        assert!(pending.is_retryable());
        assert!(!StateError::AlreadyProcessed { payload_id: 1 }.is_retryable());
        assert_eq!(StateError::ZeroAmount.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            StateError::MissingRole { account: [1u8; 20], role: Role::PayloadOperator }.kind(),
            ErrorKind::Authorization
        );
    }

    #[test]
    fn test_vault_error_is_source() {
        use std::error::Error as _;
        let e = StateError::Vault { vault_id: 7, source: VaultError::Paused };
        assert!(e.source().is_some());
        assert_eq!(e.kind(), ErrorKind::Custody);
    }
}
