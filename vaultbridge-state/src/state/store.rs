//! State storage traits.
//!
//! Execution logic is written against these traits so a persistent store can
//! replace [`ChainState`](super::ChainState) without touching the handlers.

use vaultbridge_core::{
    Address, ChainId, Erc4626Vault, LiquidityTransfer, OutboundMessage, Payload, PayloadId, Role,
    TransportId, TxId, VaultId, U256,
};

use super::records::{ControllerKind, FailedDeposit, TxRecord, WrapperToken};
use crate::config::{ChainConfig, FeeSchedule};
use crate::events::Event;

/// Read access to one chain's protocol state.
///
/// Methods take `&mut self` to allow implementations to lazily load data
/// from persistent storage into an internal cache on first access.
pub trait StateReader {
    // === Deployment ===

    /// Component addresses and chain parameters.
    fn config(&mut self) -> &ChainConfig;

    /// Whether `account` holds `role`.
    fn has_role(&mut self, account: &Address, role: Role) -> bool;

    // === Balances ===

    /// Native balance of `holder`.
    fn native_balance(&mut self, holder: &Address) -> U256;

    /// Token balance of `holder`.
    fn token_balance(&mut self, asset: &Address, holder: &Address) -> U256;

    // === Vaults and Custody ===

    /// Vault deployed at `address`.
    fn get_vault(&mut self, address: &Address) -> Option<&Erc4626Vault>;

    /// Vault address the executor mapped to `vault_id`.
    fn executor_vault(&mut self, vault_id: VaultId) -> Option<Address>;

    /// Shares of `vault_id` held by the executor.
    fn custodied_shares(&mut self, vault_id: VaultId) -> U256;

    /// Ledger accepted as source for `chain`.
    fn src_distributor(&mut self, chain: ChainId) -> Option<Address>;

    // === Ledger ===

    /// Position balance of `owner` in `vault_id`.
    fn position(&mut self, owner: &Address, vault_id: VaultId) -> U256;

    /// Whether `operator` may move `owner`'s positions.
    fn is_approved(&mut self, owner: &Address, operator: &Address) -> bool;

    /// Ledger transaction history entry.
    fn get_tx(&mut self, tx_id: TxId) -> Option<&TxRecord>;

    // === Handler ===

    /// Payload by id.
    fn get_payload(&mut self, id: PayloadId) -> Option<&Payload>;

    /// Number of payload ids assigned so far.
    fn payload_count(&mut self) -> u64;

    /// Whether a message from `(src_chain, origin_payload_id)` was recorded.
    fn was_received(&mut self, src_chain: ChainId, origin_payload_id: PayloadId) -> bool;

    /// Trusted handler on `chain`.
    fn trusted_remote(&mut self, chain: ChainId) -> Option<Address>;

    /// Registered controller.
    fn controller(&mut self, kind: ControllerKind) -> Option<Address>;

    /// Bridge endpoint registered under `transport_id`.
    fn bridge(&mut self, transport_id: TransportId) -> Option<Address>;

    /// Transport pricing towards `dst_chain`.
    fn fee_schedule(&mut self, dst_chain: ChainId) -> Option<FeeSchedule>;

    /// Failed deposit recorded for a payload.
    fn get_failed_deposit(&mut self, payload_id: PayloadId) -> Option<&FailedDeposit>;

    /// Amount of `asset` the executor holds for unfinalized failed deposits.
    fn rescue_reserved(&mut self, asset: &Address) -> U256;

    // === Wrapper ===

    /// Wrapper token for `vault_id`.
    fn get_wrapper(&mut self, vault_id: VaultId) -> Option<&WrapperToken>;

    /// Wrapped token balance.
    fn wrapped_balance(&mut self, vault_id: VaultId, holder: &Address) -> U256;
}

/// Mutable access to one chain's protocol state.
pub trait StateWriter: StateReader {
    // === Deployment Mutations ===

    /// Grant (`true`) or revoke (`false`) a role.
    fn set_role(&mut self, account: &Address, role: Role, granted: bool);

    // === Balance Mutations ===

    /// Overwrite a native balance.
    fn set_native_balance(&mut self, holder: &Address, amount: U256);

    /// Overwrite a token balance.
    fn set_token_balance(&mut self, asset: &Address, holder: &Address, amount: U256);

    // === Vault and Custody Mutations ===

    /// Update a deployed vault.
    fn update_vault<F>(&mut self, address: &Address, f: F)
    where
        F: FnOnce(&mut Erc4626Vault);

    /// Map a vault id to a deployed vault.
    fn map_executor_vault(&mut self, vault_id: VaultId, vault: Address);

    /// Overwrite executor custody for a vault.
    fn set_custodied_shares(&mut self, vault_id: VaultId, shares: U256);

    /// Accept `ledger` as source for `chain`.
    fn set_src_distributor(&mut self, chain: ChainId, ledger: Address);

    // === Ledger Mutations ===

    /// Overwrite a position balance.
    fn set_position(&mut self, owner: &Address, vault_id: VaultId, amount: U256);

    /// Set operator approval.
    fn set_approval(&mut self, owner: &Address, operator: &Address, approved: bool);

    /// Allocate the next ledger transaction id.
    fn next_tx_id(&mut self) -> TxId;

    /// Record a ledger transaction.
    fn insert_tx(&mut self, record: TxRecord);

    /// Update a ledger transaction.
    fn update_tx<F>(&mut self, tx_id: TxId, f: F)
    where
        F: FnOnce(&mut TxRecord);

    // === Handler Mutations ===

    /// Allocate the next payload id. Shared by inbound and outbound payloads.
    fn next_payload_id(&mut self) -> PayloadId;

    /// Store a payload.
    fn insert_payload(&mut self, payload: Payload);

    /// Update a stored payload.
    fn update_payload<F>(&mut self, id: PayloadId, f: F)
    where
        F: FnOnce(&mut Payload);

    /// Remember an inbound origin for replay rejection.
    fn mark_received(&mut self, src_chain: ChainId, origin_payload_id: PayloadId);

    /// Set the trusted handler on `chain`.
    fn set_trusted_remote(&mut self, chain: ChainId, remote: Address);

    /// Register a controller.
    fn set_controller(&mut self, kind: ControllerKind, address: Address);

    /// Register a bridge endpoint.
    fn set_bridge(&mut self, transport_id: TransportId, endpoint: Address);

    /// Set transport pricing.
    fn set_fee_schedule(&mut self, dst_chain: ChainId, schedule: FeeSchedule);

    /// Queue a message for the transport.
    fn push_outbound(&mut self, message: OutboundMessage);

    /// Allocate the next liquidity transfer id.
    fn next_transfer_id(&mut self) -> u64;

    /// Queue a bridge transfer.
    fn push_liquidity(&mut self, transfer: LiquidityTransfer);

    /// Record a failed deposit.
    fn insert_failed_deposit(&mut self, record: FailedDeposit);

    /// Update a failed deposit.
    fn update_failed_deposit<F>(&mut self, payload_id: PayloadId, f: F)
    where
        F: FnOnce(&mut FailedDeposit);

    // === Wrapper Mutations ===

    /// Create a wrapper token.
    fn insert_wrapper(&mut self, wrapper: WrapperToken);

    /// Update a wrapper token.
    fn update_wrapper<F>(&mut self, vault_id: VaultId, f: F)
    where
        F: FnOnce(&mut WrapperToken);

    /// Overwrite a wrapped token balance.
    fn set_wrapped_balance(&mut self, vault_id: VaultId, holder: &Address, amount: U256);

    // === Events ===

    /// Append an event to the chain log.
    fn emit(&mut self, event: Event);
}

/// Combined trait for full state access.
pub trait StateStore: StateReader + StateWriter {}

impl<T: StateReader + StateWriter> StateStore for T {}
