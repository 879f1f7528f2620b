//! In-memory state for one chain.

use std::collections::{HashMap, HashSet};

use vaultbridge_core::{
    Address, ChainId, Erc4626Vault, LiquidityTransfer, OutboundMessage, Payload, PayloadId,
    PayloadStatus, Role, TransportId, TxId, VaultId, U256,
};

use super::records::{ControllerKind, FailedDeposit, TxRecord, WrapperToken};
use super::store::{StateReader, StateWriter};
use crate::config::{ChainConfig, FeeSchedule};
use crate::error::{StateError, StateResult};
use crate::events::Event;

/// Every component deployed on one chain, backed by HashMaps.
///
/// Cloning is how calls get all-or-nothing semantics: the dispatcher runs a
/// call against a clone and only commits it on success.
#[derive(Clone, Debug)]
pub struct ChainState {
    /// Deployment configuration.
    pub config: ChainConfig,

    /// Granted roles.
    pub roles: HashSet<(Address, Role)>,

    /// Native balances.
    pub native_balances: HashMap<Address, U256>,

    /// Token balances per (asset, holder).
    pub token_balances: HashMap<(Address, Address), U256>,

    /// Vaults deployed on this chain, by address.
    pub vaults: HashMap<Address, Erc4626Vault>,

    /// Executor registry: vault id to vault address.
    pub executor_vaults: HashMap<VaultId, Address>,

    /// Executor custody: vault id to shares held.
    pub custody: HashMap<VaultId, U256>,

    /// Ledger accepted per source chain.
    pub src_distributors: HashMap<ChainId, Address>,

    /// Position balances per (owner, vault id).
    pub positions: HashMap<(Address, VaultId), U256>,

    /// Operator approvals per (owner, operator).
    pub approvals: HashSet<(Address, Address)>,

    /// Ledger transaction history.
    pub tx_history: HashMap<TxId, TxRecord>,

    /// Last ledger transaction id.
    pub tx_counter: TxId,

    /// Payloads, inbound and outbound.
    pub payloads: HashMap<PayloadId, Payload>,

    /// Last payload id.
    pub payload_counter: PayloadId,

    /// Inbound origins already recorded.
    pub received: HashSet<(ChainId, PayloadId)>,

    /// Trusted handler per remote chain.
    pub trusted_remotes: HashMap<ChainId, Address>,

    /// Registered controllers.
    pub controllers: HashMap<ControllerKind, Address>,

    /// Bridge endpoints.
    pub bridges: HashMap<TransportId, Address>,

    /// Transport pricing per destination.
    pub fee_schedules: HashMap<ChainId, FeeSchedule>,

    /// Messages waiting for the transport.
    pub outbox: Vec<OutboundMessage>,

    /// Bridge transfers waiting for delivery.
    pub liquidity_outbox: Vec<LiquidityTransfer>,

    /// Last liquidity transfer id.
    pub transfer_counter: u64,

    /// Failed deposits per inbound payload.
    pub failed_deposits: HashMap<PayloadId, FailedDeposit>,

    /// Wrapper tokens per vault.
    pub wrappers: HashMap<VaultId, WrapperToken>,

    /// Wrapped balances per (vault id, holder).
    pub wrapped_balances: HashMap<(VaultId, Address), U256>,

    /// Event log.
    pub events: Vec<Event>,
}

impl ChainState {
    /// Fresh chain with nothing registered.
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            roles: HashSet::new(),
            native_balances: HashMap::new(),
            token_balances: HashMap::new(),
            vaults: HashMap::new(),
            executor_vaults: HashMap::new(),
            custody: HashMap::new(),
            src_distributors: HashMap::new(),
            positions: HashMap::new(),
            approvals: HashSet::new(),
            tx_history: HashMap::new(),
            tx_counter: 0,
            payloads: HashMap::new(),
            payload_counter: 0,
            received: HashSet::new(),
            trusted_remotes: HashMap::new(),
            controllers: HashMap::new(),
            bridges: HashMap::new(),
            fee_schedules: HashMap::new(),
            outbox: Vec::new(),
            liquidity_outbox: Vec::new(),
            transfer_counter: 0,
            failed_deposits: HashMap::new(),
            wrappers: HashMap::new(),
            wrapped_balances: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Chain id.
    pub fn chain_id(&self) -> ChainId {
        self.config.chain_id
    }

    // === Out-of-protocol hooks ===
    //
    // Vault deployment, token issuance and bridge settlement happen outside
    // the settlement protocol. The devnet and tests use these directly.

    /// Deploy a vault at its address.
    pub fn deploy_vault(&mut self, vault: Erc4626Vault) {
        self.vaults.insert(vault.address, vault);
    }

    /// Issue tokens to `holder`.
    pub fn mint_token(&mut self, asset: &Address, holder: &Address, amount: U256) {
        let entry = self.token_balances.entry((*asset, *holder)).or_default();
        *entry = *entry + amount;
    }

    /// Destroy tokens held by `holder`.
    pub fn burn_token(&mut self, asset: &Address, holder: &Address, amount: U256) -> StateResult<()> {
        let available = self.token_balances.get(&(*asset, *holder)).copied().unwrap_or_default();
        if available < amount {
            return Err(StateError::InsufficientBalance {
                asset: *asset,
                holder: *holder,
                available,
                required: amount,
            });
        }
        self.token_balances.insert((*asset, *holder), available - amount);
        Ok(())
    }

    /// Issue native value to `holder`.
    pub fn mint_native(&mut self, holder: &Address, amount: U256) {
        let entry = self.native_balances.entry(*holder).or_default();
        *entry = *entry + amount;
    }

    /// Add yield to a vault, backed by freshly issued assets.
    pub fn accrue_vault_yield(&mut self, vault: &Address, assets: U256) -> StateResult<()> {
        let asset = {
            let v = self
                .vaults
                .get_mut(vault)
                .ok_or(StateError::VaultNotDeployed { address: *vault })?;
            v.accrue(assets);
            v.asset
        };
        self.mint_token(&asset, vault, assets);
        Ok(())
    }

    // === Transport plumbing ===

    /// Take every queued message.
    pub fn drain_outbox(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Take every queued bridge transfer.
    pub fn drain_liquidity(&mut self) -> Vec<LiquidityTransfer> {
        std::mem::take(&mut self.liquidity_outbox)
    }

    // === Queries ===

    /// Payloads in `status`, ordered by id.
    pub fn payloads_with_status(&self, status: PayloadStatus) -> Vec<&Payload> {
        let mut found: Vec<&Payload> = self
            .payloads
            .values()
            .filter(|p| p.status == status)
            .collect();
        found.sort_by_key(|p| p.id);
        found
    }

    /// Payloads the operator still has to act on, ordered by id.
    pub fn open_payloads(&self) -> Vec<&Payload> {
        let mut found: Vec<&Payload> = self
            .payloads
            .values()
            .filter(|p| p.status != PayloadStatus::Processed && p.dst_chain == self.config.chain_id)
            .collect();
        found.sort_by_key(|p| p.id);
        found
    }

    /// Sum of positions in `vault_id` across all owners on this chain.
    pub fn total_positions(&self, vault_id: VaultId) -> U256 {
        self.positions
            .iter()
            .filter(|((_, v), _)| *v == vault_id)
            .fold(U256::zero(), |acc, (_, amount)| acc + *amount)
    }
}

impl StateReader for ChainState {
    fn config(&mut self) -> &ChainConfig {
        &self.config
    }

    fn has_role(&mut self, account: &Address, role: Role) -> bool {
        self.roles.contains(&(*account, role))
    }

    fn native_balance(&mut self, holder: &Address) -> U256 {
        self.native_balances.get(holder).copied().unwrap_or_default()
    }

    fn token_balance(&mut self, asset: &Address, holder: &Address) -> U256 {
        self.token_balances.get(&(*asset, *holder)).copied().unwrap_or_default()
    }

    fn get_vault(&mut self, address: &Address) -> Option<&Erc4626Vault> {
        self.vaults.get(address)
    }

    fn executor_vault(&mut self, vault_id: VaultId) -> Option<Address> {
        self.executor_vaults.get(&vault_id).copied()
    }

    fn custodied_shares(&mut self, vault_id: VaultId) -> U256 {
        self.custody.get(&vault_id).copied().unwrap_or_default()
    }

    fn src_distributor(&mut self, chain: ChainId) -> Option<Address> {
        self.src_distributors.get(&chain).copied()
    }

    fn position(&mut self, owner: &Address, vault_id: VaultId) -> U256 {
        self.positions.get(&(*owner, vault_id)).copied().unwrap_or_default()
    }

    fn is_approved(&mut self, owner: &Address, operator: &Address) -> bool {
        self.approvals.contains(&(*owner, *operator))
    }

    fn get_tx(&mut self, tx_id: TxId) -> Option<&TxRecord> {
        self.tx_history.get(&tx_id)
    }

    fn get_payload(&mut self, id: PayloadId) -> Option<&Payload> {
        self.payloads.get(&id)
    }

    fn payload_count(&mut self) -> u64 {
        self.payload_counter
    }

    fn was_received(&mut self, src_chain: ChainId, origin_payload_id: PayloadId) -> bool {
        self.received.contains(&(src_chain, origin_payload_id))
    }

    fn trusted_remote(&mut self, chain: ChainId) -> Option<Address> {
        self.trusted_remotes.get(&chain).copied()
    }

    fn controller(&mut self, kind: ControllerKind) -> Option<Address> {
        self.controllers.get(&kind).copied()
    }

    fn bridge(&mut self, transport_id: TransportId) -> Option<Address> {
        self.bridges.get(&transport_id).copied()
    }

    fn fee_schedule(&mut self, dst_chain: ChainId) -> Option<FeeSchedule> {
        self.fee_schedules.get(&dst_chain).copied()
    }

    fn get_failed_deposit(&mut self, payload_id: PayloadId) -> Option<&FailedDeposit> {
        self.failed_deposits.get(&payload_id)
    }

    fn rescue_reserved(&mut self, asset: &Address) -> U256 {
        self.failed_deposits
            .values()
            .filter(|record| !record.finalized)
            .flat_map(|record| record.assets.iter().zip(&record.amounts))
            .filter(|(held, _)| *held == asset)
            .fold(U256::zero(), |acc, (_, amount)| acc.saturating_add(*amount))
    }

    fn get_wrapper(&mut self, vault_id: VaultId) -> Option<&WrapperToken> {
        self.wrappers.get(&vault_id)
    }

    fn wrapped_balance(&mut self, vault_id: VaultId, holder: &Address) -> U256 {
        self.wrapped_balances.get(&(vault_id, *holder)).copied().unwrap_or_default()
    }
}

impl StateWriter for ChainState {
    fn set_role(&mut self, account: &Address, role: Role, granted: bool) {
        if granted {
            self.roles.insert((*account, role));
        } else {
            self.roles.remove(&(*account, role));
        }
    }

    fn set_native_balance(&mut self, holder: &Address, amount: U256) {
        if amount.is_zero() {
            self.native_balances.remove(holder);
        } else {
            self.native_balances.insert(*holder, amount);
        }
    }

    fn set_token_balance(&mut self, asset: &Address, holder: &Address, amount: U256) {
        if amount.is_zero() {
            self.token_balances.remove(&(*asset, *holder));
        } else {
            self.token_balances.insert((*asset, *holder), amount);
        }
    }

    fn update_vault<F>(&mut self, address: &Address, f: F)
    where
        F: FnOnce(&mut Erc4626Vault),
    {
        if let Some(vault) = self.vaults.get_mut(address) {
            f(vault);
        }
    }

    fn map_executor_vault(&mut self, vault_id: VaultId, vault: Address) {
        self.executor_vaults.insert(vault_id, vault);
    }

    fn set_custodied_shares(&mut self, vault_id: VaultId, shares: U256) {
        self.custody.insert(vault_id, shares);
    }

    fn set_src_distributor(&mut self, chain: ChainId, ledger: Address) {
        self.src_distributors.insert(chain, ledger);
    }

    fn set_position(&mut self, owner: &Address, vault_id: VaultId, amount: U256) {
        if amount.is_zero() {
            self.positions.remove(&(*owner, vault_id));
        } else {
            self.positions.insert((*owner, vault_id), amount);
        }
    }

    fn set_approval(&mut self, owner: &Address, operator: &Address, approved: bool) {
        if approved {
            self.approvals.insert((*owner, *operator));
        } else {
            self.approvals.remove(&(*owner, *operator));
        }
    }

    fn next_tx_id(&mut self) -> TxId {
        self.tx_counter += 1;
        self.tx_counter
    }

    fn insert_tx(&mut self, record: TxRecord) {
        self.tx_history.insert(record.tx_id, record);
    }

    fn update_tx<F>(&mut self, tx_id: TxId, f: F)
    where
        F: FnOnce(&mut TxRecord),
    {
        if let Some(record) = self.tx_history.get_mut(&tx_id) {
            f(record);
        }
    }

    fn next_payload_id(&mut self) -> PayloadId {
        self.payload_counter += 1;
        self.payload_counter
    }

    fn insert_payload(&mut self, payload: Payload) {
        self.payloads.insert(payload.id, payload);
    }

    fn update_payload<F>(&mut self, id: PayloadId, f: F)
    where
        F: FnOnce(&mut Payload),
    {
        if let Some(payload) = self.payloads.get_mut(&id) {
            f(payload);
        }
    }

    fn mark_received(&mut self, src_chain: ChainId, origin_payload_id: PayloadId) {
        self.received.insert((src_chain, origin_payload_id));
    }

    fn set_trusted_remote(&mut self, chain: ChainId, remote: Address) {
        self.trusted_remotes.insert(chain, remote);
    }

    fn set_controller(&mut self, kind: ControllerKind, address: Address) {
        self.controllers.insert(kind, address);
    }

    fn set_bridge(&mut self, transport_id: TransportId, endpoint: Address) {
        self.bridges.insert(transport_id, endpoint);
    }

    fn set_fee_schedule(&mut self, dst_chain: ChainId, schedule: FeeSchedule) {
        self.fee_schedules.insert(dst_chain, schedule);
    }

    fn push_outbound(&mut self, message: OutboundMessage) {
        self.outbox.push(message);
    }

    fn next_transfer_id(&mut self) -> u64 {
        self.transfer_counter += 1;
        self.transfer_counter
    }

    fn push_liquidity(&mut self, transfer: LiquidityTransfer) {
        self.liquidity_outbox.push(transfer);
    }

    fn insert_failed_deposit(&mut self, record: FailedDeposit) {
        self.failed_deposits.insert(record.payload_id, record);
    }

    fn update_failed_deposit<F>(&mut self, payload_id: PayloadId, f: F)
    where
        F: FnOnce(&mut FailedDeposit),
    {
        if let Some(record) = self.failed_deposits.get_mut(&payload_id) {
            f(record);
        }
    }

    fn insert_wrapper(&mut self, wrapper: WrapperToken) {
        self.wrappers.insert(wrapper.vault_id, wrapper);
    }

    fn update_wrapper<F>(&mut self, vault_id: VaultId, f: F)
    where
        F: FnOnce(&mut WrapperToken),
    {
        if let Some(wrapper) = self.wrappers.get_mut(&vault_id) {
            f(wrapper);
        }
    }

    fn set_wrapped_balance(&mut self, vault_id: VaultId, holder: &Address, amount: U256) {
        if amount.is_zero() {
            self.wrapped_balances.remove(&(vault_id, *holder));
        } else {
            self.wrapped_balances.insert((vault_id, *holder), amount);
        }
    }

    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_one() {
        let mut state = ChainState::new(ChainConfig::devnet(1));
        assert_eq!(state.payload_count(), 0);
        assert_eq!(state.next_payload_id(), 1);
        assert_eq!(state.next_payload_id(), 2);
        assert_eq!(state.payload_count(), 2);
        assert_eq!(state.next_tx_id(), 1);
        assert_eq!(state.next_transfer_id(), 1);
    }

    #[test]
    fn test_zero_balances_are_pruned() {
        let mut state = ChainState::new(ChainConfig::devnet(1));
        let asset = [1u8; 20];
        let holder = [2u8; 20];
        state.mint_token(&asset, &holder, U256::from(5u64));
        state.set_token_balance(&asset, &holder, U256::zero());
        assert!(state.token_balances.is_empty());
        assert_eq!(state.token_balance(&asset, &holder), U256::zero());
    }

    #[test]
    fn test_burn_more_than_held_fails() {
        let mut state = ChainState::new(ChainConfig::devnet(1));
        let asset = [1u8; 20];
        let holder = [2u8; 20];
        state.mint_token(&asset, &holder, U256::from(5u64));
        assert!(matches!(
            state.burn_token(&asset, &holder, U256::from(6u64)),
            Err(StateError::InsufficientBalance { .. })
        ));
        state.burn_token(&asset, &holder, U256::from(5u64)).unwrap();
        assert_eq!(state.token_balance(&asset, &holder), U256::zero());
    }

    #[test]
    fn test_role_grant_and_revoke() {
        let mut state = ChainState::new(ChainConfig::devnet(1));
        let keeper = [3u8; 20];
        state.set_role(&keeper, Role::PayloadOperator, true);
        assert!(state.has_role(&keeper, Role::PayloadOperator));
        assert!(!state.has_role(&keeper, Role::SwapOperator));
        state.set_role(&keeper, Role::PayloadOperator, false);
        assert!(!state.has_role(&keeper, Role::PayloadOperator));
    }
}
