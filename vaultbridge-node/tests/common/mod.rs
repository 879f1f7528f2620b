//! Shared test helpers for vaultbridge-node integration tests.

#![allow(dead_code)]

use vaultbridge_core::{Address, ChainId, Payload, PayloadStatus, VaultId, U256};
use vaultbridge_node::devnet::{asset, vault_id, Devnet, DevnetConfig};
use vaultbridge_node::keeper::{Keeper, KeeperReport};
use vaultbridge_node::network::NetworkConfig;
use vaultbridge_node::NodeResult;
use vaultbridge_state::{Call, ChainConfig, Receipt};

/// Origin chain in two-chain tests.
pub const HOME: ChainId = 1;

/// Vault chain in two-chain tests.
pub const REMOTE: ChainId = 2;

/// A deployed devnet plus its keeper.
pub struct TestContext {
    pub devnet: Devnet,
    pub keeper: Keeper,
    pub totals: KeeperReport,
}

impl TestContext {
    /// Two-chain devnet with default settings.
    pub fn new() -> Self {
        Self::with_network(NetworkConfig::default())
    }

    /// Two-chain devnet with the given transport behavior.
    pub fn with_network(network: NetworkConfig) -> Self {
        Self::with_config(DevnetConfig { network, ..DevnetConfig::default() })
    }

    pub fn with_config(config: DevnetConfig) -> Self {
        let devnet = Devnet::deploy(config).expect("devnet deploys");
        let keeper = devnet.keeper();
        Self { devnet, keeper, totals: KeeperReport::default() }
    }

    pub fn alice(&self) -> Address {
        self.devnet.users[0]
    }

    pub fn bob(&self) -> Address {
        self.devnet.users[1]
    }

    pub fn operator(&self) -> Address {
        self.devnet.operator
    }

    pub fn call(&mut self, chain: ChainId, caller: Address, call: Call) -> NodeResult<Receipt> {
        self.devnet.network.call(chain, caller, U256::zero(), call)
    }

    pub fn paid_call(&mut self, chain: ChainId, caller: Address, call: Call) -> NodeResult<Receipt> {
        let value = self.devnet.fee_budget();
        self.devnet.network.call(chain, caller, value, call)
    }

    /// Start a cross-chain or same-chain deposit.
    pub fn deposit(&mut self, user: Address, src: ChainId, dst: ChainId, amounts: &[u64], bound_bps: u16) -> Receipt {
        let call = self.devnet.deposit_call(src, dst, amounts, bound_bps).expect("deposit call");
        let receipt = if src == dst { self.call(src, user, call) } else { self.paid_call(src, user, call) };
        receipt.expect("deposit accepted")
    }

    /// Start a withdrawal of vault `index` on `dst`, paid out to `user` on `src`.
    pub fn withdraw(&mut self, user: Address, src: ChainId, dst: ChainId, index: u64, shares: U256) -> NodeResult<Receipt> {
        let call = self.devnet.withdraw_call(src, dst, index, shares, user)?;
        self.paid_call(src, user, call)
    }

    /// One network step followed by one keeper pass.
    pub fn tick(&mut self) -> KeeperReport {
        self.devnet.network.step();
        let report = self.keeper.tick(&mut self.devnet.network);
        self.totals.merge(&report);
        report
    }

    /// Tick until nothing is in flight and the keeper has nothing left to do.
    pub fn settle(&mut self, max_ticks: usize) {
        for _ in 0..max_ticks {
            let report = self.tick();
            let (messages, transfers) = self.devnet.network.in_flight();
            let outboxes_empty = self
                .devnet
                .network
                .chain_ids()
                .into_iter()
                .all(|id| {
                    let state = self.devnet.network.chain(id).unwrap();
                    state.outbox.is_empty() && state.liquidity_outbox.is_empty()
                });
            if !report.made_progress() && messages == 0 && transfers == 0 && outboxes_empty && report.waiting == 0 {
                return;
            }
        }
    }

    pub fn position(&self, chain: ChainId, owner: Address, vault: VaultId) -> U256 {
        let state = self.devnet.network.chain(chain).unwrap();
        state.positions.get(&(owner, vault)).copied().unwrap_or_default()
    }

    pub fn balance(&self, chain: ChainId, holder: Address) -> U256 {
        let state = self.devnet.network.chain(chain).unwrap();
        state.token_balances.get(&(asset(chain), holder)).copied().unwrap_or_default()
    }

    pub fn custody(&self, chain: ChainId, vault: VaultId) -> U256 {
        let state = self.devnet.network.chain(chain).unwrap();
        state.custody.get(&vault).copied().unwrap_or_default()
    }

    /// Sum of positions in `vault` across every ledger in the network.
    pub fn total_positions(&self, vault: VaultId) -> U256 {
        self.devnet
            .network
            .chain_ids()
            .into_iter()
            .map(|id| self.devnet.network.chain(id).unwrap().total_positions(vault))
            .fold(U256::zero(), |acc, p| acc + p)
    }

    /// Every payload on `chain`, ordered by id.
    pub fn payloads(&self, chain: ChainId) -> Vec<Payload> {
        let state = self.devnet.network.chain(chain).unwrap();
        let mut payloads: Vec<Payload> = state.payloads.values().cloned().collect();
        payloads.sort_by_key(|p| p.id);
        payloads
    }

    /// Inbound payloads on `chain` in `status`.
    pub fn inbound(&self, chain: ChainId, status: PayloadStatus) -> Vec<Payload> {
        self.payloads(chain)
            .into_iter()
            .filter(|p| p.dst_chain == chain && p.status == status)
            .collect()
    }

    pub fn chain_config(&self, chain: ChainId) -> ChainConfig {
        self.devnet.network.chain(chain).unwrap().config.clone()
    }
}

/// First vault on the remote chain.
pub fn remote_vault() -> VaultId {
    vault_id(REMOTE, 0)
}
