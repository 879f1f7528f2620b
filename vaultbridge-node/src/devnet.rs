//! Devnet deployment.
//!
//! Deploys the full component set on every configured chain and wires the
//! chains to each other:
//! - Vaults on a per-chain test asset, registered with the executor
//! - Roles for the ledger, executor and operators
//! - Bridge, fee schedule, trusted remote and source ledger for every peer
//! - Faucet balances for test users

use tracing::info;
use vaultbridge_core::crypto::derive_address;
use vaultbridge_core::{
    Address, BridgeRoute, ChainId, Erc4626Vault, LiquidityIntent, Role, StateIntent, TransportId,
    VaultId, U256, VAULT_ID_STRIDE,
};
use vaultbridge_state::{Call, ChainConfig, ChainState, ControllerKind, FeeSchedule};

use crate::error::{NodeError, NodeResult};
use crate::network::{Network, NetworkConfig};

pub use vaultbridge_core::vault_id;

/// Transport id of the devnet bridge.
pub const DEVNET_BRIDGE: TransportId = 1;

/// Devnet configuration.
#[derive(Debug, Clone)]
pub struct DevnetConfig {
    /// Chains to deploy, at least two.
    pub chain_ids: Vec<ChainId>,

    /// Vaults per chain.
    pub vaults_per_chain: u64,

    /// Transport fee schedule towards every peer.
    pub fee_schedule: FeeSchedule,

    /// Test tokens issued to each user on each chain.
    pub faucet_tokens: u64,

    /// Native value issued to each user on each chain.
    pub faucet_native: u64,

    /// Native value the executor starts with, for RETURN fees.
    pub executor_native: u64,

    /// Transport and bridge behavior.
    pub network: NetworkConfig,
}

impl DevnetConfig {
    /// Check the configuration can be deployed.
    pub fn validate(&self) -> NodeResult<()> {
        let mut ids = self.chain_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() < 2 || ids.len() != self.chain_ids.len() {
            return Err(NodeError::InvalidConfig("need at least two distinct chains".into()));
        }
        if self.vaults_per_chain == 0 {
            return Err(NodeError::InvalidConfig("need at least one vault per chain".into()));
        }
        if self.vaults_per_chain > VAULT_ID_STRIDE {
            return Err(NodeError::InvalidConfig(format!(
                "at most {VAULT_ID_STRIDE} vaults per chain"
            )));
        }
        if self.network.bridge_fee_bps > 10_000 {
            return Err(NodeError::InvalidConfig("bridge fee above 10000 bps".into()));
        }
        Ok(())
    }
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            chain_ids: vec![1, 2],
            vaults_per_chain: 2,
            fee_schedule: FeeSchedule::new(1_000, 10),
            faucet_tokens: 1_000_000,
            faucet_native: 100_000_000,
            executor_native: 10_000_000,
            network: NetworkConfig::default(),
        }
    }
}

/// Test asset on `chain`.
pub fn asset(chain: ChainId) -> Address {
    derive_address("usdc", chain)
}

/// Devnet bridge endpoint on `chain`.
pub fn bridge(chain: ChainId) -> Address {
    derive_address("bridge", chain)
}

/// Address of the `index`-th vault on `chain`.
pub fn vault_address(chain: ChainId, index: u64) -> Address {
    derive_address(&format!("vault-{index}"), chain)
}


/// A deployed devnet.
pub struct Devnet {
    pub network: Network,
    pub config: DevnetConfig,
    /// Holds the payload operator role on every chain.
    pub operator: Address,
    /// Holds the swap operator role on every chain.
    pub swap_operator: Address,
    /// Funded test users.
    pub users: Vec<Address>,
}

impl Devnet {
    /// Deploy and wire every chain.
    pub fn deploy(config: DevnetConfig) -> NodeResult<Self> {
        config.validate()?;
        let operator = derive_address("operator", 0);
        let swap_operator = derive_address("swap-operator", 0);
        let users = vec![derive_address("alice", 0), derive_address("bob", 0)];

        let mut network = Network::new(config.network.clone());
        for chain_id in &config.chain_ids {
            let mut state = ChainState::new(ChainConfig::devnet(*chain_id));
            for index in 0..config.vaults_per_chain {
                state.deploy_vault(Erc4626Vault::new(vault_address(*chain_id, index), asset(*chain_id)));
            }
            network.add_chain(state);
        }

        let mut devnet = Self { network, config, operator, swap_operator, users };
        for chain_id in devnet.config.chain_ids.clone() {
            devnet.wire_chain(chain_id)?;
            devnet.fund_chain(chain_id)?;
        }
        info!(chains = ?devnet.config.chain_ids, "devnet deployed");
        Ok(devnet)
    }

    fn wire_chain(&mut self, chain_id: ChainId) -> NodeResult<()> {
        let config = ChainConfig::devnet(chain_id);
        let vault_ids: Vec<VaultId> = (0..self.config.vaults_per_chain).map(|i| vault_id(chain_id, i)).collect();
        let vaults: Vec<Address> = (0..self.config.vaults_per_chain).map(|i| vault_address(chain_id, i)).collect();

        let mut calls = vec![
            Call::GrantRole { role: Role::CoreController, account: config.ledger },
            Call::GrantRole { role: Role::CoreController, account: config.executor },
            Call::GrantRole { role: Role::PayloadOperator, account: self.operator },
            Call::GrantRole { role: Role::SwapOperator, account: self.swap_operator },
            Call::SetBridgeAddress { transport_id: DEVNET_BRIDGE, endpoint: bridge(chain_id) },
            Call::AddVault { vault_ids, vaults },
            Call::SetSrcTokenDistributor { ledger: config.ledger, chain: chain_id },
        ];
        for peer in self.config.chain_ids.iter().filter(|c| **c != chain_id) {
            let remote = ChainConfig::devnet(*peer);
            calls.push(Call::SetTrustedRemote { chain: *peer, remote: remote.handler });
            calls.push(Call::SetFeeSchedule { dst_chain: *peer, schedule: self.config.fee_schedule });
            calls.push(Call::SetSrcTokenDistributor { ledger: remote.ledger, chain: *peer });
        }
        // Positions on this ledger may name any chain's vaults.
        let all_vaults: Vec<VaultId> = self
            .config
            .chain_ids
            .iter()
            .flat_map(|c| (0..self.config.vaults_per_chain).map(move |i| vault_id(*c, i)))
            .collect();
        for id in &all_vaults {
            calls.push(Call::RegisterWrapper {
                vault_id: *id,
                name: format!("Wrapped Vault {id}"),
                symbol: format!("wV{id}"),
            });
        }
        for call in calls {
            self.network.call(chain_id, config.admin, U256::zero(), call)?;
        }

        let ledger = Call::RegisterController { kind: ControllerKind::Ledger };
        self.network.call(chain_id, config.ledger, U256::zero(), ledger)?;
        let executor = Call::RegisterController { kind: ControllerKind::Executor };
        self.network.call(chain_id, config.executor, U256::zero(), executor)?;
        Ok(())
    }

    fn fund_chain(&mut self, chain_id: ChainId) -> NodeResult<()> {
        let (tokens, native) = (U256::from(self.config.faucet_tokens), U256::from(self.config.faucet_native));
        let executor_native = U256::from(self.config.executor_native);
        let users = self.users.clone();
        let state = self.network.chain_mut(chain_id)?;
        for user in &users {
            state.mint_token(&asset(chain_id), user, tokens);
            state.mint_native(user, native);
        }
        let executor = state.config.executor;
        state.mint_native(&executor, executor_native);
        Ok(())
    }

    pub fn keeper(&self) -> crate::keeper::Keeper {
        crate::keeper::Keeper::new(self.operator)
    }

    /// Deposit `amounts` of `src`'s asset into the first vaults on `dst`.
    /// Bridged tokens are routed to the destination executor.
    pub fn deposit_call(&self, src: ChainId, dst: ChainId, amounts: &[u64], bound_bps: u16) -> NodeResult<Call> {
        let amounts: Vec<U256> = amounts.iter().map(|a| U256::from(*a)).collect();
        let total = amounts.iter().fold(U256::zero(), |acc, a| acc + *a);
        let route = BridgeRoute { recipient: ChainConfig::devnet(dst).executor, output_asset: asset(dst) };
        Ok(Call::Deposit {
            liquidity: vec![LiquidityIntent {
                transport_id: DEVNET_BRIDGE,
                tx_data: route.encode()?,
                asset: asset(src),
                transport_endpoint: bridge(src),
                amount: total,
                native_amount: U256::zero(),
            }],
            states: vec![StateIntent {
                dst_chain: dst,
                vault_ids: (0..amounts.len() as u64).map(|i| vault_id(dst, i)).collect(),
                max_slippage_bps: vec![bound_bps; amounts.len()],
                amounts,
                aux_flag: 0,
                relayer_fee_budget: U256::zero(),
            }],
        })
    }

    /// Withdraw `shares` of vault `index` on `dst`, delivered to `recipient`
    /// on `src`.
    pub fn withdraw_call(
        &self,
        src: ChainId,
        dst: ChainId,
        index: u64,
        shares: U256,
        recipient: Address,
    ) -> NodeResult<Call> {
        let route = BridgeRoute { recipient, output_asset: asset(src) };
        Ok(Call::Withdraw {
            states: vec![StateIntent {
                dst_chain: dst,
                amounts: vec![shares],
                vault_ids: vec![vault_id(dst, index)],
                max_slippage_bps: vec![0],
                aux_flag: 0,
                relayer_fee_budget: U256::zero(),
            }],
            liquidity: vec![LiquidityIntent {
                transport_id: DEVNET_BRIDGE,
                tx_data: route.encode()?,
                asset: asset(dst),
                transport_endpoint: bridge(dst),
                amount: U256::zero(),
                native_amount: U256::zero(),
            }],
        })
    }

    /// Native value that comfortably covers the transport fee of one
    /// intent. The surplus is refunded.
    pub fn fee_budget(&self) -> U256 {
        self.config.fee_schedule.quote(4_096)
    }
}
