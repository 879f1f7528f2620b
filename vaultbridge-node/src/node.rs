//! Node orchestrator.
//!
//! Deploys a devnet, seeds a cross-chain deposit followed by a partial
//! withdrawal, and drives the network and keeper on a fixed interval until
//! the scenario settles, the tick budget runs out, or shutdown is signaled.

use std::fmt;

use serde::Serialize;
use tracing::info;
use vaultbridge_core::crypto::short_address;
use vaultbridge_core::{Address, ChainId, U256};

use crate::config::NodeConfig;
use crate::devnet::{asset, vault_id, Devnet};
use crate::error::NodeResult;
use crate::keeper::{Keeper, KeeperReport};
use crate::shutdown::{shutdown_channel, wait_for_shutdown_signal, ShutdownGuard, ShutdownTx};

/// Where the scenario stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Deposit not yet sent.
    Start,
    /// Deposit sent; waiting for positions on the origin chain.
    AwaitingShares,
    /// Withdrawal sent; waiting for assets on the origin chain.
    AwaitingAssets,
    /// Both legs settled.
    Settled,
}

/// Deposit-then-withdraw scenario for one user.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub phase: Phase,
    pub user: Address,
    pub src: ChainId,
    pub dst: ChainId,
    pub amount: u64,
    pub slippage_bps: u16,
    pub shares_minted: U256,
    pub shares_withdrawn: U256,
    pub assets_returned: U256,
    balance_before_withdraw: U256,
}

impl Scenario {
    pub fn new(user: Address, src: ChainId, dst: ChainId, amount: u64, slippage_bps: u16) -> Self {
        Self {
            phase: Phase::Start,
            user,
            src,
            dst,
            amount,
            slippage_bps,
            shares_minted: U256::zero(),
            shares_withdrawn: U256::zero(),
            assets_returned: U256::zero(),
            balance_before_withdraw: U256::zero(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Settled
    }

    /// Move to the next phase once the current one has completed.
    pub fn advance(&mut self, devnet: &mut Devnet) -> NodeResult<()> {
        match self.phase {
            Phase::Start => {
                let deposit = devnet.deposit_call(self.src, self.dst, &[self.amount], self.slippage_bps)?;
                let value = devnet.fee_budget();
                devnet.network.call(self.src, self.user, value, deposit)?;
                info!(user = %short_address(&self.user), src = self.src, dst = self.dst, amount = self.amount, "deposit sent");
                self.phase = Phase::AwaitingShares;
            }
            Phase::AwaitingShares => {
                let shares = self.position(devnet)?;
                if shares.is_zero() {
                    return Ok(());
                }
                self.shares_minted = shares;
                self.shares_withdrawn = if shares > U256::one() { shares / U256::from(2u64) } else { shares };
                self.balance_before_withdraw = self.balance(devnet)?;
                let withdraw = devnet.withdraw_call(self.src, self.dst, 0, self.shares_withdrawn, self.user)?;
                let value = devnet.fee_budget();
                devnet.network.call(self.src, self.user, value, withdraw)?;
                info!(shares = %self.shares_withdrawn, "withdraw sent");
                self.phase = Phase::AwaitingAssets;
            }
            Phase::AwaitingAssets => {
                let balance = self.balance(devnet)?;
                if balance > self.balance_before_withdraw {
                    self.assets_returned = balance - self.balance_before_withdraw;
                    info!(assets = %self.assets_returned, "withdraw settled");
                    self.phase = Phase::Settled;
                }
            }
            Phase::Settled => {}
        }
        Ok(())
    }

    fn position(&self, devnet: &Devnet) -> NodeResult<U256> {
        let state = devnet.network.chain(self.src)?;
        Ok(state.positions.get(&(self.user, vault_id(self.dst, 0))).copied().unwrap_or_default())
    }

    fn balance(&self, devnet: &Devnet) -> NodeResult<U256> {
        let state = devnet.network.chain(self.src)?;
        Ok(state.token_balances.get(&(asset(self.src), self.user)).copied().unwrap_or_default())
    }
}

/// Per-chain totals for the summary.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    pub chain_id: ChainId,
    pub payloads: usize,
    pub open_payloads: usize,
    pub events: usize,
    pub custodied_shares: String,
}

/// What a run did.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub ticks: u64,
    pub phase: Phase,
    pub settled: bool,
    pub deposited: String,
    pub shares_minted: String,
    pub shares_withdrawn: String,
    pub assets_returned: String,
    pub keeper: KeeperReport,
    pub chains: Vec<ChainSummary>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks:            {}", self.ticks)?;
        writeln!(f, "phase:            {:?}", self.phase)?;
        writeln!(f, "deposited:        {}", self.deposited)?;
        writeln!(f, "shares minted:    {}", self.shares_minted)?;
        writeln!(f, "shares withdrawn: {}", self.shares_withdrawn)?;
        writeln!(f, "assets returned:  {}", self.assets_returned)?;
        writeln!(
            f,
            "keeper:           {} reconciled, {} processed, {} waiting, {} failed",
            self.keeper.reconciled, self.keeper.processed, self.keeper.waiting, self.keeper.failed
        )?;
        for chain in &self.chains {
            writeln!(
                f,
                "chain {}: {} payloads ({} open), {} events, {} shares in custody",
                chain.chain_id, chain.payloads, chain.open_payloads, chain.events, chain.custodied_shares
            )?;
        }
        Ok(())
    }
}

/// The main node structure.
pub struct Node {
    config: NodeConfig,
    devnet: Devnet,
    keeper: Keeper,
    scenario: Scenario,
    totals: KeeperReport,
    ticks: u64,
    shutdown_tx: ShutdownTx,
    guard: Option<ShutdownGuard>,
}

impl Node {
    /// Deploy the devnet and prepare the scenario.
    pub fn new(config: NodeConfig) -> NodeResult<Self> {
        let devnet = Devnet::deploy(config.devnet.clone())?;
        let keeper = devnet.keeper();
        let (src, dst) = (config.devnet.chain_ids[0], config.devnet.chain_ids[1]);
        let scenario = Scenario::new(devnet.users[0], src, dst, config.deposit_amount, config.slippage_bps);
        let (shutdown_tx, _) = shutdown_channel();
        let guard = Some(ShutdownGuard::new(&shutdown_tx));

        Ok(Self {
            config,
            devnet,
            keeper,
            scenario,
            totals: KeeperReport::default(),
            ticks: 0,
            shutdown_tx,
            guard,
        })
    }

    /// Sender that stops [`Node::run`] when signaled.
    pub fn shutdown_handle(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// One scenario step, one network step, one keeper pass.
    pub fn tick(&mut self) -> NodeResult<KeeperReport> {
        self.ticks += 1;
        self.scenario.advance(&mut self.devnet)?;
        let step = self.devnet.network.step();
        let report = self.keeper.tick(&mut self.devnet.network);
        self.totals.merge(&report);
        tracing::debug!(tick = self.ticks, ?step, ?report, "tick");
        Ok(report)
    }

    /// Run until settled, out of ticks, or shut down.
    pub async fn run(mut self) -> NodeResult<Summary> {
        info!("Starting vaultbridge devnet...");
        info!("  Chains: {:?}", self.config.devnet.chain_ids);
        info!("  Tick interval: {:?}", self.config.tick_interval);
        info!("  Bridge fee: {} bps", self.config.devnet.network.bridge_fee_bps);
        info!("  Duplicate delivery: {}", self.config.devnet.network.duplicate_delivery);

        let signal_tx = self.shutdown_tx.clone();
        let signal_task = tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            let _ = signal_tx.send(());
        });

        let mut guard = match self.guard.take() {
            Some(guard) => guard,
            None => ShutdownGuard::new(&self.shutdown_tx),
        };
        let mut interval = tokio::time::interval(self.config.tick_interval);
        let result = loop {
            tokio::select! {
                _ = guard.wait() => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick() {
                        break Err(e);
                    }
                    if self.scenario.is_settled() {
                        info!(ticks = self.ticks, "scenario settled");
                        break Ok(());
                    }
                    if self.ticks >= self.config.max_ticks {
                        tracing::warn!(ticks = self.ticks, "tick budget exhausted");
                        break Ok(());
                    }
                }
            }
        };
        signal_task.abort();
        result?;

        info!("Node shutdown complete");
        Ok(self.summary())
    }

    pub fn devnet(&self) -> &Devnet {
        &self.devnet
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Snapshot of the run so far.
    pub fn summary(&self) -> Summary {
        let chains = self
            .devnet
            .network
            .chain_ids()
            .into_iter()
            .filter_map(|id| self.devnet.network.chain(id).ok())
            .map(|state| ChainSummary {
                chain_id: state.chain_id(),
                payloads: state.payloads.len(),
                open_payloads: state.open_payloads().len(),
                events: state.events.len(),
                custodied_shares: state.custody.values().fold(U256::zero(), |acc, s| acc + *s).to_string(),
            })
            .collect();

        Summary {
            ticks: self.ticks,
            phase: self.scenario.phase,
            settled: self.scenario.is_settled(),
            deposited: self.scenario.amount.to_string(),
            shares_minted: self.scenario.shares_minted.to_string(),
            shares_withdrawn: self.scenario.shares_withdrawn.to_string(),
            assets_returned: self.scenario.assets_returned.to_string(),
            keeper: self.totals,
            chains,
        }
    }
}
