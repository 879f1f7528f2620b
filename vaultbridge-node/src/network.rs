//! In-process transport and bridge between chains.
//!
//! The network owns every chain's state. Each step moves queued messages
//! and bridge transfers to their destinations. Delivery is at-least-once
//! and unordered when configured so: messages may be delivered twice and
//! batches may be shuffled. Bridge transfers may be held back to model a
//! slow bridge.

use std::collections::{BTreeMap, HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};
use vaultbridge_core::crypto::short_address;
use vaultbridge_core::{Address, BridgeRoute, ChainId, LiquidityTransfer, OutboundMessage, U256};
use vaultbridge_state::{apply_call, Call, ChainState, ExecutionContext, Receipt};

use crate::error::{NodeError, NodeResult};

/// Unix time the devnet clock starts at.
pub const GENESIS_TIME: u64 = 1_700_000_000;

/// Transport and bridge behavior.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bridge fee in basis points, taken from every transfer.
    pub bridge_fee_bps: u16,

    /// Deliver every message twice.
    pub duplicate_delivery: bool,

    /// Shuffle each delivery batch with this seed.
    pub shuffle_seed: Option<u64>,

    /// Seconds the clock advances per step.
    pub block_time: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bridge_fee_bps: 0,
            duplicate_delivery: false,
            shuffle_seed: None,
            block_time: 12,
        }
    }
}

/// What the bridge delivered for one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub transfer_id: u64,
    pub src_chain: ChainId,
    pub dst_chain: ChainId,
    pub recipient: Address,
    pub output_asset: Address,
    pub sent: U256,
    pub delivered: U256,
}

/// Counts from one [`Network::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub messages_delivered: usize,
    pub messages_rejected: usize,
    pub transfers_delivered: usize,
}

/// A set of chains connected by the devnet transport and bridge.
pub struct Network {
    chains: BTreeMap<ChainId, ChainState>,
    config: NetworkConfig,
    clock: u64,
    height: u64,
    messages: VecDeque<OutboundMessage>,
    transfers: VecDeque<LiquidityTransfer>,
    receipts: HashMap<(ChainId, u64), DeliveryReceipt>,
    hold_liquidity: bool,
    rng: Option<StdRng>,
}

impl Network {
    /// Empty network.
    pub fn new(config: NetworkConfig) -> Self {
        let rng = config.shuffle_seed.map(StdRng::seed_from_u64);
        Self {
            chains: BTreeMap::new(),
            config,
            clock: GENESIS_TIME,
            height: 0,
            messages: VecDeque::new(),
            transfers: VecDeque::new(),
            receipts: HashMap::new(),
            hold_liquidity: false,
            rng,
        }
    }

    /// Add a chain. Replaces any chain with the same id.
    pub fn add_chain(&mut self, state: ChainState) {
        self.chains.insert(state.chain_id(), state);
    }

    /// Ids of every chain, ascending.
    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.chains.keys().copied().collect()
    }

    pub fn chain(&self, id: ChainId) -> NodeResult<&ChainState> {
        self.chains.get(&id).ok_or(NodeError::UnknownChain(id))
    }

    pub fn chain_mut(&mut self, id: ChainId) -> NodeResult<&mut ChainState> {
        self.chains.get_mut(&id).ok_or(NodeError::UnknownChain(id))
    }

    /// Current devnet time.
    pub fn now(&self) -> u64 {
        self.clock
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// Move the clock forward without stepping.
    pub fn advance_time(&mut self, seconds: u64) {
        self.clock += seconds;
    }

    /// Keep bridge transfers queued until released.
    pub fn set_hold_liquidity(&mut self, hold: bool) {
        self.hold_liquidity = hold;
    }

    /// Bridge receipt for a transfer sent from `src_chain`.
    pub fn receipt(&self, src_chain: ChainId, transfer_id: u64) -> Option<&DeliveryReceipt> {
        self.receipts.get(&(src_chain, transfer_id))
    }

    /// Messages and transfers waiting for delivery.
    pub fn in_flight(&self) -> (usize, usize) {
        (self.messages.len(), self.transfers.len())
    }

    /// Apply `call` on `chain` as `caller` with `value` attached.
    pub fn call(
        &mut self,
        chain: ChainId,
        caller: Address,
        value: U256,
        call: Call,
    ) -> NodeResult<Receipt> {
        let ctx = ExecutionContext::new(caller, self.clock)
            .with_value(value)
            .at_height(self.height);
        let state = self.chain_mut(chain)?;
        apply_call(state, &ctx, &call).map_err(|source| NodeError::Call { chain, source })
    }

    /// Collect every chain's outbound messages and bridge transfers.
    pub fn relay(&mut self) -> (usize, usize) {
        let mut collected = (0, 0);
        for state in self.chains.values_mut() {
            let messages = state.drain_outbox();
            let transfers = state.drain_liquidity();
            collected.0 += messages.len();
            collected.1 += transfers.len();
            self.messages.extend(messages);
            self.transfers.extend(transfers);
        }
        collected
    }

    /// Deliver every queued message. Returns (delivered, rejected).
    pub fn deliver_messages(&mut self) -> (usize, usize) {
        let mut batch: Vec<OutboundMessage> = self.messages.drain(..).collect();
        if let Some(rng) = self.rng.as_mut() {
            batch.shuffle(rng);
        }
        let copies = if self.config.duplicate_delivery { 2 } else { 1 };

        let (mut delivered, mut rejected) = (0, 0);
        for message in batch {
            for _ in 0..copies {
                match self.deliver_message(&message) {
                    Ok(payload_id) => {
                        delivered += 1;
                        debug!(payload_id, src_chain = message.src_chain, dst_chain = message.dst_chain, "message delivered");
                    }
                    Err(e) => {
                        rejected += 1;
                        warn!(src_chain = message.src_chain, dst_chain = message.dst_chain, error = %e, "delivery rejected");
                    }
                }
            }
        }
        (delivered, rejected)
    }

    fn deliver_message(&mut self, message: &OutboundMessage) -> NodeResult<u64> {
        let (clock, height) = (self.clock, self.height);
        let state = self.chain_mut(message.dst_chain)?;
        let endpoint = state.config.transport_endpoint;
        // The transport funds the airdrop it forwards.
        state.mint_native(&endpoint, message.airdrop);
        let ctx = ExecutionContext::new(endpoint, clock)
            .with_value(message.airdrop)
            .at_height(height);
        let receive = Call::Receive {
            src_chain: message.src_chain,
            sender: message.sender,
            bytes: message.bytes.clone(),
        };
        let receipt = apply_call(state, &ctx, &receive)
            .map_err(|source| NodeError::Call { chain: message.dst_chain, source })?;
        Ok(receipt.payload_ids.first().copied().unwrap_or_default())
    }

    /// Execute queued bridge transfers unless held. Returns how many landed.
    pub fn deliver_liquidity(&mut self) -> usize {
        if self.hold_liquidity {
            return 0;
        }
        let batch: Vec<LiquidityTransfer> = self.transfers.drain(..).collect();
        let mut delivered = 0;
        for transfer in batch {
            match self.deliver_transfer(&transfer) {
                Ok(receipt) => {
                    info!(
                        transfer_id = receipt.transfer_id,
                        dst_chain = receipt.dst_chain,
                        recipient = %short_address(&receipt.recipient),
                        delivered = %receipt.delivered,
                        "bridge transfer delivered"
                    );
                    self.receipts.insert((receipt.src_chain, receipt.transfer_id), receipt);
                    delivered += 1;
                }
                Err(e) => {
                    warn!(transfer_id = transfer.transfer_id, error = %e, "bridge transfer dropped");
                }
            }
        }
        delivered
    }

    fn deliver_transfer(&mut self, transfer: &LiquidityTransfer) -> NodeResult<DeliveryReceipt> {
        let route = BridgeRoute::decode(&transfer.route)?;
        if !self.chains.contains_key(&transfer.dst_chain) {
            return Err(NodeError::UnknownChain(transfer.dst_chain));
        }
        let fee = transfer.amount.bps_of(u64::from(self.config.bridge_fee_bps));
        let delivered = transfer.amount - fee;

        self.chain_mut(transfer.src_chain)?
            .burn_token(&transfer.asset, &transfer.endpoint, transfer.amount)?;
        let dst = self.chain_mut(transfer.dst_chain)?;
        dst.mint_token(&route.output_asset, &route.recipient, delivered);
        dst.mint_native(&route.recipient, transfer.native_amount);

        Ok(DeliveryReceipt {
            transfer_id: transfer.transfer_id,
            src_chain: transfer.src_chain,
            dst_chain: transfer.dst_chain,
            recipient: route.recipient,
            output_asset: route.output_asset,
            sent: transfer.amount,
            delivered,
        })
    }

    /// Advance one block: collect, settle bridge transfers, then deliver
    /// messages.
    pub fn step(&mut self) -> StepReport {
        self.clock += self.config.block_time;
        self.height += 1;
        self.relay();
        let transfers_delivered = self.deliver_liquidity();
        let (messages_delivered, messages_rejected) = self.deliver_messages();
        StepReport { messages_delivered, messages_rejected, transfers_delivered }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultbridge_state::ChainConfig;

    fn two_chains(config: NetworkConfig) -> Network {
        let mut network = Network::new(config);
        network.add_chain(ChainState::new(ChainConfig::devnet(1)));
        network.add_chain(ChainState::new(ChainConfig::devnet(2)));
        network
    }

    fn queue_transfer(network: &mut Network, amount: u64) -> Address {
        let recipient = [0x42; 20];
        let asset = [0x10; 20];
        let endpoint = [0x20; 20];
        let src = network.chain_mut(1).unwrap();
        src.mint_token(&asset, &endpoint, U256::from(amount));
        src.liquidity_outbox.push(LiquidityTransfer {
            transfer_id: 1,
            src_chain: 1,
            dst_chain: 2,
            transport_id: 1,
            endpoint,
            sender: [0x01; 20],
            asset,
            amount: U256::from(amount),
            route: BridgeRoute { recipient, output_asset: [0x30; 20] }.encode().unwrap(),
            native_amount: U256::from(5u64),
        });
        recipient
    }

    #[test]
    fn test_unknown_chain() {
        let network = two_chains(NetworkConfig::default());
        assert!(matches!(network.chain(9), Err(NodeError::UnknownChain(9))));
        assert_eq!(network.chain_ids(), vec![1, 2]);
    }

    #[test]
    fn test_bridge_fee_and_receipt() {
        let mut network = two_chains(NetworkConfig { bridge_fee_bps: 30, ..Default::default() });
        let recipient = queue_transfer(&mut network, 10_000);
        let report = network.step();
        assert_eq!(report.transfers_delivered, 1);

        let receipt = network.receipt(1, 1).unwrap();
        assert_eq!(receipt.sent, U256::from(10_000u64));
        assert_eq!(receipt.delivered, U256::from(9_970u64));
        let dst = network.chain(2).unwrap();
        assert_eq!(dst.token_balances.get(&([0x30; 20], recipient)), Some(&U256::from(9_970u64)));
        assert_eq!(dst.native_balances.get(&recipient), Some(&U256::from(5u64)));
    }

    #[test]
    fn test_held_liquidity_stays_queued() {
        let mut network = two_chains(NetworkConfig::default());
        queue_transfer(&mut network, 100);
        network.set_hold_liquidity(true);
        network.step();
        assert_eq!(network.in_flight(), (0, 1));
        assert!(network.receipt(1, 1).is_none());

        network.set_hold_liquidity(false);
        network.step();
        assert_eq!(network.in_flight(), (0, 0));
        assert!(network.receipt(1, 1).is_some());
    }

    #[test]
    fn test_step_advances_clock() {
        let mut network = two_chains(NetworkConfig::default());
        network.step();
        assert_eq!(network.now(), GENESIS_TIME + 12);
        assert_eq!(network.height(), 1);
        network.advance_time(100);
        assert_eq!(network.now(), GENESIS_TIME + 112);
    }
}
