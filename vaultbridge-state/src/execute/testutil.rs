//! Two-chain fixture for unit tests.
//!
//! Chain 1 is the user's home chain, chain 2 hosts the remote vault. Both
//! are wired the way the devnet wires them, through `apply_call`.

#![allow(dead_code)]

use vaultbridge_core::crypto::derive_address;
use vaultbridge_core::{
    Address, BridgeRoute, ChainId, Erc4626Vault, LiquidityIntent, PayloadId, Role, StateIntent, U256,
};

pub use vaultbridge_core::vault_id;

use crate::config::{ChainConfig, FeeSchedule};
use crate::error::StateResult;
use crate::state::{ChainState, ControllerKind, StateReader};

use super::call::{Call, Receipt};
use super::context::ExecutionContext;
use super::executor::apply_call;

pub const HOME: ChainId = 1;
pub const REMOTE: ChainId = 2;
pub const USER: Address = [0xA1; 20];
pub const OPERATOR: Address = [0x0B; 20];
pub const TS: u64 = 1_700_000_000;

pub fn asset(chain: ChainId) -> Address {
    derive_address("usdc", chain)
}

pub fn bridge(chain: ChainId) -> Address {
    derive_address("bridge", chain)
}

pub fn vault_address(chain: ChainId, index: u64) -> Address {
    derive_address(&format!("vault-{index}"), chain)
}

/// A chain with two vaults on its own asset, trusting every peer.
pub fn wired_chain(chain_id: ChainId, peers: &[ChainId]) -> ChainState {
    let config = ChainConfig::devnet(chain_id);
    let (admin, ledger, executor) = (config.admin, config.ledger, config.executor);
    let mut state = ChainState::new(config);
    for index in 0..2 {
        state.deploy_vault(Erc4626Vault::new(vault_address(chain_id, index), asset(chain_id)));
    }

    let mut calls = vec![
        Call::GrantRole { role: Role::CoreController, account: ledger },
        Call::GrantRole { role: Role::CoreController, account: executor },
        Call::GrantRole { role: Role::PayloadOperator, account: OPERATOR },
        Call::GrantRole { role: Role::SwapOperator, account: OPERATOR },
        Call::SetBridgeAddress { transport_id: 1, endpoint: bridge(chain_id) },
        Call::AddVault {
            vault_ids: vec![vault_id(chain_id, 0), vault_id(chain_id, 1)],
            vaults: vec![vault_address(chain_id, 0), vault_address(chain_id, 1)],
        },
        Call::SetSrcTokenDistributor { ledger, chain: chain_id },
    ];
    for peer in peers {
        let remote = ChainConfig::devnet(*peer);
        calls.push(Call::SetTrustedRemote { chain: *peer, remote: remote.handler });
        calls.push(Call::SetFeeSchedule { dst_chain: *peer, schedule: FeeSchedule::new(1_000, 10) });
        calls.push(Call::SetSrcTokenDistributor { ledger: remote.ledger, chain: *peer });
    }
    let ctx = ExecutionContext::new(admin, TS);
    for call in &calls {
        apply_call(&mut state, &ctx, call).expect("admin setup");
    }
    apply_call(&mut state, &ExecutionContext::new(ledger, TS), &Call::RegisterController { kind: ControllerKind::Ledger })
        .expect("ledger controller");
    apply_call(&mut state, &ExecutionContext::new(executor, TS), &Call::RegisterController { kind: ControllerKind::Executor })
        .expect("executor controller");

    state.mint_token(&asset(chain_id), &USER, U256::from(1_000_000u64));
    state.mint_native(&USER, U256::from(10_000_000u64));
    state.mint_native(&executor, U256::from(1_000_000u64));
    state.events.clear();
    state
}

/// Home and remote chains, wired to each other.
pub fn pair() -> (ChainState, ChainState) {
    (wired_chain(HOME, &[REMOTE]), wired_chain(REMOTE, &[HOME]))
}

pub fn call(state: &mut ChainState, caller: Address, call: Call) -> StateResult<Receipt> {
    apply_call(state, &ExecutionContext::new(caller, TS), &call)
}

pub fn call_at(state: &mut ChainState, caller: Address, ts: u64, call: Call) -> StateResult<Receipt> {
    apply_call(state, &ExecutionContext::new(caller, ts), &call)
}

pub fn call_with_value(
    state: &mut ChainState,
    caller: Address,
    value: u64,
    call: Call,
) -> StateResult<Receipt> {
    apply_call(state, &ExecutionContext::new(caller, TS).with_value(U256::from(value)), &call)
}

/// Route bytes delivering `dst`'s vault asset to `recipient` on `dst`.
pub fn route_to(recipient: Address, dst: ChainId) -> Vec<u8> {
    BridgeRoute { recipient, output_asset: asset(dst) }.encode().expect("route")
}

/// Deposit `amounts` from `src` into the first vaults of `dst`.
pub fn deposit_call(src: ChainId, dst: ChainId, amounts: &[u64], bound_bps: u16) -> Call {
    let amounts: Vec<U256> = amounts.iter().map(|a| U256::from(*a)).collect();
    let total = amounts.iter().fold(U256::zero(), |acc, a| acc + *a);
    let executor = ChainConfig::devnet(dst).executor;
    Call::Deposit {
        liquidity: vec![LiquidityIntent {
            transport_id: 1,
            tx_data: route_to(executor, dst),
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
    }
}

/// Withdraw `shares` of the first vault on `dst` back to `src`.
pub fn withdraw_call(src: ChainId, dst: ChainId, shares: u64) -> Call {
    Call::Withdraw {
        states: vec![StateIntent {
            dst_chain: dst,
            amounts: vec![U256::from(shares)],
            vault_ids: vec![vault_id(dst, 0)],
            max_slippage_bps: vec![0],
            aux_flag: 0,
            relayer_fee_budget: U256::zero(),
        }],
        liquidity: vec![LiquidityIntent {
            transport_id: 1,
            tx_data: route_to(USER, src),
            asset: asset(dst),
            transport_endpoint: bridge(dst),
            amount: U256::zero(),
            native_amount: U256::zero(),
        }],
    }
}

/// Deliver every queued message from `from` to `to`.
pub fn relay(from: &mut ChainState, to: &mut ChainState) -> Vec<StateResult<PayloadId>> {
    let endpoint = to.config.transport_endpoint;
    let chain = to.chain_id();
    from.drain_outbox()
        .into_iter()
        .filter(|m| m.dst_chain == chain)
        .map(|m| {
            to.mint_native(&endpoint, m.airdrop);
            let ctx = ExecutionContext::new(endpoint, TS).with_value(m.airdrop);
            let receive = Call::Receive { src_chain: m.src_chain, sender: m.sender, bytes: m.bytes };
            apply_call(to, &ctx, &receive).map(|r| r.payload_ids[0])
        })
        .collect()
}

/// Settle every queued bridge transfer from `from` onto `to`, in full.
pub fn settle(from: &mut ChainState, to: &mut ChainState) {
    for transfer in from.drain_liquidity() {
        from.burn_token(&transfer.asset, &transfer.endpoint, transfer.amount).expect("bridge holds tokens");
        let route = BridgeRoute::decode(&transfer.route).expect("route");
        to.mint_token(&route.output_asset, &route.recipient, transfer.amount);
        to.mint_native(&route.recipient, transfer.native_amount);
    }
}

/// Settle transfers whose destination is the chain they left.
pub fn settle_local(state: &mut ChainState) {
    for transfer in state.drain_liquidity() {
        state.burn_token(&transfer.asset, &transfer.endpoint, transfer.amount).expect("bridge holds tokens");
        let route = BridgeRoute::decode(&transfer.route).expect("route");
        state.mint_token(&route.output_asset, &route.recipient, transfer.amount);
    }
}

/// Full cross-chain deposit of `amount` into the remote vault, settled
/// end to end. Returns the shares minted at home.
pub fn settled_deposit(home: &mut ChainState, remote: &mut ChainState, amount: u64) -> U256 {
    call_with_value(home, USER, 1_000_000, deposit_call(HOME, REMOTE, &[amount], 100)).expect("deposit");
    settle(home, remote);
    let payload_id = relay(home, remote).remove(0).expect("receive");
    call(remote, OPERATOR, Call::UpdateState { payload_id, actual_amounts: vec![U256::from(amount)] })
        .expect("update");
    call(remote, OPERATOR, Call::ProcessPayload { payload_id, aux_data: vec![] }).expect("process");
    let return_id = relay(remote, home).remove(0).expect("return");
    call(home, OPERATOR, Call::ProcessPayload { payload_id: return_id, aux_data: vec![] }).expect("sync");
    home.position(&USER, vault_id(REMOTE, 0))
}
