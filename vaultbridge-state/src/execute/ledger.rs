//! Position ledger.
//!
//! The ledger lives on the origin chain and is the only place positions are
//! minted or burned. Same-chain intents settle against the local executor in
//! the same call; cross-chain intents hand tokens to a bridge and dispatch a
//! payload. Deposits mint later, when the RETURN is processed. Withdrawals
//! burn before anything is dispatched.

use tracing::info;
use vaultbridge_core::crypto::short_address;
use vaultbridge_core::{
    vault_chain, Address, ChainId, CrossChainMessage, LiquidityIntent, LiquidityTransfer,
    PayloadKind, StateIntent, TxId, VaultId, U256,
};

use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::state::{StateReader, StateWriter, TxRecord};

use super::call::Receipt;
use super::context::ExecutionContext;
use super::funds::{transfer_native, transfer_token};
use super::transport::{dispatch, estimate_message_fee};
use super::vault_executor::{deposit_into_vault, vault_asset, withdraw_local};

/// Reject mismatched intent lists, inconsistent parallel arrays,
/// out-of-range slippage bounds and vaults not hosted on the intent's
/// destination chain.
fn validate_intents(liquidity_len: usize, states: &[StateIntent]) -> StateResult<()> {
    if states.is_empty() || liquidity_len != states.len() {
        return Err(StateError::ArityMismatch { expected: states.len(), actual: liquidity_len });
    }
    for intent in states {
        if intent.arity().is_none() {
            return Err(StateError::ArityMismatch {
                expected: intent.vault_ids.len(),
                actual: intent.amounts.len().min(intent.max_slippage_bps.len()),
            });
        }
        if let Some(bps) = intent.invalid_slippage_bound() {
            return Err(StateError::InvalidSlippageBound { bps });
        }
        if let Some(vault_id) = intent.vault_ids.iter().find(|v| vault_chain(**v) != intent.dst_chain) {
            return Err(StateError::VaultChainMismatch { vault_id: *vault_id, chain: intent.dst_chain });
        }
    }
    Ok(())
}

/// Build the message for a cross-chain intent. Dispatch fills in the
/// payload id.
fn intent_message<S: StateReader>(
    state: &mut S,
    kind: PayloadKind,
    user: &Address,
    tx_id: TxId,
    intent: &StateIntent,
    liquidity_transfer: Option<u64>,
    route_out: Option<LiquidityIntent>,
) -> CrossChainMessage {
    let config = state.config();
    CrossChainMessage {
        kind,
        src_chain: config.chain_id,
        dst_chain: intent.dst_chain,
        origin_payload_id: 0,
        origin_ledger: config.ledger,
        user: *user,
        tx_id,
        amounts: intent.amounts.clone(),
        vault_ids: intent.vault_ids.clone(),
        max_slippage_bps: intent.max_slippage_bps.clone(),
        aux_flag: intent.aux_flag,
        liquidity_transfer,
        route_out,
    }
}

/// Native value a set of intents needs: transport fee, relayer budget and
/// bridge native amount for every cross-chain intent, plus the bridge
/// native amount of every same-chain intent.
fn required_value<S: StateReader>(
    state: &mut S,
    kind: PayloadKind,
    user: &Address,
    liquidity: &[LiquidityIntent],
    states: &[StateIntent],
) -> StateResult<U256> {
    let local = state.config().chain_id;
    let mut required = U256::zero();
    for (liq, intent) in liquidity.iter().zip(states) {
        if intent.dst_chain == local {
            required = required + liq.native_amount;
            continue;
        }
        // Placeholders have the same encoded width as the real values.
        let (transfer, route_out) = match kind {
            PayloadKind::Deposit => (Some(0), None),
            _ => (None, Some(liq.clone())),
        };
        let message = intent_message(state, kind, user, 0, intent, transfer, route_out);
        let fee = estimate_message_fee(state, &message)?;
        required = required + fee + intent.relayer_fee_budget + liq.native_amount;
    }
    Ok(required)
}

/// Hand a same-chain intent's native amount to the bridge it names.
fn forward_native<S: StateWriter>(state: &mut S, liq: &LiquidityIntent) -> StateResult<()> {
    if liq.native_amount.is_zero() {
        return Ok(());
    }
    let bridge = state
        .bridge(liq.transport_id)
        .ok_or(StateError::BridgeNotRegistered { transport_id: liq.transport_id })?;
    let ledger = state.config().ledger;
    transfer_native(state, &ledger, &bridge, liq.native_amount)
}

fn refund_surplus<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    required: U256,
) -> StateResult<U256> {
    let refund = ctx.value - required;
    let ledger = state.config().ledger;
    transfer_native(state, &ledger, &ctx.caller, refund)?;
    Ok(refund)
}

/// Execute a Deposit call.
///
/// The attached value has already been escrowed with the ledger. One outer
/// payment covers every sub-intent; the surplus is refunded.
pub fn execute_deposit<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    liquidity: &[LiquidityIntent],
    states: &[StateIntent],
) -> StateResult<Receipt> {
    validate_intents(liquidity.len(), states)?;
    let user = ctx.caller;
    let required = required_value(state, PayloadKind::Deposit, &user, liquidity, states)?;
    if ctx.value < required {
        return Err(StateError::InsufficientFee { required, provided: ctx.value });
    }

    let local = state.config().chain_id;
    let mut receipt = Receipt::default();
    for (liq, intent) in liquidity.iter().zip(states) {
        if intent.dst_chain == local {
            let shares = same_chain_deposit(state, &user, liq, intent)?;
            receipt.amounts.extend(shares);
        } else {
            let (tx_id, payload_id) = cross_chain_deposit(state, ctx, &user, liq, intent)?;
            receipt.tx_ids.push(tx_id);
            receipt.payload_ids.push(payload_id);
        }
    }
    receipt.refund = refund_surplus(state, ctx, required)?;
    Ok(receipt)
}

fn same_chain_deposit<S: StateWriter>(
    state: &mut S,
    user: &Address,
    liq: &LiquidityIntent,
    intent: &StateIntent,
) -> StateResult<Vec<U256>> {
    let total = intent.total_amount();
    if liq.amount != total {
        return Err(StateError::AmountMismatch { expected: total, actual: liq.amount });
    }
    for (vault_id, amount) in intent.vault_ids.iter().zip(&intent.amounts) {
        if amount.is_zero() {
            return Err(StateError::ZeroAmount);
        }
        let (_, asset) = vault_asset(state, *vault_id)?;
        if asset != liq.asset {
            return Err(StateError::AssetMismatch { vault_id: *vault_id });
        }
    }

    let executor = state.config().executor;
    transfer_token(state, &liq.asset, user, &executor, total)?;
    forward_native(state, liq)?;

    let mut shares = Vec::with_capacity(intent.vault_ids.len());
    for (vault_id, amount) in intent.vault_ids.iter().zip(&intent.amounts) {
        let minted = deposit_into_vault(state, &executor, *vault_id, *amount)?;
        let balance = state.position(user, *vault_id) + minted;
        state.set_position(user, *vault_id, balance);
        shares.push(minted);
    }
    state.emit(Event::SameChainDeposit {
        user: *user,
        vault_ids: intent.vault_ids.clone(),
        shares: shares.clone(),
    });
    info!(user = %short_address(user), vaults = intent.vault_ids.len(), "same-chain deposit settled");
    Ok(shares)
}

fn cross_chain_deposit<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    user: &Address,
    liq: &LiquidityIntent,
    intent: &StateIntent,
) -> StateResult<(TxId, u64)> {
    if liq.amount.is_zero() || intent.amounts.iter().any(|a| a.is_zero()) {
        return Err(StateError::ZeroAmount);
    }
    let total = intent.total_amount();
    if liq.amount != total {
        return Err(StateError::AmountMismatch { expected: total, actual: liq.amount });
    }
    let bridge = state
        .bridge(liq.transport_id)
        .ok_or(StateError::BridgeNotRegistered { transport_id: liq.transport_id })?;
    if bridge != liq.transport_endpoint {
        return Err(StateError::InvalidTransportEndpoint { expected: bridge, actual: liq.transport_endpoint });
    }

    let (local, ledger) = {
        let config = state.config();
        (config.chain_id, config.ledger)
    };
    transfer_token(state, &liq.asset, user, &bridge, liq.amount)?;
    transfer_native(state, &ledger, &bridge, liq.native_amount)?;
    let transfer_id = state.next_transfer_id();
    state.push_liquidity(LiquidityTransfer {
        transfer_id,
        src_chain: local,
        dst_chain: intent.dst_chain,
        transport_id: liq.transport_id,
        endpoint: bridge,
        sender: *user,
        asset: liq.asset,
        amount: liq.amount,
        route: liq.tx_data.clone(),
        native_amount: liq.native_amount,
    });

    let tx_id = state.next_tx_id();
    let message = intent_message(state, PayloadKind::Deposit, user, tx_id, intent, Some(transfer_id), None);
    let payload_id = dispatch(state, &ctx.as_caller(ledger), &ledger, &ledger, message, intent.relayer_fee_budget)?;
    state.insert_tx(TxRecord {
        tx_id,
        kind: PayloadKind::Deposit,
        user: *user,
        dst_chain: intent.dst_chain,
        vault_ids: intent.vault_ids.clone(),
        amounts: intent.amounts.clone(),
        payload_id,
        synced: false,
    });
    state.emit(Event::CrossChainInitiated {
        tx_id,
        payload_id,
        kind: PayloadKind::Deposit,
        dst_chain: intent.dst_chain,
    });
    info!(tx_id, payload_id, dst_chain = intent.dst_chain, "cross-chain deposit initiated");
    Ok((tx_id, payload_id))
}

/// Burn `amount` of the owner's position, failing if it does not cover it.
fn burn_position<S: StateWriter>(
    state: &mut S,
    owner: &Address,
    vault_id: VaultId,
    amount: U256,
) -> StateResult<()> {
    let held = state.position(owner, vault_id);
    if held < amount {
        return Err(StateError::InsufficientShares { vault_id, held, requested: amount });
    }
    state.set_position(owner, vault_id, held - amount);
    Ok(())
}

/// Execute a Withdraw call.
///
/// Positions are burned before any message leaves the chain. Assets go to
/// the caller; there is no RETURN for withdrawals.
pub fn execute_withdraw<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    states: &[StateIntent],
    liquidity: &[LiquidityIntent],
) -> StateResult<Receipt> {
    validate_intents(liquidity.len(), states)?;
    let user = ctx.caller;
    let required = required_value(state, PayloadKind::Withdraw, &user, liquidity, states)?;
    if ctx.value < required {
        return Err(StateError::InsufficientFee { required, provided: ctx.value });
    }

    let (local, ledger, executor) = {
        let config = state.config();
        (config.chain_id, config.ledger, config.executor)
    };
    let mut receipt = Receipt::default();
    for (liq, intent) in liquidity.iter().zip(states) {
        for (vault_id, shares) in intent.vault_ids.iter().zip(&intent.amounts) {
            if shares.is_zero() {
                return Err(StateError::ZeroAmount);
            }
            burn_position(state, &user, *vault_id, *shares)?;
        }

        if intent.dst_chain == local {
            let mut assets = Vec::with_capacity(intent.vault_ids.len());
            for (vault_id, shares) in intent.vault_ids.iter().zip(&intent.amounts) {
                assets.push(withdraw_local(state, &executor, *vault_id, *shares, &user)?);
            }
            forward_native(state, liq)?;
            state.emit(Event::SameChainWithdraw {
                user,
                vault_ids: intent.vault_ids.clone(),
                assets: assets.clone(),
            });
            receipt.amounts.extend(assets);
            continue;
        }

        let tx_id = state.next_tx_id();
        let message = intent_message(state, PayloadKind::Withdraw, &user, tx_id, intent, None, Some(liq.clone()));
        let airdrop = intent.relayer_fee_budget + liq.native_amount;
        let payload_id = dispatch(state, &ctx.as_caller(ledger), &ledger, &ledger, message, airdrop)?;
        state.insert_tx(TxRecord {
            tx_id,
            kind: PayloadKind::Withdraw,
            user,
            dst_chain: intent.dst_chain,
            vault_ids: intent.vault_ids.clone(),
            amounts: intent.amounts.clone(),
            payload_id,
            synced: false,
        });
        state.emit(Event::CrossChainInitiated {
            tx_id,
            payload_id,
            kind: PayloadKind::Withdraw,
            dst_chain: intent.dst_chain,
        });
        info!(tx_id, payload_id, dst_chain = intent.dst_chain, "cross-chain withdraw initiated");
        receipt.tx_ids.push(tx_id);
        receipt.payload_ids.push(payload_id);
    }
    receipt.refund = refund_surplus(state, ctx, required)?;
    Ok(receipt)
}

/// Mint positions reported by a RETURN.
///
/// Only the local state handler may call this. Each ledger transaction
/// syncs at most once.
pub fn state_sync<S: StateWriter>(
    state: &mut S,
    caller: &Address,
    tx_id: TxId,
    src_chain: ChainId,
    vault_ids: &[VaultId],
    shares: &[U256],
) -> StateResult<()> {
    let handler = state.config().handler;
    if *caller != handler {
        return Err(StateError::Unauthorized { caller: *caller, expected: handler });
    }
    if vault_ids.is_empty() || vault_ids.len() != shares.len() {
        return Err(StateError::ArityMismatch { expected: vault_ids.len(), actual: shares.len() });
    }
    let record = state
        .get_tx(tx_id)
        .cloned()
        .ok_or(StateError::UnknownTransaction { tx_id })?;
    if record.synced {
        return Err(StateError::AlreadySynced { tx_id });
    }
    if record.kind != PayloadKind::Deposit
        || record.dst_chain != src_chain
        || vault_ids.iter().any(|v| !record.vault_ids.contains(v))
    {
        return Err(StateError::InvalidReturn { tx_id });
    }

    for (vault_id, minted) in vault_ids.iter().zip(shares) {
        let balance = state.position(&record.user, *vault_id) + *minted;
        state.set_position(&record.user, *vault_id, balance);
    }
    state.update_tx(tx_id, |r| r.synced = true);
    state.emit(Event::Completed { tx_id, user: record.user });
    info!(tx_id, user = %short_address(&record.user), "positions minted");
    Ok(())
}

/// Execute a SetApprovalForAll call.
pub fn execute_set_approval_for_all<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    operator: &Address,
    approved: bool,
) -> StateResult<()> {
    state.set_approval(&ctx.caller, operator, approved);
    Ok(())
}

/// Move positions from `from` to `to`. The caller must be `from` or an
/// operator `from` approved.
pub(crate) fn move_position<S: StateWriter>(
    state: &mut S,
    caller: &Address,
    from: &Address,
    to: &Address,
    vault_id: VaultId,
    amount: U256,
) -> StateResult<()> {
    if caller != from && !state.is_approved(from, caller) {
        return Err(StateError::NotApproved { owner: *from, operator: *caller });
    }
    burn_position(state, from, vault_id, amount)?;
    let credited = state.position(to, vault_id) + amount;
    state.set_position(to, vault_id, credited);
    Ok(())
}

/// Execute a TransferPosition call.
pub fn execute_transfer_position<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    from: &Address,
    to: &Address,
    vault_id: VaultId,
    amount: U256,
) -> StateResult<()> {
    if amount.is_zero() {
        return Err(StateError::ZeroAmount);
    }
    move_position(state, &ctx.caller, from, to, vault_id, amount)
}
