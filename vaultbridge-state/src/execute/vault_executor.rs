//! Vault executor.
//!
//! The executor lives on the destination chain. It owns every vault share
//! the protocol issues positions against, and its own custody record is the
//! only thing consulted when shares are redeemed. Remote claims about vault
//! ids or amounts are never trusted on their own.

use std::collections::BTreeMap;

use tracing::{info, warn};
use vaultbridge_core::crypto::short_address;
use vaultbridge_core::{
    vault_chain, Address, CrossChainMessage, LiquidityTransfer, Payload, PayloadKind, UnderlyingVault,
    VaultId, U256,
};

use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::state::{FailedDeposit, StateReader, StateWriter};

use super::access::require_admin;
use super::context::ExecutionContext;
use super::funds::{transfer_native, transfer_token};
use super::transport::dispatch;

/// Execute an AddVault call.
pub fn execute_add_vault<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    vault_ids: &[VaultId],
    vaults: &[Address],
) -> StateResult<()> {
    require_admin(state, &ctx.caller)?;
    if vault_ids.is_empty() || vault_ids.len() != vaults.len() {
        return Err(StateError::ArityMismatch { expected: vault_ids.len(), actual: vaults.len() });
    }
    let local = state.config().chain_id;
    for (vault_id, vault) in vault_ids.iter().zip(vaults) {
        if vault_chain(*vault_id) != local {
            return Err(StateError::VaultChainMismatch { vault_id: *vault_id, chain: local });
        }
        if state.executor_vault(*vault_id).is_some() {
            return Err(StateError::VaultAlreadyRegistered { vault_id: *vault_id });
        }
        if state.get_vault(vault).is_none() {
            return Err(StateError::VaultNotDeployed { address: *vault });
        }
        state.map_executor_vault(*vault_id, *vault);
        state.emit(Event::VaultAdded { vault_id: *vault_id, vault: *vault });
    }
    Ok(())
}

/// Execute a SetSrcTokenDistributor call.
///
/// One ledger per chain; a later call replaces the earlier one.
pub fn execute_set_src_token_distributor<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    ledger: &Address,
    chain: u64,
) -> StateResult<()> {
    require_admin(state, &ctx.caller)?;
    state.set_src_distributor(chain, *ledger);
    Ok(())
}

/// Assets `shares` of `vault_id` would redeem for.
pub fn preview_redeem<S: StateReader>(state: &mut S, vault_id: VaultId, shares: U256) -> StateResult<U256> {
    let address = state
        .executor_vault(vault_id)
        .ok_or(StateError::VaultNotFound { vault_id })?;
    let vault = state
        .get_vault(&address)
        .ok_or(StateError::VaultNotDeployed { address })?;
    Ok(vault.preview_redeem(shares))
}

/// Asset accepted by a mapped vault.
pub(crate) fn vault_asset<S: StateReader>(state: &mut S, vault_id: VaultId) -> StateResult<(Address, Address)> {
    let address = state
        .executor_vault(vault_id)
        .ok_or(StateError::VaultNotFound { vault_id })?;
    let vault = state
        .get_vault(&address)
        .ok_or(StateError::VaultNotDeployed { address })?;
    Ok((address, vault.asset()))
}

/// Deposit `assets` held by `executor` into `vault_id`, adding the minted
/// shares to custody.
///
/// A vault rejection surfaces as [`StateError::Vault`] with nothing moved.
pub(crate) fn deposit_into_vault<S: StateWriter>(
    state: &mut S,
    executor: &Address,
    vault_id: VaultId,
    assets: U256,
) -> StateResult<U256> {
    let (address, asset) = vault_asset(state, vault_id)?;
    let mut vault = state
        .get_vault(&address)
        .cloned()
        .ok_or(StateError::VaultNotDeployed { address })?;
    let shares = vault
        .deposit(assets)
        .map_err(|source| StateError::Vault { vault_id, source })?;

    transfer_token(state, &asset, executor, &address, assets)?;
    state.update_vault(&address, |v| *v = vault);
    let custody = state.custodied_shares(vault_id) + shares;
    state.set_custodied_shares(vault_id, custody);
    Ok(shares)
}

/// Redeem `shares` of `vault_id` from executor custody. Assets land with
/// the executor.
pub(crate) fn redeem_from_vault<S: StateWriter>(
    state: &mut S,
    executor: &Address,
    vault_id: VaultId,
    shares: U256,
) -> StateResult<(Address, U256)> {
    let custodied = state.custodied_shares(vault_id);
    if custodied < shares {
        return Err(StateError::InsufficientVaultShares { vault_id, custodied, requested: shares });
    }
    let (address, asset) = vault_asset(state, vault_id)?;
    let mut vault = state
        .get_vault(&address)
        .cloned()
        .ok_or(StateError::VaultNotDeployed { address })?;
    let assets = vault
        .redeem(shares)
        .map_err(|source| StateError::Vault { vault_id, source })?;

    transfer_token(state, &asset, &address, executor, assets)?;
    state.update_vault(&address, |v| *v = vault);
    state.set_custodied_shares(vault_id, custodied - shares);
    Ok((asset, assets))
}

/// Same-chain redemption: redeem and hand the assets to `recipient`.
pub(crate) fn withdraw_local<S: StateWriter>(
    state: &mut S,
    executor: &Address,
    vault_id: VaultId,
    shares: U256,
    recipient: &Address,
) -> StateResult<U256> {
    let (asset, assets) = redeem_from_vault(state, executor, vault_id, shares)?;
    transfer_token(state, &asset, executor, recipient, assets)?;
    Ok(assets)
}

/// Reject payloads whose ledger is not the registered source for their chain.
fn check_source_ledger<S: StateReader>(state: &mut S, payload: &Payload) -> StateResult<()> {
    match state.src_distributor(payload.src_chain) {
        Some(ledger) if ledger == payload.origin_ledger => Ok(()),
        _ => Err(StateError::UnknownSourceLedger {
            chain: payload.src_chain,
            ledger: payload.origin_ledger,
        }),
    }
}

/// Fail with `BridgeTokensPending` unless the executor holds enough of every
/// vault asset to cover `amounts`. Assets held back for unfinalized rescues
/// do not count.
pub(crate) fn check_funds_arrived<S: StateReader>(
    state: &mut S,
    executor: &Address,
    payload: &Payload,
    amounts: &[U256],
) -> StateResult<()> {
    let mut needed: BTreeMap<Address, U256> = BTreeMap::new();
    for (vault_id, amount) in payload.vault_ids.iter().zip(amounts) {
        let (_, asset) = vault_asset(state, *vault_id)?;
        let entry = needed.entry(asset).or_default();
        *entry = *entry + *amount;
    }
    for (asset, required) in needed {
        let held = state.token_balance(&asset, executor);
        let available = held.saturating_sub(state.rescue_reserved(&asset));
        if available < required {
            return Err(StateError::BridgeTokensPending {
                payload_id: payload.id,
                asset,
                required,
                available,
            });
        }
    }
    Ok(())
}

/// Settle a reconciled DEPOSIT payload.
///
/// Each element is deposited into its vault. Elements a vault rejects stay
/// with the executor and are recorded for rescue. Minted shares are reported
/// to the origin ledger with one RETURN, paid from the executor's native
/// balance.
pub(crate) fn execute_xchain_deposit<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    executor: &Address,
    payload: &Payload,
) -> StateResult<Vec<U256>> {
    check_source_ledger(state, payload)?;
    let amounts = payload.settled_amounts().to_vec();
    check_funds_arrived(state, executor, payload, &amounts)?;

    let mut minted_vaults = Vec::new();
    let mut minted_shares = Vec::new();
    let mut failed = FailedDeposit {
        payload_id: payload.id,
        user: payload.user,
        vault_ids: Vec::new(),
        amounts: Vec::new(),
        assets: Vec::new(),
        proposal: None,
        finalized: false,
    };

    for (vault_id, amount) in payload.vault_ids.iter().zip(&amounts) {
        match deposit_into_vault(state, executor, *vault_id, *amount) {
            Ok(shares) => {
                minted_vaults.push(*vault_id);
                minted_shares.push(shares);
            }
            Err(StateError::Vault { source, .. }) => {
                warn!(payload_id = payload.id, vault_id, error = %source, "vault rejected deposit");
                let (_, asset) = vault_asset(state, *vault_id)?;
                failed.vault_ids.push(*vault_id);
                failed.amounts.push(*amount);
                failed.assets.push(asset);
            }
            Err(e) => return Err(e),
        }
    }

    if !failed.vault_ids.is_empty() {
        state.emit(Event::FailedDeposits {
            payload_id: payload.id,
            vault_ids: failed.vault_ids.clone(),
            amounts: failed.amounts.clone(),
        });
        state.insert_failed_deposit(failed);
    }

    if !minted_vaults.is_empty() {
        let local = state.config().chain_id;
        let message = CrossChainMessage {
            kind: PayloadKind::Return,
            src_chain: local,
            dst_chain: payload.src_chain,
            origin_payload_id: 0,
            origin_ledger: payload.origin_ledger,
            user: payload.user,
            tx_id: payload.tx_id,
            amounts: minted_shares.clone(),
            max_slippage_bps: vec![0; minted_vaults.len()],
            vault_ids: minted_vaults,
            aux_flag: payload.aux_flag,
            liquidity_transfer: None,
            route_out: None,
        };
        let return_id = dispatch(state, ctx, executor, executor, message, U256::zero())?;
        info!(payload_id = payload.id, return_id, "deposit settled, return dispatched");
    }

    Ok(minted_shares)
}

/// Settle a WITHDRAW payload: redeem from custody and route the assets back
/// to the user's chain.
///
/// A non-empty `aux_data` replaces the route bytes the user supplied.
pub(crate) fn execute_xchain_withdraw<S: StateWriter>(
    state: &mut S,
    executor: &Address,
    payload: &Payload,
    aux_data: &[u8],
) -> StateResult<Vec<U256>> {
    check_source_ledger(state, payload)?;
    let route = payload.route_out.clone().ok_or_else(|| StateError::MalformedMessage {
        reason: "withdraw without route".into(),
    })?;
    let bridge = state
        .bridge(route.transport_id)
        .ok_or(StateError::BridgeNotRegistered { transport_id: route.transport_id })?;
    let route_bytes = if aux_data.is_empty() { route.tx_data.clone() } else { aux_data.to_vec() };
    let local = state.config().chain_id;

    transfer_native(state, executor, &bridge, route.native_amount)?;

    let mut redeemed = Vec::with_capacity(payload.vault_ids.len());
    for (index, (vault_id, shares)) in payload.vault_ids.iter().zip(payload.settled_amounts()).enumerate() {
        let (asset, assets) = redeem_from_vault(state, executor, *vault_id, *shares)?;
        transfer_token(state, &asset, executor, &bridge, assets)?;
        let transfer_id = state.next_transfer_id();
        state.push_liquidity(LiquidityTransfer {
            transfer_id,
            src_chain: local,
            dst_chain: payload.src_chain,
            transport_id: route.transport_id,
            endpoint: bridge,
            sender: *executor,
            asset,
            amount: assets,
            route: route_bytes.clone(),
            native_amount: if index == 0 { route.native_amount } else { U256::zero() },
        });
        redeemed.push(assets);
    }

    state.emit(Event::WithdrawRouted {
        payload_id: payload.id,
        user: payload.user,
        assets: redeemed.clone(),
    });
    info!(payload_id = payload.id, user = %short_address(&payload.user), "withdrawal routed");
    Ok(redeemed)
}
