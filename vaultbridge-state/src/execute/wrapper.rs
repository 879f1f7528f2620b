//! Position wrapper.
//!
//! Turns a vault position into a fungible token, 1:1. The wrapper holds the
//! wrapped positions in its own ledger account, so the wrapped supply of a
//! vault always equals the wrapper's position in it.

use tracing::info;
use vaultbridge_core::{Address, VaultId, U256};

use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::state::{StateWriter, WrapperToken};

use super::access::require_admin;
use super::context::ExecutionContext;
use super::ledger::move_position;

/// Execute a RegisterWrapper call.
pub fn execute_register_wrapper<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    vault_id: VaultId,
    name: &str,
    symbol: &str,
) -> StateResult<()> {
    require_admin(state, &ctx.caller)?;
    if state.get_wrapper(vault_id).is_some() {
        return Err(StateError::WrapperAlreadyRegistered { vault_id });
    }
    state.insert_wrapper(WrapperToken {
        vault_id,
        name: name.to_string(),
        symbol: symbol.to_string(),
        total_supply: U256::zero(),
    });
    state.emit(Event::WrapperRegistered { vault_id, symbol: symbol.to_string() });
    Ok(())
}

/// Execute a Wrap call. The caller must have approved the wrapper.
pub fn execute_wrap<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    vault_id: VaultId,
    amount: U256,
) -> StateResult<()> {
    if amount.is_zero() {
        return Err(StateError::ZeroAmount);
    }
    if state.get_wrapper(vault_id).is_none() {
        return Err(StateError::WrapperNotFound { vault_id });
    }
    let wrapper = state.config().wrapper;
    move_position(state, &wrapper, &ctx.caller, &wrapper, vault_id, amount)?;

    let balance = state.wrapped_balance(vault_id, &ctx.caller) + amount;
    state.set_wrapped_balance(vault_id, &ctx.caller, balance);
    state.update_wrapper(vault_id, |w| w.total_supply = w.total_supply + amount);
    state.emit(Event::Wrapped { vault_id, owner: ctx.caller, amount });
    info!(vault_id, %amount, "positions wrapped");
    Ok(())
}

/// Execute an Unwrap call.
pub fn execute_unwrap<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    vault_id: VaultId,
    amount: U256,
) -> StateResult<()> {
    if amount.is_zero() {
        return Err(StateError::ZeroAmount);
    }
    if state.get_wrapper(vault_id).is_none() {
        return Err(StateError::WrapperNotFound { vault_id });
    }
    burn_wrapped(state, vault_id, &ctx.caller, amount)?;
    let wrapper = state.config().wrapper;
    move_position(state, &wrapper, &wrapper, &ctx.caller, vault_id, amount)?;
    state.update_wrapper(vault_id, |w| w.total_supply = w.total_supply - amount);
    state.emit(Event::Unwrapped { vault_id, owner: ctx.caller, amount });
    info!(vault_id, %amount, "positions unwrapped");
    Ok(())
}

/// Execute a TransferWrapped call.
pub fn execute_transfer_wrapped<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    vault_id: VaultId,
    to: &Address,
    amount: U256,
) -> StateResult<()> {
    if amount.is_zero() {
        return Err(StateError::ZeroAmount);
    }
    burn_wrapped(state, vault_id, &ctx.caller, amount)?;
    let credited = state.wrapped_balance(vault_id, to) + amount;
    state.set_wrapped_balance(vault_id, to, credited);
    Ok(())
}

fn burn_wrapped<S: StateWriter>(
    state: &mut S,
    vault_id: VaultId,
    holder: &Address,
    amount: U256,
) -> StateResult<()> {
    let held = state.wrapped_balance(vault_id, holder);
    if held < amount {
        return Err(StateError::InsufficientWrapped { vault_id, held, requested: amount });
    }
    state.set_wrapped_balance(vault_id, holder, held - amount);
    Ok(())
}
