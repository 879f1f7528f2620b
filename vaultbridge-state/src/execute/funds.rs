//! Token and native value movements.

use vaultbridge_core::{Address, U256};

use crate::error::{StateError, StateResult};
use crate::state::StateWriter;

/// Move `amount` of `asset` between holders.
pub(crate) fn transfer_token<S: StateWriter>(
    state: &mut S,
    asset: &Address,
    from: &Address,
    to: &Address,
    amount: U256,
) -> StateResult<()> {
    let available = state.token_balance(asset, from);
    if available < amount {
        return Err(StateError::InsufficientBalance {
            asset: *asset,
            holder: *from,
            available,
            required: amount,
        });
    }
    if from == to || amount.is_zero() {
        return Ok(());
    }
    state.set_token_balance(asset, from, available - amount);
    let credited = state.token_balance(asset, to) + amount;
    state.set_token_balance(asset, to, credited);
    Ok(())
}

/// Move native value between holders.
pub(crate) fn transfer_native<S: StateWriter>(
    state: &mut S,
    from: &Address,
    to: &Address,
    amount: U256,
) -> StateResult<()> {
    let available = state.native_balance(from);
    if available < amount {
        return Err(StateError::InsufficientNative {
            holder: *from,
            available,
            required: amount,
        });
    }
    if from == to || amount.is_zero() {
        return Ok(());
    }
    state.set_native_balance(from, available - amount);
    let credited = state.native_balance(to) + amount;
    state.set_native_balance(to, credited);
    Ok(())
}

/// Execute a TransferToken call.
pub fn execute_transfer_token<S: StateWriter>(
    state: &mut S,
    caller: &Address,
    asset: &Address,
    to: &Address,
    amount: U256,
) -> StateResult<()> {
    if amount.is_zero() {
        return Err(StateError::ZeroAmount);
    }
    transfer_token(state, asset, caller, to, amount)
}
