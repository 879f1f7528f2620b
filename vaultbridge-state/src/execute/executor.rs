//! Call executor - main entry point for state transitions.

use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::state::StateWriter;

use super::access::{
    execute_grant_role, execute_register_controller, execute_revoke_role,
    execute_set_bridge_address, execute_set_fee_schedule, execute_set_trusted_remote,
};
use super::call::{Call, Receipt};
use super::context::ExecutionContext;
use super::funds::{execute_transfer_token, transfer_native};
use super::handler::{execute_process_payload, execute_receive, execute_update_state};
use super::ledger::{
    execute_deposit, execute_set_approval_for_all, execute_transfer_position, execute_withdraw,
    state_sync,
};
use super::rescue::{execute_dispute_rescue, execute_finalize_rescue, execute_propose_rescue};
use super::swap::{execute_process_multi_tx, execute_process_tx};
use super::vault_executor::{execute_add_vault, execute_set_src_token_distributor};
use super::wrapper::{
    execute_register_wrapper, execute_transfer_wrapped, execute_unwrap, execute_wrap,
};

/// Apply a call to a chain's state.
///
/// The call runs against a copy of the state, which replaces the original
/// only on success: a failed call leaves no partial effects.
///
/// # Returns
/// - `Ok(Receipt)` describing what the call produced
/// - `Err(StateError)` if validation or execution failed
pub fn apply_call<S: StateWriter + Clone>(
    state: &mut S,
    ctx: &ExecutionContext,
    call: &Call,
) -> StateResult<Receipt> {
    let mut scratch = state.clone();
    match execute_call(&mut scratch, ctx, call) {
        Ok(receipt) => {
            *state = scratch;
            Ok(receipt)
        }
        Err(e) => {
            debug!(call = call.name(), error = %e, "call rejected");
            Err(e)
        }
    }
}

/// Move attached value to the component that receives it.
fn escrow_value<S: StateWriter>(state: &mut S, ctx: &ExecutionContext, call: &Call) -> StateResult<()> {
    if ctx.value.is_zero() {
        return Ok(());
    }
    let sink = {
        let config = state.config();
        match call {
            Call::Deposit { .. } | Call::Withdraw { .. } => config.ledger,
            Call::Receive { .. } => config.executor,
            Call::TransferNative { to } => *to,
            _ => return Err(StateError::NonPayable),
        }
    };
    transfer_native(state, &ctx.caller, &sink, ctx.value)
}

fn execute_call<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    call: &Call,
) -> StateResult<Receipt> {
    escrow_value(state, ctx, call)?;

    let mut receipt = Receipt::default();
    match call {
        Call::GrantRole { role, account } => execute_grant_role(state, ctx, *role, account)?,
        Call::RevokeRole { role, account } => execute_revoke_role(state, ctx, *role, account)?,
        Call::SetTrustedRemote { chain, remote } => {
            execute_set_trusted_remote(state, ctx, *chain, remote)?
        }
        Call::SetBridgeAddress { transport_id, endpoint } => {
            execute_set_bridge_address(state, ctx, *transport_id, endpoint)?
        }
        Call::SetFeeSchedule { dst_chain, schedule } => {
            execute_set_fee_schedule(state, ctx, *dst_chain, *schedule)?
        }
        Call::RegisterController { kind } => execute_register_controller(state, ctx, *kind)?,

        Call::Deposit { liquidity, states } => {
            receipt = execute_deposit(state, ctx, liquidity, states)?;
        }
        Call::Withdraw { states, liquidity } => {
            receipt = execute_withdraw(state, ctx, states, liquidity)?;
        }
        Call::StateSync { tx_id, src_chain, vault_ids, shares } => {
            state_sync(state, &ctx.caller, *tx_id, *src_chain, vault_ids, shares)?;
            receipt.tx_ids.push(*tx_id);
        }
        Call::SetApprovalForAll { operator, approved } => {
            execute_set_approval_for_all(state, ctx, operator, *approved)?
        }
        Call::TransferPosition { from, to, vault_id, amount } => {
            execute_transfer_position(state, ctx, from, to, *vault_id, *amount)?
        }

        Call::Receive { src_chain, sender, bytes } => {
            let id = execute_receive(state, ctx, *src_chain, sender, bytes)?;
            receipt.payload_ids.push(id);
        }
        Call::UpdateState { payload_id, actual_amounts } => {
            execute_update_state(state, ctx, *payload_id, actual_amounts)?;
            receipt.payload_ids.push(*payload_id);
        }
        Call::ProcessPayload { payload_id, aux_data } => {
            receipt.amounts = execute_process_payload(state, ctx, *payload_id, aux_data)?;
            receipt.payload_ids.push(*payload_id);
        }
        Call::ProposeRescue { payload_id, amounts } => {
            execute_propose_rescue(state, ctx, *payload_id, amounts)?
        }
        Call::DisputeRescue { payload_id } => execute_dispute_rescue(state, ctx, *payload_id)?,
        Call::FinalizeRescue { payload_id } => {
            receipt.amounts = execute_finalize_rescue(state, ctx, *payload_id)?;
        }

        Call::AddVault { vault_ids, vaults } => execute_add_vault(state, ctx, vault_ids, vaults)?,
        Call::SetSrcTokenDistributor { ledger, chain } => {
            execute_set_src_token_distributor(state, ctx, ledger, *chain)?
        }

        Call::ProcessTx { leg } => {
            execute_process_tx(state, ctx, leg)?;
            receipt.amounts.push(leg.amount);
        }
        Call::ProcessMultiTx { legs } => {
            execute_process_multi_tx(state, ctx, legs)?;
            receipt.amounts = legs.iter().map(|leg| leg.amount).collect();
        }

        Call::RegisterWrapper { vault_id, name, symbol } => {
            execute_register_wrapper(state, ctx, *vault_id, name, symbol)?
        }
        Call::Wrap { vault_id, amount } => {
            execute_wrap(state, ctx, *vault_id, *amount)?;
            receipt.amounts.push(*amount);
        }
        Call::Unwrap { vault_id, amount } => {
            execute_unwrap(state, ctx, *vault_id, *amount)?;
            receipt.amounts.push(*amount);
        }
        Call::TransferWrapped { vault_id, to, amount } => {
            execute_transfer_wrapped(state, ctx, *vault_id, to, *amount)?
        }

        Call::TransferToken { asset, to, amount } => {
            execute_transfer_token(state, &ctx.caller, asset, to, *amount)?
        }
        Call::TransferNative { .. } => {}
    }
    Ok(receipt)
}
