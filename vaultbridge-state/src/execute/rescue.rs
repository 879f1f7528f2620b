//! Failed-deposit rescue.
//!
//! When a vault rejects part of a deposit, the assets stay with the
//! executor. The payload operator proposes how much to hand back; the
//! depositor or the administrator can dispute the proposal until the rescue
//! delay has passed, after which anyone can finalize it.

use tracing::info;
use vaultbridge_core::{PayloadId, Role, U256};

use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::state::{ControllerKind, FailedDeposit, RescueProposal, StateWriter};

use super::access::require_role;
use super::context::ExecutionContext;
use super::funds::transfer_token;

fn load<S: StateWriter>(state: &mut S, payload_id: PayloadId) -> StateResult<FailedDeposit> {
    let record = state
        .get_failed_deposit(payload_id)
        .cloned()
        .ok_or(StateError::NoFailedDeposit { payload_id })?;
    if record.finalized {
        return Err(StateError::RescueAlreadyFinalized { payload_id });
    }
    Ok(record)
}

/// Execute a ProposeRescue call.
pub fn execute_propose_rescue<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    payload_id: PayloadId,
    amounts: &[U256],
) -> StateResult<()> {
    require_role(state, &ctx.caller, Role::PayloadOperator)?;
    let record = load(state, payload_id)?;
    if record.proposal.is_some() {
        return Err(StateError::RescueAlreadyProposed { payload_id });
    }
    if amounts.len() != record.amounts.len()
        || amounts.iter().zip(&record.amounts).any(|(proposed, failed)| proposed > failed)
    {
        return Err(StateError::InvalidRescueData { payload_id });
    }

    let proposal = RescueProposal { amounts: amounts.to_vec(), proposed_at: ctx.timestamp };
    state.update_failed_deposit(payload_id, |r| r.proposal = Some(proposal));
    state.emit(Event::RescueProposed { payload_id, amounts: amounts.to_vec() });
    info!(payload_id, "rescue proposed");
    Ok(())
}

/// Execute a DisputeRescue call. Clears the proposal.
pub fn execute_dispute_rescue<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    payload_id: PayloadId,
) -> StateResult<()> {
    let record = load(state, payload_id)?;
    let admin = state.config().admin;
    if ctx.caller != record.user && ctx.caller != admin {
        return Err(StateError::NotValidDisputer { caller: ctx.caller });
    }
    let proposal = record.proposal.ok_or(StateError::NoRescueProposed { payload_id })?;
    let delay = state.config().rescue_delay;
    if ctx.timestamp >= proposal.proposed_at + delay {
        return Err(StateError::DisputeWindowElapsed { payload_id });
    }

    state.update_failed_deposit(payload_id, |r| r.proposal = None);
    state.emit(Event::RescueDisputed { payload_id, by: ctx.caller });
    info!(payload_id, "rescue disputed");
    Ok(())
}

/// Execute a FinalizeRescue call: pay the proposed amounts to the depositor
/// on this chain.
pub fn execute_finalize_rescue<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    payload_id: PayloadId,
) -> StateResult<Vec<U256>> {
    let record = load(state, payload_id)?;
    let proposal = record.proposal.clone().ok_or(StateError::NoRescueProposed { payload_id })?;
    let unlocks_at = proposal.proposed_at + state.config().rescue_delay;
    if ctx.timestamp < unlocks_at {
        return Err(StateError::RescueLocked { payload_id, unlocks_at });
    }
    let executor = state
        .controller(ControllerKind::Executor)
        .ok_or(StateError::ControllerNotRegistered { kind: ControllerKind::Executor })?;

    for (asset, amount) in record.assets.iter().zip(&proposal.amounts) {
        transfer_token(state, asset, &executor, &record.user, *amount)?;
    }
    state.update_failed_deposit(payload_id, |r| r.finalized = true);
    state.emit(Event::RescueFinalized { payload_id, user: record.user });
    info!(payload_id, "rescue finalized");
    Ok(proposal.amounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::call::Call;
    use crate::execute::testutil::*;
    use crate::state::{ChainState, StateReader};

    /// Remote chain holding a failed 300-unit element of payload 1.
    fn failed_deposit() -> (ChainState, PayloadId) {
        let (_, remote, payload_id) = failed_deposit_pair();
        (remote, payload_id)
    }

    fn failed_deposit_pair() -> (ChainState, ChainState, PayloadId) {
        let (mut home, mut remote) = pair();
        call_with_value(&mut home, USER, 1_000_000, deposit_call(HOME, REMOTE, &[500, 300], 100)).unwrap();
        settle(&mut home, &mut remote);
        let payload_id = relay(&mut home, &mut remote).remove(0).unwrap();
        let actual_amounts = vec![U256::from(500u64), U256::from(300u64)];
        call(&mut remote, OPERATOR, Call::UpdateState { payload_id, actual_amounts }).unwrap();
        remote.vaults.get_mut(&vault_address(REMOTE, 1)).unwrap().paused = true;
        call(&mut remote, OPERATOR, Call::ProcessPayload { payload_id, aux_data: vec![] }).unwrap();
        (home, remote, payload_id)
    }

    #[test]
    fn test_propose_validation() {
        let (mut remote, payload_id) = failed_deposit();
        let propose = |amount: u64| Call::ProposeRescue { payload_id, amounts: vec![U256::from(amount)] };

        assert!(matches!(call(&mut remote, USER, propose(300)), Err(StateError::MissingRole { .. })));
        assert_eq!(
            call(&mut remote, OPERATOR, propose(301)).unwrap_err(),
            StateError::InvalidRescueData { payload_id }
        );
        assert_eq!(
            call(&mut remote, OPERATOR, Call::ProposeRescue { payload_id: 42, amounts: vec![] }).unwrap_err(),
            StateError::NoFailedDeposit { payload_id: 42 }
        );
        call(&mut remote, OPERATOR, propose(300)).unwrap();
        assert_eq!(
            call(&mut remote, OPERATOR, propose(300)).unwrap_err(),
            StateError::RescueAlreadyProposed { payload_id }
        );
    }

    #[test]
    fn test_dispute_clears_proposal() {
        let (mut remote, payload_id) = failed_deposit();
        call(&mut remote, OPERATOR, Call::ProposeRescue { payload_id, amounts: vec![U256::from(300u64)] }).unwrap();

        let stranger = [0x66; 20];
        assert_eq!(
            call(&mut remote, stranger, Call::DisputeRescue { payload_id }).unwrap_err(),
            StateError::NotValidDisputer { caller: stranger }
        );
        call_at(&mut remote, USER, TS + 5, Call::DisputeRescue { payload_id }).unwrap();
        assert!(remote.get_failed_deposit(payload_id).unwrap().proposal.is_none());
        assert_eq!(
            call(&mut remote, USER, Call::DisputeRescue { payload_id }).unwrap_err(),
            StateError::NoRescueProposed { payload_id }
        );
    }

    #[test]
    fn test_finalize_after_delay() {
        let (mut remote, payload_id) = failed_deposit();
        let delay = remote.config.rescue_delay;
        call(&mut remote, OPERATOR, Call::ProposeRescue { payload_id, amounts: vec![U256::from(300u64)] }).unwrap();

        let finalize = Call::FinalizeRescue { payload_id };
        assert_eq!(
            call_at(&mut remote, USER, TS + delay - 1, finalize.clone()).unwrap_err(),
            StateError::RescueLocked { payload_id, unlocks_at: TS + delay }
        );
        assert_eq!(
            call_at(&mut remote, USER, TS + delay, Call::DisputeRescue { payload_id }).unwrap_err(),
            StateError::DisputeWindowElapsed { payload_id }
        );

        let receipt = call_at(&mut remote, [0x66; 20], TS + delay, finalize.clone()).unwrap();
        assert_eq!(receipt.amounts, vec![U256::from(300u64)]);
        assert_eq!(remote.token_balance(&asset(REMOTE), &USER), U256::from(1_000_300u64));
        assert_eq!(
            call_at(&mut remote, USER, TS + delay, finalize).unwrap_err(),
            StateError::RescueAlreadyFinalized { payload_id }
        );
    }

    #[test]
    fn test_held_assets_not_spent_by_later_payload() {
        let (mut home, mut remote, failed_id) = failed_deposit_pair();
        let executor = remote.config.executor;
        assert_eq!(remote.rescue_reserved(&asset(REMOTE)), U256::from(300u64));

        call_with_value(&mut home, USER, 1_000_000, deposit_call(HOME, REMOTE, &[300], 100)).unwrap();
        let payload_id = relay(&mut home, &mut remote).remove(0).unwrap();
        call(&mut remote, OPERATOR, Call::UpdateState { payload_id, actual_amounts: vec![U256::from(300u64)] })
            .unwrap();
        assert_eq!(remote.token_balance(&asset(REMOTE), &executor), U256::from(300u64));

        let process = Call::ProcessPayload { payload_id, aux_data: vec![] };
        let err = call(&mut remote, OPERATOR, process.clone()).unwrap_err();
        assert!(matches!(err, StateError::BridgeTokensPending { available, .. } if available.is_zero()));

        settle(&mut home, &mut remote);
        call(&mut remote, OPERATOR, process).unwrap();

        let delay = remote.config.rescue_delay;
        call(&mut remote, OPERATOR, Call::ProposeRescue { payload_id: failed_id, amounts: vec![U256::from(300u64)] })
            .unwrap();
        call_at(&mut remote, USER, TS + delay, Call::FinalizeRescue { payload_id: failed_id }).unwrap();
        assert_eq!(remote.token_balance(&asset(REMOTE), &USER), U256::from(1_000_300u64));
        assert_eq!(remote.rescue_reserved(&asset(REMOTE)), U256::zero());
        assert_eq!(remote.token_balance(&asset(REMOTE), &executor), U256::zero());
    }
}
