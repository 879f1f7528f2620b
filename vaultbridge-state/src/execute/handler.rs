//! State handler: inbound messages, reconciliation and processing.
//!
//! Inbound DEPOSIT payloads wait for the payload operator to report the
//! amounts that actually arrived (`update_state`), then are executed
//! (`process_payload`). WITHDRAW and RETURN payloads carry no liquidity of
//! their own and are recorded as reconciled on arrival.

use tracing::{info, warn};
use vaultbridge_core::crypto::short_address;
use vaultbridge_core::{
    Address, ChainId, CrossChainMessage, Payload, PayloadId, PayloadKind, PayloadStatus, Role, U256,
};

use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::state::{ControllerKind, StateReader, StateWriter};

use super::access::require_role;
use super::context::ExecutionContext;
use super::ledger::state_sync;
use super::vault_executor::{check_funds_arrived, execute_xchain_deposit, execute_xchain_withdraw};

/// Check one reported amount against its declared amount and bound.
///
/// Valid iff `declared * (10000 - bound) / 10000 <= actual <= declared`,
/// with floor division.
pub fn validate_slippage(
    index: usize,
    declared: U256,
    actual: U256,
    bound_bps: u16,
) -> StateResult<()> {
    if actual > declared {
        return Err(StateError::NegativeSlippage { index, declared, actual });
    }
    let minimum = declared.min_after_slippage(bound_bps);
    if actual < minimum {
        return Err(StateError::SlippageOutOfBounds { index, actual, minimum });
    }
    Ok(())
}

/// Boolean form of [`validate_slippage`].
pub fn is_within_slippage(declared: U256, actual: U256, bound_bps: u16) -> bool {
    validate_slippage(0, declared, actual, bound_bps).is_ok()
}

/// Execute a Receive call.
///
/// Caller and sender are authenticated before the bytes are decoded or
/// anything is stored.
pub fn execute_receive<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    src_chain: ChainId,
    sender: &Address,
    bytes: &[u8],
) -> StateResult<PayloadId> {
    let (local, endpoint) = {
        let config = state.config();
        (config.chain_id, config.transport_endpoint)
    };
    if ctx.caller != endpoint {
        return Err(StateError::Unauthorized { caller: ctx.caller, expected: endpoint });
    }
    if state.trusted_remote(src_chain) != Some(*sender) {
        warn!(src_chain, sender = %short_address(sender), "message from untrusted remote");
        return Err(StateError::UntrustedRemote { src_chain, sender: *sender });
    }

    let message = CrossChainMessage::decode(bytes)
        .map_err(|e| StateError::MalformedMessage { reason: e.to_string() })?;
    if message.dst_chain != local {
        return Err(StateError::WrongDestination { expected: local, actual: message.dst_chain });
    }
    if message.src_chain != src_chain {
        return Err(StateError::WrongDestination { expected: src_chain, actual: message.src_chain });
    }
    let n = message.vault_ids.len();
    if n == 0 || message.amounts.len() != n || message.max_slippage_bps.len() != n {
        return Err(StateError::ArityMismatch { expected: n, actual: message.amounts.len() });
    }
    if message.kind == PayloadKind::Withdraw && message.route_out.is_none() {
        return Err(StateError::MalformedMessage { reason: "withdraw without route".into() });
    }
    if state.was_received(src_chain, message.origin_payload_id) {
        return Err(StateError::DuplicateMessage {
            src_chain,
            origin_payload_id: message.origin_payload_id,
        });
    }

    let (status, actual_amounts) = match message.kind {
        PayloadKind::Deposit => (PayloadStatus::AwaitingReconciliation, None),
        PayloadKind::Withdraw | PayloadKind::Return => {
            (PayloadStatus::Reconciled, Some(message.amounts.clone()))
        }
    };

    let payload_id = state.next_payload_id();
    state.mark_received(src_chain, message.origin_payload_id);
    state.insert_payload(Payload {
        id: payload_id,
        kind: message.kind,
        src_chain,
        dst_chain: local,
        origin_payload_id: message.origin_payload_id,
        origin_ledger: message.origin_ledger,
        user: message.user,
        tx_id: message.tx_id,
        declared_amounts: message.amounts,
        actual_amounts,
        vault_ids: message.vault_ids,
        max_slippage_bps: message.max_slippage_bps,
        aux_flag: message.aux_flag,
        liquidity_transfer: message.liquidity_transfer,
        route_out: message.route_out,
        status,
        created_at: ctx.timestamp,
    });
    state.emit(Event::PayloadReceived { payload_id, src_chain, kind: message.kind });
    info!(payload_id, src_chain, kind = ?message.kind, "payload received");
    Ok(payload_id)
}

/// Execute an UpdateState call: fix the actual amounts of a DEPOSIT.
///
/// The payload becomes `Reconciled` if the executor already holds the
/// funds, `PendingTransport` otherwise.
pub fn execute_update_state<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    payload_id: PayloadId,
    actual_amounts: &[U256],
) -> StateResult<PayloadStatus> {
    require_role(state, &ctx.caller, Role::PayloadOperator)?;
    let payload = state
        .get_payload(payload_id)
        .cloned()
        .ok_or(StateError::PayloadNotFound { payload_id })?;

    if payload.kind != PayloadKind::Deposit {
        return Err(StateError::InvalidPayloadKind { payload_id, kind: payload.kind });
    }
    if payload.status != PayloadStatus::AwaitingReconciliation {
        return Err(StateError::PayloadAlreadyUpdated { payload_id, status: payload.status });
    }
    if actual_amounts.len() != payload.declared_amounts.len() {
        return Err(StateError::ArityMismatch {
            expected: payload.declared_amounts.len(),
            actual: actual_amounts.len(),
        });
    }
    for (index, ((declared, actual), bound)) in payload
        .declared_amounts
        .iter()
        .zip(actual_amounts)
        .zip(&payload.max_slippage_bps)
        .enumerate()
    {
        validate_slippage(index, *declared, *actual, *bound)?;
    }

    let status = if funds_present(state, &payload, actual_amounts) {
        PayloadStatus::Reconciled
    } else {
        PayloadStatus::PendingTransport
    };
    let actual = actual_amounts.to_vec();
    state.update_payload(payload_id, |p| {
        p.actual_amounts = Some(actual);
        p.status = status;
    });
    state.emit(Event::PayloadUpdated {
        payload_id,
        pending_transport: status == PayloadStatus::PendingTransport,
    });
    info!(payload_id, ?status, "payload updated");
    Ok(status)
}

fn funds_present<S: StateReader>(state: &mut S, payload: &Payload, amounts: &[U256]) -> bool {
    match state.controller(ControllerKind::Executor) {
        Some(executor) => check_funds_arrived(state, &executor, payload, amounts).is_ok(),
        None => false,
    }
}

/// Execute a ProcessPayload call.
///
/// Checks run in order: role, existence, replay, reconciliation. The
/// payload is handed to its controller and marked `Processed` only if the
/// controller succeeds.
pub fn execute_process_payload<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    payload_id: PayloadId,
    aux_data: &[u8],
) -> StateResult<Vec<U256>> {
    require_role(state, &ctx.caller, Role::PayloadOperator)?;
    let payload = state
        .get_payload(payload_id)
        .cloned()
        .ok_or(StateError::PayloadNotFound { payload_id })?;
    if payload.is_processed() {
        return Err(StateError::AlreadyProcessed { payload_id });
    }
    if !payload.status.is_reconciled() {
        return Err(StateError::NotReconciled { payload_id });
    }

    let kind = ControllerKind::for_payload(payload.kind);
    let controller = state
        .controller(kind)
        .ok_or(StateError::ControllerNotRegistered { kind })?;

    let amounts = match payload.kind {
        PayloadKind::Deposit => {
            execute_xchain_deposit(state, &ctx.as_caller(controller), &controller, &payload)?
        }
        PayloadKind::Withdraw => execute_xchain_withdraw(state, &controller, &payload, aux_data)?,
        PayloadKind::Return => {
            let handler = state.config().handler;
            state_sync(
                state,
                &handler,
                payload.tx_id,
                payload.src_chain,
                &payload.vault_ids,
                &payload.declared_amounts,
            )?;
            payload.declared_amounts.clone()
        }
    };

    state.update_payload(payload_id, |p| p.status = PayloadStatus::Processed);
    state.emit(Event::PayloadProcessed { payload_id });
    info!(payload_id, kind = ?payload.kind, "payload processed");
    Ok(amounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::call::Call;
    use crate::execute::testutil::*;
    use crate::state::ChainState;

    fn delivered_deposit(amounts: &[u64], bound_bps: u16) -> (ChainState, ChainState, PayloadId) {
        let (mut home, mut remote) = pair();
        call_with_value(&mut home, USER, 1_000_000, deposit_call(HOME, REMOTE, amounts, bound_bps)).unwrap();
        let payload_id = relay(&mut home, &mut remote).remove(0).unwrap();
        (home, remote, payload_id)
    }

    #[test]
    fn test_slippage_bounds() {
        let declared = U256::from(1000u64);
        for actual in [900u64, 950, 1000] {
            assert!(validate_slippage(0, declared, U256::from(actual), 1000).is_ok());
        }
        assert!(matches!(
            validate_slippage(0, declared, U256::from(899u64), 1000),
            Err(StateError::SlippageOutOfBounds { .. })
        ));
        assert!(matches!(
            validate_slippage(0, declared, U256::from(800u64), 1000),
            Err(StateError::SlippageOutOfBounds { .. })
        ));
        assert!(matches!(
            validate_slippage(3, declared, U256::from(1001u64), 1000),
            Err(StateError::NegativeSlippage { index: 3, .. })
        ));
        assert!(is_within_slippage(declared, declared, 0));
        assert!(!is_within_slippage(declared, U256::from(999u64), 0));
        assert!(is_within_slippage(declared, U256::zero(), 10_000));
    }

    #[test]
    fn test_receive_records_deposit_awaiting() {
        let (_, mut remote, payload_id) = delivered_deposit(&[500], 100);
        let payload = remote.get_payload(payload_id).unwrap().clone();
        assert_eq!(payload.kind, PayloadKind::Deposit);
        assert_eq!(payload.status, PayloadStatus::AwaitingReconciliation);
        assert_eq!(payload.src_chain, HOME);
        assert_eq!(payload.declared_amounts, vec![U256::from(500u64)]);
        assert!(payload.actual_amounts.is_none());
        assert!(remote.events.iter().any(|e| matches!(e, Event::PayloadReceived { .. })));
    }

    #[test]
    fn test_receive_rejects_untrusted_before_storage() {
        let (mut home, mut remote) = pair();
        call_with_value(&mut home, USER, 1_000_000, deposit_call(HOME, REMOTE, &[500], 100)).unwrap();
        let message = home.drain_outbox().remove(0);
        let endpoint = remote.config.transport_endpoint;

        let forged = Call::Receive { src_chain: HOME, sender: [0xEE; 20], bytes: message.bytes.clone() };
        let err = call(&mut remote, endpoint, forged).unwrap_err();
        assert!(matches!(err, StateError::UntrustedRemote { .. }));

        let garbage = Call::Receive { src_chain: HOME, sender: [0xEE; 20], bytes: vec![1, 2, 3] };
        let err = call(&mut remote, endpoint, garbage).unwrap_err();
        assert!(matches!(err, StateError::UntrustedRemote { .. }));

        let wrong_caller = Call::Receive { src_chain: HOME, sender: message.sender, bytes: message.bytes };
        let err = call(&mut remote, USER, wrong_caller).unwrap_err();
        assert!(matches!(err, StateError::Unauthorized { .. }));
        assert_eq!(remote.payload_count(), 0);
    }

    #[test]
    fn test_duplicate_delivery_rejected() {
        let (mut home, mut remote) = pair();
        call_with_value(&mut home, USER, 1_000_000, deposit_call(HOME, REMOTE, &[500], 100)).unwrap();
        let message = home.drain_outbox().remove(0);
        let endpoint = remote.config.transport_endpoint;
        let receive = Call::Receive { src_chain: HOME, sender: message.sender, bytes: message.bytes };

        call(&mut remote, endpoint, receive.clone()).unwrap();
        let err = call(&mut remote, endpoint, receive).unwrap_err();
        assert!(matches!(err, StateError::DuplicateMessage { src_chain: HOME, .. }));
        assert_eq!(remote.payload_count(), 1);
    }

    #[test]
    fn test_update_state_requires_operator() {
        let (_, mut remote, payload_id) = delivered_deposit(&[500], 100);
        let update = Call::UpdateState { payload_id, actual_amounts: vec![U256::from(500u64)] };
        let err = call(&mut remote, USER, update).unwrap_err();
        assert_eq!(err, StateError::MissingRole { account: USER, role: Role::PayloadOperator });
        assert_eq!(
            remote.get_payload(payload_id).unwrap().status,
            PayloadStatus::AwaitingReconciliation
        );
    }

    #[test]
    fn test_update_state_pending_then_reconciled() {
        let (mut home, mut remote, payload_id) = delivered_deposit(&[500], 100);
        let update = Call::UpdateState { payload_id, actual_amounts: vec![U256::from(495u64)] };
        call(&mut remote, OPERATOR, update.clone()).unwrap();
        let payload = remote.get_payload(payload_id).unwrap().clone();
        assert_eq!(payload.status, PayloadStatus::PendingTransport);
        assert_eq!(payload.actual_amounts, Some(vec![U256::from(495u64)]));

        let err = call(&mut remote, OPERATOR, update).unwrap_err();
        assert!(matches!(err, StateError::PayloadAlreadyUpdated { .. }));

        // Funds present at update time reconcile directly.
        settle(&mut home, &mut remote);
        call_with_value(&mut home, USER, 1_000_000, deposit_call(HOME, REMOTE, &[300], 100)).unwrap();
        settle(&mut home, &mut remote);
        let second = relay(&mut home, &mut remote).remove(0).unwrap();
        let update = Call::UpdateState { payload_id: second, actual_amounts: vec![U256::from(300u64)] };
        call(&mut remote, OPERATOR, update).unwrap();
        assert_eq!(remote.get_payload(second).unwrap().status, PayloadStatus::Reconciled);
    }

    #[test]
    fn test_update_state_enforces_slippage_and_arity() {
        let (_, mut remote, payload_id) = delivered_deposit(&[1000, 1000], 1000);
        let err = call(
            &mut remote,
            OPERATOR,
            Call::UpdateState { payload_id, actual_amounts: vec![U256::from(1000u64)] },
        )
        .unwrap_err();
        assert!(matches!(err, StateError::ArityMismatch { expected: 2, actual: 1 }));

        let err = call(
            &mut remote,
            OPERATOR,
            Call::UpdateState {
                payload_id,
                actual_amounts: vec![U256::from(950u64), U256::from(800u64)],
            },
        )
        .unwrap_err();
        assert!(matches!(err, StateError::SlippageOutOfBounds { index: 1, .. }));

        let err = call(
            &mut remote,
            OPERATOR,
            Call::UpdateState {
                payload_id,
                actual_amounts: vec![U256::from(1001u64), U256::from(1000u64)],
            },
        )
        .unwrap_err();
        assert!(matches!(err, StateError::NegativeSlippage { index: 0, .. }));

        call(
            &mut remote,
            OPERATOR,
            Call::UpdateState {
                payload_id,
                actual_amounts: vec![U256::from(900u64), U256::from(1000u64)],
            },
        )
        .unwrap();
    }

    #[test]
    fn test_process_payload_lifecycle_guards() {
        let (mut home, mut remote, payload_id) = delivered_deposit(&[500], 100);
        let process = Call::ProcessPayload { payload_id, aux_data: vec![] };

        let err = call(&mut remote, OPERATOR, process.clone()).unwrap_err();
        assert_eq!(err, StateError::NotReconciled { payload_id });
        let err = call(&mut remote, OPERATOR, Call::ProcessPayload { payload_id: 99, aux_data: vec![] })
            .unwrap_err();
        assert_eq!(err, StateError::PayloadNotFound { payload_id: 99 });

        settle(&mut home, &mut remote);
        call(&mut remote, OPERATOR, Call::UpdateState { payload_id, actual_amounts: vec![U256::from(500u64)] })
            .unwrap();
        let err = call(&mut remote, USER, process.clone()).unwrap_err();
        assert!(matches!(err, StateError::MissingRole { .. }));

        let receipt = call(&mut remote, OPERATOR, process.clone()).unwrap();
        assert_eq!(receipt.amounts, vec![U256::from(500u64)]);
        assert!(remote.get_payload(payload_id).unwrap().is_processed());

        let err = call(&mut remote, OPERATOR, process).unwrap_err();
        assert_eq!(err, StateError::AlreadyProcessed { payload_id });
    }

    #[test]
    fn test_update_state_rejects_non_deposit() {
        let (mut home, mut remote) = pair();
        settled_deposit(&mut home, &mut remote, 500);
        call_with_value(&mut home, USER, 1_000_000, withdraw_call(HOME, REMOTE, 100)).unwrap();
        let payload_id = relay(&mut home, &mut remote).remove(0).unwrap();
        assert_eq!(remote.get_payload(payload_id).unwrap().status, PayloadStatus::Reconciled);

        let err = call(
            &mut remote,
            OPERATOR,
            Call::UpdateState { payload_id, actual_amounts: vec![U256::from(100u64)] },
        )
        .unwrap_err();
        assert!(matches!(err, StateError::InvalidPayloadKind { kind: PayloadKind::Withdraw, .. }));
    }
}
