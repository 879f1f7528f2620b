//! Multi-leg swap processor.
//!
//! When a deposit needs more than one bridge hop (or a conversion on the
//! destination), the first leg delivers tokens to the processor. The swap
//! operator then sends them onward with a route naming the executor and the
//! vault asset. Arrival of that leg clears `BridgeTokensPending` on the
//! original payload, which is retried, never re-created.

use serde::{Deserialize, Serialize};
use tracing::info;
use vaultbridge_core::{Address, ChainId, LiquidityTransfer, Role, TransportId, U256};

use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::state::StateWriter;

use super::access::require_role;
use super::context::ExecutionContext;
use super::funds::transfer_token;

/// One onward bridge leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapLeg {
    /// Bridge to use.
    pub transport_id: TransportId,
    /// Opaque route bytes for the bridge.
    pub route: Vec<u8>,
    /// Token the processor holds.
    pub source_asset: Address,
    /// Bridge endpoint; must match the registered bridge.
    pub endpoint: Address,
    /// Amount to send.
    pub amount: U256,
    /// Chain the leg delivers on; may be this chain.
    pub dst_chain: ChainId,
}

/// Execute a ProcessTx call.
pub fn execute_process_tx<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    leg: &SwapLeg,
) -> StateResult<u64> {
    require_role(state, &ctx.caller, Role::SwapOperator)?;
    send_leg(state, leg)
}

/// Execute a ProcessMultiTx call.
pub fn execute_process_multi_tx<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    legs: &[SwapLeg],
) -> StateResult<Vec<u64>> {
    require_role(state, &ctx.caller, Role::SwapOperator)?;
    if legs.is_empty() {
        return Err(StateError::ArityMismatch { expected: 1, actual: 0 });
    }
    legs.iter().map(|leg| send_leg(state, leg)).collect()
}

fn send_leg<S: StateWriter>(state: &mut S, leg: &SwapLeg) -> StateResult<u64> {
    if leg.amount.is_zero() {
        return Err(StateError::ZeroAmount);
    }
    let bridge = state
        .bridge(leg.transport_id)
        .ok_or(StateError::BridgeNotRegistered { transport_id: leg.transport_id })?;
    if bridge != leg.endpoint {
        return Err(StateError::InvalidTransportEndpoint { expected: bridge, actual: leg.endpoint });
    }
    let (local, processor) = {
        let config = state.config();
        (config.chain_id, config.swap_processor)
    };

    transfer_token(state, &leg.source_asset, &processor, &bridge, leg.amount)?;
    let transfer_id = state.next_transfer_id();
    state.push_liquidity(LiquidityTransfer {
        transfer_id,
        src_chain: local,
        dst_chain: leg.dst_chain,
        transport_id: leg.transport_id,
        endpoint: bridge,
        sender: processor,
        asset: leg.source_asset,
        amount: leg.amount,
        route: leg.route.clone(),
        native_amount: U256::zero(),
    });
    state.emit(Event::SwapLegSent { transfer_id, dst_chain: leg.dst_chain, amount: leg.amount });
    info!(transfer_id, dst_chain = leg.dst_chain, amount = %leg.amount, "swap leg sent");
    Ok(transfer_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::call::Call;
    use crate::execute::testutil::*;
    use crate::state::StateReader;
    use vaultbridge_core::PayloadStatus;

    fn leg(chain: u64, amount: u64, recipient: Address) -> SwapLeg {
        SwapLeg {
            transport_id: 1,
            route: route_to(recipient, chain),
            source_asset: asset(chain),
            endpoint: bridge(chain),
            amount: U256::from(amount),
            dst_chain: chain,
        }
    }

    #[test]
    fn test_process_tx_requires_swap_operator() {
        let (mut home, _) = pair();
        let processor = home.config.swap_processor;
        home.mint_token(&asset(HOME), &processor, U256::from(100u64));
        let err = call(&mut home, USER, Call::ProcessTx { leg: leg(HOME, 100, USER) }).unwrap_err();
        assert_eq!(err, StateError::MissingRole { account: USER, role: Role::SwapOperator });

        let err = call(&mut home, OPERATOR, Call::ProcessMultiTx { legs: vec![] }).unwrap_err();
        assert!(matches!(err, StateError::ArityMismatch { .. }));
    }

    #[test]
    fn test_leg_validation() {
        let (mut home, _) = pair();
        let processor = home.config.swap_processor;
        home.mint_token(&asset(HOME), &processor, U256::from(100u64));

        let mut bad = leg(HOME, 100, USER);
        bad.endpoint = [0x12; 20];
        assert!(matches!(
            call(&mut home, OPERATOR, Call::ProcessTx { leg: bad }),
            Err(StateError::InvalidTransportEndpoint { .. })
        ));
        let mut bad = leg(HOME, 100, USER);
        bad.transport_id = 9;
        assert_eq!(
            call(&mut home, OPERATOR, Call::ProcessTx { leg: bad }).unwrap_err(),
            StateError::BridgeNotRegistered { transport_id: 9 }
        );
        assert_eq!(
            call(&mut home, OPERATOR, Call::ProcessTx { leg: leg(HOME, 0, USER) }).unwrap_err(),
            StateError::ZeroAmount
        );
        assert!(matches!(
            call(&mut home, OPERATOR, Call::ProcessTx { leg: leg(HOME, 101, USER) }),
            Err(StateError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_multi_leg_all_or_nothing() {
        let (mut home, _) = pair();
        let processor = home.config.swap_processor;
        home.mint_token(&asset(HOME), &processor, U256::from(100u64));

        let legs = vec![leg(HOME, 60, USER), leg(HOME, 60, USER)];
        assert!(call(&mut home, OPERATOR, Call::ProcessMultiTx { legs }).is_err());
        assert!(home.liquidity_outbox.is_empty());
        assert_eq!(home.token_balance(&asset(HOME), &processor), U256::from(100u64));

        let legs = vec![leg(HOME, 60, USER), leg(HOME, 40, USER)];
        let receipt = call(&mut home, OPERATOR, Call::ProcessMultiTx { legs }).unwrap();
        assert_eq!(receipt.amounts.len(), 2);
        assert_eq!(home.liquidity_outbox.len(), 2);
        assert_eq!(home.token_balance(&asset(HOME), &bridge(HOME)), U256::from(100u64));
    }

    #[test]
    fn test_pending_deposit_completes_through_processor() {
        let (mut home, mut remote) = pair();
        // First hop lands with the processor instead of the executor.
        let mut deposit = deposit_call(HOME, REMOTE, &[500], 100);
        if let Call::Deposit { liquidity, .. } = &mut deposit {
            liquidity[0].tx_data = route_to(remote.config.swap_processor, REMOTE);
        }
        call_with_value(&mut home, USER, 1_000_000, deposit).unwrap();
        settle(&mut home, &mut remote);
        let payload_id = relay(&mut home, &mut remote).remove(0).unwrap();
        call(&mut remote, OPERATOR, Call::UpdateState { payload_id, actual_amounts: vec![U256::from(495u64)] })
            .unwrap();
        assert_eq!(remote.get_payload(payload_id).unwrap().status, PayloadStatus::PendingTransport);

        let process = Call::ProcessPayload { payload_id, aux_data: vec![] };
        assert!(call(&mut remote, OPERATOR, process.clone()).unwrap_err().is_retryable());

        let executor = remote.config.executor;
        call(&mut remote, OPERATOR, Call::ProcessTx { leg: leg(REMOTE, 500, executor) }).unwrap();
        settle_local(&mut remote);

        let receipt = call(&mut remote, OPERATOR, process).unwrap();
        assert_eq!(receipt.amounts, vec![U256::from(495u64)]);
        assert_eq!(remote.payload_count(), 2);
        assert_eq!(remote.token_balance(&asset(REMOTE), &executor), U256::from(5u64));
    }
}
