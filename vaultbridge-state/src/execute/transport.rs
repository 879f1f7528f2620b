//! Transport adapter: fee quotes and message dispatch.
//!
//! The handler never talks to a concrete transport. Dispatch prices the
//! encoded message, charges the payer, appends the envelope to the chain's
//! outbox and records the outbound payload under a fresh id. Whatever relays
//! the outbox calls `Receive` on the destination.

use tracing::debug;
use vaultbridge_core::{
    Address, ChainId, CrossChainMessage, OutboundMessage, Payload, PayloadId, PayloadStatus, Role,
    U256,
};

use crate::error::{StateError, StateResult};
use crate::state::{StateReader, StateWriter};

use super::access::require_role;
use super::context::ExecutionContext;
use super::funds::transfer_native;

/// Fee to send `len` encoded bytes to `dst_chain`.
pub fn estimate_fee<S: StateReader>(state: &mut S, dst_chain: ChainId, len: u64) -> StateResult<U256> {
    let schedule = state
        .fee_schedule(dst_chain)
        .ok_or(StateError::UnsupportedDestination { chain: dst_chain })?;
    let fee = schedule.quote(len);
    debug!(dst_chain, len, %fee, "transport fee quoted");
    Ok(fee)
}

/// Fee to send `message`.
pub fn estimate_message_fee<S: StateReader>(
    state: &mut S,
    message: &CrossChainMessage,
) -> StateResult<U256> {
    let len = message
        .encoded_len()
        .map_err(|e| StateError::MalformedMessage { reason: e.to_string() })?;
    estimate_fee(state, message.dst_chain, len)
}

/// Dispatch `message` on behalf of `dispatcher`, charging `payer`.
///
/// The dispatcher must be a core controller and the destination must have a
/// trusted remote. The payer covers the transport fee plus `airdrop`, which
/// travels with the message to the destination executor.
pub(crate) fn dispatch<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    dispatcher: &Address,
    payer: &Address,
    mut message: CrossChainMessage,
    airdrop: U256,
) -> StateResult<PayloadId> {
    require_role(state, dispatcher, Role::CoreController)?;
    if state.trusted_remote(message.dst_chain).is_none() {
        return Err(StateError::NoTrustedRemote { chain: message.dst_chain });
    }

    let dst_chain = message.dst_chain;
    let payload_id = state.next_payload_id();
    message.origin_payload_id = payload_id;

    let fee = estimate_message_fee(state, &message)?;
    let bytes = message
        .encode()
        .map_err(|e| StateError::MalformedMessage { reason: e.to_string() })?;

    let required = fee + airdrop;
    let available = state.native_balance(payer);
    if available < required {
        return Err(StateError::InsufficientFee { required, provided: available });
    }
    let endpoint = state.config().transport_endpoint;
    transfer_native(state, payer, &endpoint, required)?;

    let (src_chain, sender) = {
        let config = state.config();
        (config.chain_id, config.handler)
    };
    state.push_outbound(OutboundMessage {
        src_chain,
        dst_chain,
        sender,
        bytes,
        fee_paid: fee,
        airdrop,
    });

    // Outbound records need no further local action.
    state.insert_payload(Payload {
        id: payload_id,
        kind: message.kind,
        src_chain,
        dst_chain,
        origin_payload_id: payload_id,
        origin_ledger: message.origin_ledger,
        user: message.user,
        tx_id: message.tx_id,
        declared_amounts: message.amounts,
        actual_amounts: None,
        vault_ids: message.vault_ids,
        max_slippage_bps: message.max_slippage_bps,
        aux_flag: message.aux_flag,
        liquidity_transfer: message.liquidity_transfer,
        route_out: message.route_out,
        status: PayloadStatus::Processed,
        created_at: ctx.timestamp,
    });

    debug!(payload_id, dst_chain, "payload dispatched");
    Ok(payload_id)
}
