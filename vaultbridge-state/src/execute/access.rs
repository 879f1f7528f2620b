//! Role administration and registry calls.

use tracing::info;
use vaultbridge_core::crypto::short_address;
use vaultbridge_core::{Address, ChainId, Role, TransportId};

use crate::config::FeeSchedule;
use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::state::{ControllerKind, StateReader, StateWriter};

use super::context::ExecutionContext;

/// Fail unless `caller` is the chain administrator.
pub(crate) fn require_admin<S: StateReader>(state: &mut S, caller: &Address) -> StateResult<()> {
    if state.config().admin != *caller {
        return Err(StateError::NotAdmin { caller: *caller });
    }
    Ok(())
}

/// Fail unless `account` holds `role`.
pub(crate) fn require_role<S: StateReader>(
    state: &mut S,
    account: &Address,
    role: Role,
) -> StateResult<()> {
    if !state.has_role(account, role) {
        return Err(StateError::MissingRole { account: *account, role });
    }
    Ok(())
}

/// Execute a GrantRole call.
pub fn execute_grant_role<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    role: Role,
    account: &Address,
) -> StateResult<()> {
    require_admin(state, &ctx.caller)?;
    state.set_role(account, role, true);
    state.emit(Event::RoleGranted { role, account: *account });
    info!(%role, account = %short_address(account), "role granted");
    Ok(())
}

/// Execute a RevokeRole call.
pub fn execute_revoke_role<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    role: Role,
    account: &Address,
) -> StateResult<()> {
    require_admin(state, &ctx.caller)?;
    state.set_role(account, role, false);
    state.emit(Event::RoleRevoked { role, account: *account });
    info!(%role, account = %short_address(account), "role revoked");
    Ok(())
}

/// Execute a SetTrustedRemote call.
///
/// Allowed for core controllers and the administrator.
pub fn execute_set_trusted_remote<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    chain: ChainId,
    remote: &Address,
) -> StateResult<()> {
    if require_admin(state, &ctx.caller).is_err() {
        require_role(state, &ctx.caller, Role::CoreController)?;
    }
    state.set_trusted_remote(chain, *remote);
    state.emit(Event::TrustedRemoteSet { chain, remote: *remote });
    Ok(())
}

/// Execute a SetBridgeAddress call.
pub fn execute_set_bridge_address<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    transport_id: TransportId,
    endpoint: &Address,
) -> StateResult<()> {
    require_admin(state, &ctx.caller)?;
    state.set_bridge(transport_id, *endpoint);
    Ok(())
}

/// Execute a SetFeeSchedule call.
pub fn execute_set_fee_schedule<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    dst_chain: ChainId,
    schedule: FeeSchedule,
) -> StateResult<()> {
    require_admin(state, &ctx.caller)?;
    state.set_fee_schedule(dst_chain, schedule);
    Ok(())
}

/// Execute a RegisterController call: the caller becomes the handler's
/// callback for `kind`.
pub fn execute_register_controller<S: StateWriter>(
    state: &mut S,
    ctx: &ExecutionContext,
    kind: ControllerKind,
) -> StateResult<()> {
    require_role(state, &ctx.caller, Role::CoreController)?;
    state.set_controller(kind, ctx.caller);
    info!(?kind, controller = %short_address(&ctx.caller), "controller registered");
    Ok(())
}
