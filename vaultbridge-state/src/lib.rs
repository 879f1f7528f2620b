// Allow manual assign operations - U256 doesn't implement AddAssign/SubAssign
#![allow(clippy::assign_op_pattern)]
// Allow functions with many parameters - handlers need context
#![allow(clippy::too_many_arguments)]

//! Per-chain state machine for cross-chain vault settlement.
//!
//! Given one chain's state and a call, this crate produces the next state or
//! an error. Every protocol rule lives here: the position ledger, the state
//! handler's payload lifecycle, the vault executor's custody, the multi-leg
//! swap processor and the position wrapper. There is no networking; a relay
//! moves outbox entries between chains by calling `Receive`.
//!
//! # Key Components
//!
//! - [`ChainState`]: In-memory state container backed by HashMaps
//! - [`StateReader`]/[`StateWriter`]: Traits abstracting state access
//! - [`apply_call`]: Main entry point for executing calls
//! - [`StateError`]: Error type for validation failures
//!
//! # Example
//!
//! ```ignore
//! use vaultbridge_state::{apply_call, Call, ChainConfig, ChainState, ExecutionContext};
//!
//! let config = ChainConfig::devnet(1);
//! let admin = config.admin;
//! let mut state = ChainState::new(config);
//! let ctx = ExecutionContext::new(admin, 1_700_000_000);
//! apply_call(&mut state, &ctx, &Call::GrantRole { role, account })?;
//! ```

mod config;
mod error;
mod events;
mod execute;
mod state;

pub use config::{ChainConfig, FeeSchedule, DEFAULT_RESCUE_DELAY, DEVNET_RESCUE_DELAY};
pub use error::{ErrorKind, StateError, StateResult};
pub use events::Event;
pub use execute::{
    apply_call, estimate_fee, estimate_message_fee, is_within_slippage, preview_redeem,
    validate_slippage, Call, ExecutionContext, Receipt, SwapLeg,
};
pub use state::{
    ChainState, ControllerKind, FailedDeposit, RescueProposal, StateReader, StateStore,
    StateWriter, TxRecord, WrapperToken,
};
