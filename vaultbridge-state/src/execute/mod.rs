//! Call execution module.
//!
//! One file per component. Every handler is a free function over a
//! [`StateWriter`](crate::StateWriter); [`apply_call`] dispatches a [`Call`]
//! to the right one and commits atomically.

mod access;
mod call;
mod context;
mod executor;
mod funds;
mod handler;
mod ledger;
mod rescue;
mod swap;
mod transport;
mod vault_executor;
mod wrapper;

#[cfg(test)]
pub(crate) mod testutil;

pub use call::{Call, Receipt};
pub use context::ExecutionContext;
pub use executor::apply_call;
pub use handler::{is_within_slippage, validate_slippage};
pub use swap::SwapLeg;
pub use transport::{estimate_fee, estimate_message_fee};
pub use vault_executor::preview_redeem;
