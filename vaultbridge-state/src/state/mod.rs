//! State container and storage traits.
//!
//! - [`StateReader`]: read access to one chain's protocol state
//! - [`StateWriter`]: mutable access
//! - [`StateStore`]: both
//! - [`ChainState`]: in-memory HashMap-backed implementation
//! - Record types kept by the ledger, handler, executor and wrapper

mod chain_state;
mod records;
mod store;

pub use chain_state::ChainState;
pub use records::{ControllerKind, FailedDeposit, RescueProposal, TxRecord, WrapperToken};
pub use store::{StateReader, StateStore, StateWriter};
