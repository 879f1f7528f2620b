//! Vault settlement devnet library.
//!
//! This library provides the pieces for running the settlement protocol
//! across several in-process chains: the transport and bridge network, the
//! devnet deployment, the payload keeper and the node loop. It is used by
//! the `vaultbridge-node` binary and by the integration tests.

pub mod cli;
pub mod config;
pub mod devnet;
pub mod error;
pub mod keeper;
pub mod network;
pub mod node;
pub mod shutdown;

pub use error::{NodeError, NodeResult};
