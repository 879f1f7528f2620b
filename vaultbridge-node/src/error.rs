//! Node error types.

use thiserror::Error;
use vaultbridge_core::{ChainId, SerializationError};
use vaultbridge_state::StateError;

/// Errors raised by the devnet harness.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A call was rejected by a chain.
    #[error("chain {chain} rejected call: {source}")]
    Call {
        chain: ChainId,
        #[source]
        source: StateError,
    },

    /// State error outside a call.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Chain not part of the network.
    #[error("unknown chain {0}")]
    UnknownChain(ChainId),

    /// Encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NodeError {
    /// The state error behind this failure, if any.
    pub fn state_error(&self) -> Option<&StateError> {
        match self {
            NodeError::Call { source, .. } => Some(source),
            NodeError::State(e) => Some(e),
            _ => None,
        }
    }

    /// Whether retrying later can succeed.
    pub fn is_retryable(&self) -> bool {
        self.state_error().map(StateError::is_retryable).unwrap_or(false)
    }
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;
