//! Execution context for call processing.

use vaultbridge_core::{Address, U256};

/// Per-call environment: who is calling, with how much native value, and when.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// Immediate caller.
    pub caller: Address,

    /// Native value attached to the call.
    pub value: U256,

    /// Current block timestamp (unix seconds).
    pub timestamp: u64,

    /// Current block height.
    pub block_height: u64,
}

impl ExecutionContext {
    /// Context for `caller` at `timestamp`, with no value attached.
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self {
            caller,
            value: U256::zero(),
            timestamp,
            block_height: 0,
        }
    }

    /// Attach native value.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set the block height.
    pub fn at_height(mut self, block_height: u64) -> Self {
        self.block_height = block_height;
        self
    }

    /// Same block, different caller and no value. Used when one component
    /// calls another within a single call.
    pub(crate) fn as_caller(&self, caller: Address) -> Self {
        Self {
            caller,
            value: U256::zero(),
            timestamp: self.timestamp,
            block_height: self.block_height,
        }
    }

    /// Create an execution context for testing with minimal values.
    #[cfg(test)]
    pub fn test_context(caller: Address) -> Self {
        Self::new(caller, 1_700_000_000).at_height(1)
    }
}
