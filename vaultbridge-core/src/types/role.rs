//! Access roles.

use serde::{Deserialize, Serialize};

/// A role held by a principal on one chain.
///
/// Roles are granted and revoked only by the chain administrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Protocol components allowed to dispatch payloads and register as controllers.
    CoreController,
    /// Off-chain keeper allowed to reconcile and process payloads.
    PayloadOperator,
    /// Operator allowed to drive multi-leg swaps.
    SwapOperator,
}

impl Role {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::CoreController => "core_controller",
            Role::PayloadOperator => "payload_operator",
            Role::SwapOperator => "swap_operator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
