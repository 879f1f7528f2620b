//! Error types for the VaultBridge core crate.

use std::fmt;

/// Top-level error type for vaultbridge-core operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// Serialization or deserialization failed.
    Serialization(SerializationError),
    /// An underlying vault rejected an operation.
    Vault(VaultError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Serialization(e) => write!(f, "serialization error: {}", e),
            CoreError::Vault(e) => write!(f, "vault error: {}", e),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<SerializationError> for CoreError {
    fn from(e: SerializationError) -> Self {
        CoreError::Serialization(e)
    }
}

impl From<VaultError> for CoreError {
    fn from(e: VaultError) -> Self {
        CoreError::Vault(e)
    }
}

/// Errors related to serialization and deserialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SerializationError {
    /// Failed to encode data to bytes.
    EncodeFailed(String),
    /// Failed to decode data from bytes.
    DecodeFailed(String),
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::EncodeFailed(msg) => write!(f, "encode failed: {}", msg),
            SerializationError::DecodeFailed(msg) => write!(f, "decode failed: {}", msg),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Errors raised by an underlying vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VaultError {
    /// The vault is paused and accepts no deposits.
    Paused,
    /// The deposit would mint zero shares.
    ZeroShares,
    /// The redemption would return zero assets.
    ZeroAssets,
    /// More shares requested than the vault has issued.
    ExceedsSupply,
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::Paused => write!(f, "vault is paused"),
            VaultError::ZeroShares => write!(f, "deposit mints zero shares"),
            VaultError::ZeroAssets => write!(f, "redemption returns zero assets"),
            VaultError::ExceedsSupply => write!(f, "shares exceed vault supply"),
        }
    }
}

impl std::error::Error for VaultError {}
