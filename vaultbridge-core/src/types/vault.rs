//! Underlying vault interface.
//!
//! Vault share math is external to the protocol; the executor only needs to
//! deposit, redeem and quote. [`Erc4626Vault`] is a reference implementation
//! used by the devnet and tests.

use serde::{Deserialize, Serialize};

use super::ids::Address;
use crate::error::VaultError;
use crate::u256::U256;

/// Operations the vault executor performs against a vault.
pub trait UnderlyingVault {
    /// Token the vault accepts.
    fn asset(&self) -> Address;

    /// Deposit assets, returning shares minted.
    fn deposit(&mut self, assets: U256) -> Result<U256, VaultError>;

    /// Burn shares, returning assets released.
    fn redeem(&mut self, shares: U256) -> Result<U256, VaultError>;

    /// Assets `shares` would redeem for right now.
    fn preview_redeem(&self, shares: U256) -> U256;
}

/// Proportional-share vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc4626Vault {
    /// Vault address on its chain.
    pub address: Address,
    /// Accepted token.
    pub asset: Address,
    /// Assets under management.
    pub total_assets: U256,
    /// Shares outstanding.
    pub total_supply: U256,
    /// Paused vaults reject deposits.
    pub paused: bool,
}

impl Erc4626Vault {
    /// Empty vault for `asset`.
    pub fn new(address: Address, asset: Address) -> Self {
        Self {
            address,
            asset,
            total_assets: U256::zero(),
            total_supply: U256::zero(),
            paused: false,
        }
    }

    /// Shares `assets` would mint right now.
    pub fn preview_deposit(&self, assets: U256) -> U256 {
        if self.total_supply.is_zero() || self.total_assets.is_zero() {
            return assets;
        }
        assets
            .mul_div_floor(self.total_supply, self.total_assets)
            .unwrap_or_default()
    }

    /// Add yield without minting shares.
    pub fn accrue(&mut self, assets: U256) {
        self.total_assets = self.total_assets + assets;
    }
}

impl UnderlyingVault for Erc4626Vault {
    fn asset(&self) -> Address {
        self.asset
    }

    fn deposit(&mut self, assets: U256) -> Result<U256, VaultError> {
        if self.paused {
            return Err(VaultError::Paused);
        }
        let shares = self.preview_deposit(assets);
        if shares.is_zero() {
            return Err(VaultError::ZeroShares);
        }
        self.total_assets = self.total_assets + assets;
        self.total_supply = self.total_supply + shares;
        Ok(shares)
    }

    fn redeem(&mut self, shares: U256) -> Result<U256, VaultError> {
        if shares > self.total_supply {
            return Err(VaultError::ExceedsSupply);
        }
        let assets = self.preview_redeem(shares);
        if assets.is_zero() {
            return Err(VaultError::ZeroAssets);
        }
        self.total_assets = self.total_assets - assets;
        self.total_supply = self.total_supply - shares;
        Ok(assets)
    }

    fn preview_redeem(&self, shares: U256) -> U256 {
        if self.total_supply.is_zero() {
            return U256::zero();
        }
        shares
            .mul_div_floor(self.total_assets, self.total_supply)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> Erc4626Vault {
        Erc4626Vault::new([1u8; 20], [2u8; 20])
    }

    #[test]
    fn test_first_deposit_is_one_to_one() {
        let mut v = vault();
        assert_eq!(v.deposit(U256::from(1000u64)).unwrap(), U256::from(1000u64));
        assert_eq!(v.total_supply, U256::from(1000u64));
    }

    #[test]
    fn test_yield_raises_redemption_value() {
        let mut v = vault();
        v.deposit(U256::from(1000u64)).unwrap();
        v.accrue(U256::from(100u64));
        assert_eq!(v.preview_redeem(U256::from(500u64)), U256::from(550u64));
        // 1100 assets / 1000 shares: 110 assets buy 100 shares
        assert_eq!(v.deposit(U256::from(110u64)).unwrap(), U256::from(100u64));
    }

    #[test]
    fn test_paused_rejects_deposit() {
        let mut v = vault();
        v.paused = true;
        assert_eq!(v.deposit(U256::from(1u64)), Err(VaultError::Paused));
    }

    #[test]
    fn test_redeem_bounds() {
        let mut v = vault();
        v.deposit(U256::from(10u64)).unwrap();
        assert_eq!(v.redeem(U256::from(11u64)), Err(VaultError::ExceedsSupply));
        assert_eq!(v.redeem(U256::from(10u64)).unwrap(), U256::from(10u64));
        assert!(v.total_assets.is_zero());
    }
}
