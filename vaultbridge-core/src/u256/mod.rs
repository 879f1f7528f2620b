//! 256-bit unsigned amounts.
//!
//! Token amounts, vault shares and native fees are all `U256`. Slippage and
//! bridge fees are expressed in basis points; the helpers here compute
//! `floor(amount * bps / 10_000)` without overflowing for any amount.

// Allow clippy warnings from the uint crate's construct_uint macro
#![allow(clippy::manual_div_ceil)]
#![allow(clippy::assign_op_pattern)]

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer used for every amount in the protocol.
    pub struct U256(4);
}

/// Basis points in one whole.
pub const BPS_DENOMINATOR: u64 = 10_000;

impl U256 {
    /// Create a U256 from a u64 value.
    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    /// Convert to u64, returning None if the value doesn't fit.
    #[inline]
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[1] == 0 && self.0[2] == 0 && self.0[3] == 0 {
            Some(self.0[0])
        } else {
            None
        }
    }

    /// `floor(self * bps / 10_000)`.
    ///
    /// Splits `self` into `q * 10_000 + r` so the product never exceeds
    /// 256 bits while `bps <= 10_000`.
    pub fn bps_of(&self, bps: u64) -> U256 {
        let denom = U256::from(BPS_DENOMINATOR);
        let k = U256::from(bps);
        let q = *self / denom;
        let r = *self % denom;
        q * k + (r * k) / denom
    }

    /// Smallest amount within `bound_bps` below `self`:
    /// `floor(self * (10_000 - bound_bps) / 10_000)`.
    pub fn min_after_slippage(&self, bound_bps: u16) -> U256 {
        let keep = BPS_DENOMINATOR.saturating_sub(u64::from(bound_bps));
        self.bps_of(keep)
    }

    /// `floor(self * num / den)`, or None on overflow or a zero denominator.
    pub fn mul_div_floor(&self, num: U256, den: U256) -> Option<U256> {
        if den.is_zero() {
            return None;
        }
        self.checked_mul(num).map(|product| product / den)
    }

    /// Little-endian byte representation.
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, limb) in bytes.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        bytes
    }

    /// Inverse of [`U256::to_le_bytes`].
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(word);
        }
        U256(limbs)
    }
}

// Serialized as 32 little-endian bytes so the wire encoding is fixed-width.
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_le_bytes())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct U256Visitor;

        impl<'de> serde::de::Visitor<'de> for U256Visitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("32 little-endian bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<U256, E> {
                if v.len() != 32 {
                    return Err(E::invalid_length(v.len(), &self));
                }
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(v);
                Ok(U256::from_le_bytes(&bytes))
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(self, mut seq: A) -> Result<U256, A::Error> {
                let mut bytes = [0u8; 32];
                for (i, byte) in bytes.iter_mut().enumerate() {
                    *byte = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
                }
                Ok(U256::from_le_bytes(&bytes))
            }
        }

        deserializer.deserialize_bytes(U256Visitor)
    }
}
