//! Property tests for reconciliation bounds.

use proptest::prelude::*;
use vaultbridge_core::U256;
use vaultbridge_state::{is_within_slippage, validate_slippage, StateError};

proptest! {
    #[test]
    fn accepted_iff_within_bounds(declared in 0u64..1_000_000_000, actual in 0u64..1_000_000_000, bound in 0u16..=10_000) {
        let minimum = (declared as u128 * (10_000 - bound as u128) / 10_000) as u64;
        let result = validate_slippage(0, U256::from(declared), U256::from(actual), bound);
        prop_assert_eq!(result.is_ok(), minimum <= actual && actual <= declared);
        match result {
            Err(StateError::NegativeSlippage { .. }) => prop_assert!(actual > declared),
            Err(StateError::SlippageOutOfBounds { minimum: m, .. }) => {
                prop_assert_eq!(m, U256::from(minimum));
                prop_assert!(actual < minimum);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
            Ok(()) => {}
        }
    }

    #[test]
    fn declared_amount_always_accepted(declared in any::<u64>(), bound in 0u16..=10_000) {
        prop_assert!(is_within_slippage(U256::from(declared), U256::from(declared), bound));
    }

    #[test]
    fn full_tolerance_accepts_anything_not_above(declared in any::<u64>(), actual in any::<u64>()) {
        prop_assert_eq!(
            is_within_slippage(U256::from(declared), U256::from(actual), 10_000),
            actual <= declared
        );
    }
}
