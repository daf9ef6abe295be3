//! Ledger wire encoding for fixed-point values
//!
//! On-chain bank and balance accounts store quantities as a signed 128-bit
//! integer with 48 fractional bits, serialized as 16 little-endian bytes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::fixed::{Fixed, Rounding};

const FRAC_BITS: u32 = 48;

/// Raw 16-byte I80F48 value as read from an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WrappedI80F48 {
    pub value: [u8; 16],
}

impl WrappedI80F48 {
    pub fn from_bits(bits: i128) -> Self {
        Self {
            value: bits.to_le_bytes(),
        }
    }

    pub fn bits(&self) -> i128 {
        i128::from_le_bytes(self.value)
    }
}

fn one_unit() -> Decimal {
    Decimal::from(1u64 << FRAC_BITS)
}

impl Fixed {
    /// Encode to the nearest multiple of 2^-48 (ties to even).
    pub fn to_wrapped_i80f48(self) -> Result<WrappedI80F48, CoreError> {
        let scaled = self
            .checked_mul(Fixed::new(one_unit()))
            .ok_or(CoreError::Overflow("to_wrapped_i80f48"))?
            .round_dp(0, Rounding::HalfEven);
        let bits = scaled.to_i128_trunc().ok_or_else(|| CoreError::OutOfRange {
            target: "I80F48",
            value: self.to_string(),
        })?;
        Ok(WrappedI80F48::from_bits(bits))
    }

    /// Decode an I80F48 value.
    ///
    /// Re-encoding the result yields the same bytes for magnitudes below 10^12.
    pub fn from_wrapped_i80f48(wrapped: WrappedI80F48) -> Result<Fixed, CoreError> {
        let bits = wrapped.bits();
        let raw = Decimal::try_from_i128_with_scale(bits, 0).map_err(|_| CoreError::OutOfRange {
            target: "Decimal",
            value: bits.to_string(),
        })?;
        Fixed::new(raw).checked_div(Fixed::new(one_unit()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    // Ledger dumps captured from live bank accounts
    const CASES: &[(&str, [u8; 16])] = &[
        (
            "333177.604135",
            [116, 94, 99, 151, 168, 154, 121, 21, 5, 0, 0, 0, 0, 0, 0, 0],
        ),
        (
            "-320024.31329",
            [15, 214, 255, 57, 204, 175, 231, 29, 251, 255, 255, 255, 255, 255, 255, 255],
        ),
        (
            "145880.413458",
            [2, 69, 44, 98, 216, 105, 216, 57, 2, 0, 0, 0, 0, 0, 0, 0],
        ),
        (
            "-444735.09754",
            [187, 242, 89, 158, 7, 231, 192, 54, 249, 255, 255, 255, 255, 255, 255, 255],
        ),
    ];

    #[test]
    fn test_decode_ledger_values() {
        let tolerance = Fixed::from(dec!(0.000001));
        for (number, bytes) in CASES {
            let expected: Fixed = number.parse().unwrap();
            let decoded = Fixed::from_wrapped_i80f48(WrappedI80F48 { value: *bytes }).unwrap();
            assert!(
                (decoded - expected).abs() <= tolerance,
                "{number}: decoded {decoded}"
            );
        }
    }

    #[test]
    fn test_reencode_is_stable() {
        for (_, bytes) in CASES {
            let wrapped = WrappedI80F48 { value: *bytes };
            let decoded = Fixed::from_wrapped_i80f48(wrapped).unwrap();
            assert_eq!(decoded.to_wrapped_i80f48().unwrap(), wrapped);
        }
    }

    #[test]
    fn test_one_and_zero() {
        assert_eq!(Fixed::ONE.to_wrapped_i80f48().unwrap().bits(), 1i128 << 48);
        assert_eq!(Fixed::ZERO.to_wrapped_i80f48().unwrap().bits(), 0);
    }

    #[test]
    fn test_decode_out_of_range() {
        let wrapped = WrappedI80F48::from_bits(i128::MAX);
        assert!(matches!(
            Fixed::from_wrapped_i80f48(wrapped),
            Err(CoreError::OutOfRange { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_bits_survive_decode_encode(bits in -(1i128 << 88)..(1i128 << 88)) {
            let wrapped = WrappedI80F48::from_bits(bits);
            let decoded = Fixed::from_wrapped_i80f48(wrapped).unwrap();
            prop_assert_eq!(decoded.to_wrapped_i80f48().unwrap(), wrapped);
        }
    }
}
