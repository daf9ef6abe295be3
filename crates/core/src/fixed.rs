//! Fixed - Deterministic decimal wrapper for monetary quantities
//!
//! Every price, amount, share count, weight and rate in Lendrisk is a `Fixed`.
//! Values are never mutated in place; every operation returns a new value.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::CoreError;

/// Largest mint decimals `from_ui` and `to_ui` can scale by
pub const MAX_MINT_DECIMALS: u8 = 19;

/// Rounding modes allowed in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Toward negative infinity
    Down,
    /// Toward positive infinity
    Up,
    /// Nearest, ties toward zero. Used for display.
    HalfDown,
    /// Nearest, ties to even. Used for internal accumulation.
    HalfEven,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::Down => RoundingStrategy::ToNegativeInfinity,
            Rounding::Up => RoundingStrategy::ToPositiveInfinity,
            Rounding::HalfDown => RoundingStrategy::MidpointTowardZero,
            Rounding::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// A deterministic decimal value.
///
/// # Example
/// ```
/// use lendrisk_core::{Fixed, Rounding};
///
/// let price: Fixed = "1.005".parse().unwrap();
/// assert_eq!(price.display(2), "1.00");
/// assert_eq!(price.round_dp(2, Rounding::Up), "1.01".parse::<Fixed>().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(Decimal);

impl Fixed {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);
    pub const TWO: Self = Self(Decimal::TWO);
    /// Smallest representable value, used as the "negative infinity" sentinel
    pub const MIN: Self = Self(Decimal::MIN);

    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// `mantissa * 10^-scale`, e.g. `Fixed::from_parts(25, 2)` is 0.25
    #[inline]
    pub fn from_parts(mantissa: i64, scale: u32) -> Self {
        Self(Decimal::new(mantissa, scale))
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Clamp into `[lo, hi]`
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Self)
    }

    /// Division that reports a zero divisor instead of panicking.
    pub fn checked_div(self, rhs: Self) -> Result<Self, CoreError> {
        if rhs.is_zero() {
            return Err(CoreError::DivisionByZero);
        }
        self.0
            .checked_div(rhs.0)
            .map(Self)
            .ok_or(CoreError::Overflow("div"))
    }

    /// `self * num / den` rounded to `dp` decimal places in the given direction.
    pub fn mul_div(self, num: Self, den: Self, dp: u32, rounding: Rounding) -> Result<Self, CoreError> {
        let product = self.checked_mul(num).ok_or(CoreError::Overflow("mul_div"))?;
        Ok(product.checked_div(den)?.round_dp(dp, rounding))
    }

    /// Integer power, used for periodic compounding
    pub fn checked_powu(self, exp: u64) -> Result<Self, CoreError> {
        self.0
            .checked_powu(exp)
            .map(Self)
            .ok_or(CoreError::Overflow("powu"))
    }

    pub fn round_dp(self, dp: u32, rounding: Rounding) -> Self {
        Self(self.0.round_dp_with_strategy(dp, rounding.strategy()))
    }

    pub fn floor(self) -> Self {
        Self(self.0.floor())
    }

    /// Native token units -> UI units (`self / 10^decimals`)
    pub fn to_ui(self, decimals: u8) -> Result<Self, CoreError> {
        let unit = Decimal::try_new(1, u32::from(decimals)).map_err(|_| decimals_out_of_range(decimals))?;
        self.checked_mul(Self(unit)).ok_or(CoreError::Overflow("to_ui"))
    }

    /// UI units -> native token units (`self * 10^decimals`)
    pub fn from_ui(ui: Self, decimals: u8) -> Result<Self, CoreError> {
        let scale = 10u64
            .checked_pow(u32::from(decimals))
            .ok_or_else(|| decimals_out_of_range(decimals))?;
        ui.checked_mul(Self::from(scale))
            .ok_or(CoreError::Overflow("from_ui"))
    }

    /// Round half-down to `dp` places for presentation
    pub fn display(self, dp: u32) -> String {
        format!("{:.*}", dp as usize, self.round_dp(dp, Rounding::HalfDown).0)
    }

    pub(crate) fn to_i128_trunc(self) -> Option<i128> {
        self.0.to_i128()
    }
}

fn decimals_out_of_range(decimals: u8) -> CoreError {
    CoreError::OutOfRange {
        target: "mint decimals",
        value: decimals.to_string(),
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Fixed {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self)
            .map_err(|e| CoreError::Parse(format!("{s}: {e}")))
    }
}

impl From<Decimal> for Fixed {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Fixed> for Decimal {
    fn from(value: Fixed) -> Self {
        value.0
    }
}

impl From<i64> for Fixed {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<u64> for Fixed {
    fn from(value: u64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<u32> for Fixed {
    fn from(value: u32) -> Self {
        Self(Decimal::from(value))
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 * rhs.0)
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Sum for Fixed {
    fn sum<I: Iterator<Item = Fixed>>(iter: I) -> Fixed {
        iter.fold(Fixed::ZERO, |acc, v| acc + v)
    }
}

impl PartialEq<Decimal> for Fixed {
    fn eq(&self, other: &Decimal) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<Decimal> for Fixed {
    fn partial_cmp(&self, other: &Decimal) -> Option<Ordering> {
        self.0.partial_cmp(other)
    }
}
