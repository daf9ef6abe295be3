//! Basis points

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fixed::Fixed;

/// Basis points (1 bps = 0.01%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bps(pub u32);

impl Bps {
    pub const ZERO: Self = Self(0);
    /// 100%
    pub const MAX: Self = Self(10_000);

    /// Fraction of one, e.g. 50 bps -> 0.005
    pub fn as_fraction(self) -> Fixed {
        Fixed::from_parts(i64::from(self.0), 4)
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_as_fraction() {
        assert_eq!(Bps(50).as_fraction(), dec!(0.005));
        assert_eq!(Bps::MAX.as_fraction(), dec!(1));
    }
}
