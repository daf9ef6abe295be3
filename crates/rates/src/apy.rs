//! APR to APY conversion and interval accrual

use lendrisk_core::{Fixed, Rounding};

use crate::error::RateError;

/// Hourly compounding periods in a year
pub const HOURS_PER_YEAR: u64 = 8_760;

/// 365.25 days
pub const SECONDS_PER_YEAR: u64 = 31_557_600;

/// `(1 + apr / periods)^periods - 1`, rounded half-even to 18 places
pub fn apr_to_apy(apr: Fixed, periods: u64) -> Result<Fixed, RateError> {
    if periods == 0 {
        return Ok(apr);
    }
    let per_period = apr.checked_div(Fixed::from(periods))?;
    let growth = (Fixed::ONE + per_period).checked_powu(periods)?;
    Ok((growth - Fixed::ONE).round_dp(18, Rounding::HalfEven))
}

/// Simple-interest growth factor over `seconds`: `1 + apr * seconds / year`
pub fn accrual_factor(apr: Fixed, seconds: u64) -> Result<Fixed, RateError> {
    let elapsed = Fixed::from(seconds).checked_div(Fixed::from(SECONDS_PER_YEAR))?;
    Ok(Fixed::ONE + apr * elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apr_to_apy_zero() {
        assert_eq!(apr_to_apy(Fixed::ZERO, HOURS_PER_YEAR).unwrap(), dec!(0));
    }

    #[test]
    fn test_apr_to_apy_ten_percent() {
        let apy = apr_to_apy(Fixed::from(dec!(0.1)), HOURS_PER_YEAR).unwrap();
        // e^0.1 - 1 = 0.10517..., hourly compounding lands just under it
        assert!(apy > dec!(0.10516) && apy < dec!(0.10518), "apy = {apy}");
    }

    #[test]
    fn test_apr_to_apy_is_deterministic() {
        let a = apr_to_apy(Fixed::from(dec!(0.0734)), HOURS_PER_YEAR).unwrap();
        let b = apr_to_apy(Fixed::from(dec!(0.0734)), HOURS_PER_YEAR).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_period_is_identity() {
        assert_eq!(apr_to_apy(Fixed::from(dec!(0.25)), 1).unwrap(), dec!(0.25));
    }

    #[test]
    fn test_accrual_factor() {
        assert_eq!(accrual_factor(Fixed::from(dec!(0.1)), SECONDS_PER_YEAR).unwrap(), dec!(1.1));
        assert_eq!(
            accrual_factor(Fixed::from(dec!(0.1)), SECONDS_PER_YEAR / 2).unwrap(),
            dec!(1.05)
        );
        assert_eq!(accrual_factor(Fixed::from(dec!(0.5)), 0).unwrap(), dec!(1));
    }
}
