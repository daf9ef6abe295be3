//! Utilization and bank rates

use lendrisk_core::Fixed;
use serde::{Deserialize, Serialize};

use crate::curve::RateCurve;
use crate::error::RateError;

/// Interest configuration of one bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRateConfig {
    pub curve: RateCurve,
    /// Share of borrow interest kept by the protocol
    #[serde(default)]
    pub protocol_fee: Fixed,
    /// Share of borrow interest paid into the insurance fund
    #[serde(default)]
    pub insurance_fee: Fixed,
}

impl InterestRateConfig {
    pub fn validate(&self) -> Result<(), RateError> {
        self.curve.validate()?;
        if self.protocol_fee.is_negative()
            || self.insurance_fee.is_negative()
            || self.protocol_fee + self.insurance_fee >= Fixed::ONE
        {
            return Err(RateError::FeesTooHigh {
                protocol: self.protocol_fee,
                insurance: self.insurance_fee,
            });
        }
        Ok(())
    }

    /// Fraction of borrow interest that reaches lenders
    pub fn lender_share(&self) -> Fixed {
        Fixed::ONE - self.protocol_fee - self.insurance_fee
    }
}

/// Rates of a bank at one utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRates {
    pub utilization: Fixed,
    pub borrow_apr: Fixed,
    pub lend_apr: Fixed,
}

/// `total_borrows / total_deposits` clamped to `[0, 1]`; zero without deposits
pub fn utilization(total_borrows: Fixed, total_deposits: Fixed) -> Fixed {
    if !total_deposits.is_positive() {
        return Fixed::ZERO;
    }
    total_borrows
        .checked_div(total_deposits)
        .map(|u| u.clamp(Fixed::ZERO, Fixed::ONE))
        .unwrap_or(Fixed::ONE)
}

/// Borrow and lend APR for a utilization.
///
/// `lend_apr = borrow_apr * u * (1 - protocol_fee - insurance_fee)`
pub fn rates(utilization: Fixed, config: &InterestRateConfig) -> Result<BankRates, RateError> {
    config.validate()?;
    let u = utilization.clamp(Fixed::ZERO, Fixed::ONE);
    let borrow_apr = config.curve.borrow_apr(u)?;
    let lend_apr = borrow_apr * u * config.lender_share();
    Ok(BankRates {
        utilization: u,
        borrow_apr,
        lend_apr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> InterestRateConfig {
        InterestRateConfig {
            curve: RateCurve::legacy(
                Fixed::from(dec!(0.8)),
                Fixed::from(dec!(0.1)),
                Fixed::from(dec!(1)),
            ),
            protocol_fee: Fixed::from(dec!(0.1)),
            insurance_fee: Fixed::from(dec!(0.05)),
        }
    }

    #[test]
    fn test_utilization() {
        assert_eq!(utilization(Fixed::from(50i64), Fixed::from(200i64)), dec!(0.25));
        assert_eq!(utilization(Fixed::from(50i64), Fixed::ZERO), dec!(0));
        // Accrued borrows can briefly exceed deposits through rounding
        assert_eq!(utilization(Fixed::from(201i64), Fixed::from(200i64)), dec!(1));
    }

    #[test]
    fn test_rates_at_optimal() {
        let r = rates(Fixed::from(dec!(0.8)), &config()).unwrap();
        assert_eq!(r.borrow_apr, dec!(0.1));
        // 0.1 * 0.8 * 0.85
        assert_eq!(r.lend_apr, dec!(0.068));
    }

    #[test]
    fn test_zero_utilization_pays_no_lenders() {
        let r = rates(Fixed::ZERO, &config()).unwrap();
        assert_eq!(r.lend_apr, dec!(0));
    }

    #[test]
    fn test_fee_validation() {
        let mut cfg = config();
        cfg.protocol_fee = Fixed::from(dec!(0.6));
        cfg.insurance_fee = Fixed::from(dec!(0.4));
        assert!(matches!(
            rates(Fixed::ZERO, &cfg),
            Err(RateError::FeesTooHigh { .. })
        ));
    }
}
