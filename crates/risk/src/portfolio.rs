//! Account-level figures: net value, net APY, leverage ceiling

use lendrisk_bank::{BalanceSide, Bank, RequirementType, UserBalance};
use lendrisk_core::{CoreError, Fixed};
use lendrisk_rates::{apr_to_apy, HOURS_PER_YEAR};
use serde::{Deserialize, Serialize};

use crate::error::RiskError;
use crate::health::{totals, value_positions};
use crate::market::MarketSnapshot;

/// Leverage ceiling of a deposit/borrow bank pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxLeverage {
    pub max_leverage: Fixed,
    /// `asset_weight_init / liability_weight_init`
    pub ltv: Fixed,
}

/// `1 / (1 - ltv)`, the leverage reached by looping forever at full LTV
pub fn max_leverage(deposit: &Bank, borrow: &Bank) -> Result<MaxLeverage, RiskError> {
    let ltv = deposit
        .config
        .asset_weight_init
        .checked_div(borrow.config.liability_weight_init)?;
    if ltv >= Fixed::ONE {
        return Err(RiskError::UnboundedLeverage {
            deposit_bank: deposit.address.clone(),
            borrow_bank: borrow.address.clone(),
        });
    }
    let max_leverage = Fixed::ONE.checked_div(Fixed::ONE - ltv)?;
    Ok(MaxLeverage { max_leverage, ltv })
}

/// Equity assets minus liabilities
pub fn account_value(balances: &[UserBalance], market: &MarketSnapshot) -> Result<Fixed, RiskError> {
    let positions = value_positions(balances, market, RequirementType::Equity, None)?;
    let (assets, liabilities) = totals(&positions)?;
    Ok(assets - liabilities)
}

/// Value-weighted lend APR minus borrow APR over net value, as an APY
pub fn net_apy(balances: &[UserBalance], market: &MarketSnapshot) -> Result<Fixed, RiskError> {
    let positions = value_positions(balances, market, RequirementType::Equity, None)?;
    let (assets, liabilities) = totals(&positions)?;
    let net = assets - liabilities;
    let denominator = if net.is_zero() { Fixed::ONE } else { net };

    let mut apr = Fixed::ZERO;
    for position in &positions {
        let rates = market.bank(&position.bank)?.rates()?;
        let contribution = match position.side {
            BalanceSide::Assets => rates.lend_apr.checked_mul(position.value),
            BalanceSide::Liabilities => rates.borrow_apr.checked_mul(position.value).map(|v| -v),
        }
        .ok_or(CoreError::Overflow("net apy"))?;
        apr = apr
            .checked_add(contribution.checked_div(denominator)?)
            .ok_or(CoreError::Overflow("net apy"))?;
    }

    Ok(apr_to_apy(apr, HOURS_PER_YEAR)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fixtures::{bank, lend, owe, price};
    use lendrisk_core::BankAddress;
    use rust_decimal_macros::dec;

    #[test]
    fn test_max_leverage() {
        let sol = bank("SOL", (dec!(0.8), dec!(0.9)), (dec!(1.25), dec!(1.1)));
        let usdc = bank("USDC", (dec!(0.9), dec!(0.95)), (dec!(1.125), dec!(1.05)));

        // ltv = 0.8 / 1.125 = 0.7111..., max = 3.4615...
        let lev = max_leverage(&sol, &usdc).unwrap();
        assert!((lev.max_leverage - Fixed::from(dec!(3.461538461538))).abs() < Fixed::from(dec!(0.000000001)));

        // 0.9 / 1.25 = 0.72 -> 1 / 0.28
        let lev = max_leverage(&usdc, &sol).unwrap();
        assert_eq!(lev.ltv, dec!(0.72));
    }

    #[test]
    fn test_unbounded_leverage() {
        let a = bank("A", (dec!(1), dec!(1)), (dec!(1), dec!(1)));
        let b = bank("B", (dec!(1), dec!(1)), (dec!(1), dec!(1)));
        assert!(matches!(
            max_leverage(&a, &b),
            Err(RiskError::UnboundedLeverage { .. })
        ));
    }

    #[test]
    fn test_account_value() {
        let m = MarketSnapshot::default()
            .with_bank(bank("SOL", (dec!(0.8), dec!(0.9)), (dec!(1.2), dec!(1.1))), price(dec!(100), dec!(2)))
            .with_bank(bank("USDC", (dec!(0.9), dec!(0.95)), (dec!(1.1), dec!(1.05))), price(dec!(1), dec!(0)));
        let value = account_value(&[lend("SOL", 10), owe("USDC", 250)], &m).unwrap();
        assert_eq!(value, dec!(750));
    }

    #[test]
    fn test_net_apy_sign() {
        // Fixture banks sit at 10% utilization: borrow 1.25%, lend 0.125%
        let m = MarketSnapshot::default()
            .with_bank(bank("SOL", (dec!(0.8), dec!(0.9)), (dec!(1.2), dec!(1.1))), price(dec!(1), dec!(0)))
            .with_bank(bank("USDC", (dec!(0.9), dec!(0.95)), (dec!(1.1), dec!(1.05))), price(dec!(1), dec!(0)));

        let lender = net_apy(&[lend("SOL", 100)], &m).unwrap();
        assert!(lender.is_positive());

        let levered = net_apy(&[lend("SOL", 100), owe("USDC", 90)], &m).unwrap();
        assert!(levered.is_negative());

        let rates = m.bank(&BankAddress::new("SOL")).unwrap().rates().unwrap();
        assert_eq!(rates.lend_apr, dec!(0.00125));
    }
}
