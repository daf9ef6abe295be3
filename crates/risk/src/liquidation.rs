//! Liquidation price
//!
//! Maintenance health is linear in each bank's price, so the price at which
//! it crosses zero is a closed-form division. All other positions are held
//! at their current values, and so is the target's confidence half-width.
//!
//! - lending position:   `p = (L - A_other) / (q * w) + conf`
//! - borrowing position: `p = (A - L_other) / (q * w) - conf`

use lendrisk_bank::{BalanceSide, RequirementType, UserBalance};
use lendrisk_core::{BankAddress, CoreError, Fixed};

use crate::error::RiskError;
use crate::health::{totals, value_positions};
use crate::market::MarketSnapshot;

/// Price of `bank`'s asset at which the account becomes liquidatable.
///
/// `None` when no such non-negative price exists: no position in the bank,
/// a lending position with no debt anywhere, a position carrying zero
/// weight, or a threshold below zero.
pub fn liquidation_price(
    balances: &[UserBalance],
    market: &MarketSnapshot,
    bank: &BankAddress,
) -> Result<Option<Fixed>, RiskError> {
    let positions = value_positions(balances, market, RequirementType::Maintenance, None)?;
    let Some(target) = positions.iter().find(|p| &p.bank == bank) else {
        return Ok(None);
    };
    let (other_assets, other_liabilities) = totals(positions.iter().filter(|p| &p.bank != bank))?;

    let exposure = target
        .quantity
        .checked_mul(target.weight)
        .ok_or(CoreError::Overflow("liquidation exposure"))?;
    if exposure.is_zero() {
        return Ok(None);
    }

    let price = match target.side {
        BalanceSide::Assets => {
            if other_liabilities.is_zero() {
                return Ok(None);
            }
            (other_liabilities - other_assets).checked_div(exposure)? + target.confidence
        }
        BalanceSide::Liabilities => {
            (other_assets - other_liabilities).checked_div(exposure)? - target.confidence
        }
    };

    if price.is_negative() {
        return Ok(None);
    }
    tracing::debug!(
        bank = %bank.short(),
        side = ?target.side,
        liquidation_price = %price,
        "Computed liquidation price"
    );
    Ok(Some(price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fixtures::{bank, lend, owe, price};
    use rust_decimal_macros::dec;

    fn market() -> MarketSnapshot {
        MarketSnapshot::default()
            .with_bank(
                bank("SOL", (dec!(0.8), dec!(0.9)), (dec!(1.2), dec!(1.1))),
                price(dec!(100), dec!(1)),
            )
            .with_bank(
                bank("USDC", (dec!(0.9), dec!(0.95)), (dec!(1.1), dec!(1.05))),
                price(dec!(1), dec!(0)),
            )
    }

    #[test]
    fn test_lending_position() {
        let balances = [lend("SOL", 10), owe("USDC", 450)];
        // 450 * 1.05 = 472.5 = 10 * 0.9 * (p - 1) -> p = 53.5
        let p = liquidation_price(&balances, &market(), &BankAddress::new("SOL")).unwrap();
        assert_eq!(p, Some(Fixed::from(dec!(53.5))));
    }

    #[test]
    fn test_borrowing_position() {
        let balances = [lend("SOL", 10), owe("USDC", 450)];
        // 891 = 450 * 1.05 * (p + 0) -> p = 1.8857...
        let p = liquidation_price(&balances, &market(), &BankAddress::new("USDC"))
            .unwrap()
            .unwrap();
        assert!((p - Fixed::from(dec!(1.885714285714))).abs() < Fixed::from(dec!(0.000000000001)));
    }

    #[test]
    fn test_no_debt_has_no_liquidation_price() {
        let p = liquidation_price(&[lend("SOL", 10)], &market(), &BankAddress::new("SOL")).unwrap();
        assert_eq!(p, None);
    }

    #[test]
    fn test_no_position_in_bank() {
        let p = liquidation_price(&[lend("SOL", 10)], &market(), &BankAddress::new("USDC")).unwrap();
        assert_eq!(p, None);
    }

    #[test]
    fn test_negative_threshold_is_none() {
        // USDC collateral covers the JUP debt even at a zero SOL price
        let balances = [lend("SOL", 1), lend("USDC", 10_000), owe("JUP", 1)];
        let m = market().with_bank(
            bank("JUP", (dec!(0.5), dec!(0.6)), (dec!(1.5), dec!(1.4))),
            price(dec!(1), dec!(0)),
        );
        let p = liquidation_price(&balances, &m, &BankAddress::new("SOL")).unwrap();
        assert_eq!(p, None);
    }
}
