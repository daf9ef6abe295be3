//! Initial-requirement headroom: free collateral, max borrow, max withdraw
//!
//! Results are UI units of the bank's asset, rounded down to mint precision.

use lendrisk_bank::{BalanceSide, OperationalState, RequirementType, UserBalance};
use lendrisk_core::{BankAddress, Fixed, Rounding};

use crate::error::RiskError;
use crate::health::{totals, value_positions, PositionValue};
use crate::market::MarketSnapshot;

/// Initial assets minus liabilities, floored at zero
pub fn free_collateral(balances: &[UserBalance], market: &MarketSnapshot) -> Result<Fixed, RiskError> {
    let positions = value_positions(balances, market, RequirementType::Initial, None)?;
    let (assets, liabilities) = totals(&positions)?;
    Ok((assets - liabilities).max(Fixed::ZERO))
}

fn own_asset<'a>(positions: &'a [PositionValue], bank: &BankAddress) -> Option<&'a PositionValue> {
    positions
        .iter()
        .find(|p| &p.bank == bank && p.side == BalanceSide::Assets)
}

/// Most the account can take out of `bank`, withdrawing its own deposit
/// there first and borrowing the rest.
///
/// The isolation gate is evaluated as if the account already owed `bank`.
pub fn max_borrow(
    balances: &[UserBalance],
    market: &MarketSnapshot,
    bank: &BankAddress,
) -> Result<Fixed, RiskError> {
    let target = market.bank(bank)?;
    if target.config.operational_state != OperationalState::Operational {
        return Ok(Fixed::ZERO);
    }
    let range = market.price(bank)?.weighted;

    let positions = value_positions(balances, market, RequirementType::Initial, Some(bank))?;
    let (assets, liabilities) = totals(&positions)?;
    let free = (assets - liabilities).max(Fixed::ZERO);

    let own = own_asset(&positions, bank);
    let untied = own.map_or(Fixed::ZERO, |p| p.value.min(free));
    let liability_weight = target.config.liability_weight_init;
    let borrowable = (free - untied).checked_div(range.high * liability_weight)?;

    let total = match own {
        None => borrowable,
        Some(p) if p.weight.is_zero() => p.quantity + borrowable,
        Some(p) => untied.checked_div(range.low * p.weight)? + borrowable,
    };

    tracing::debug!(
        bank = %bank.short(),
        free_collateral = %free,
        untied = %untied,
        max_borrow = %total,
        "Computed max borrow"
    );
    Ok(total.round_dp(u32::from(target.state.mint_decimals), Rounding::Down))
}

/// Most the account can withdraw from `bank` without borrowing.
pub fn max_withdraw(
    balances: &[UserBalance],
    market: &MarketSnapshot,
    bank: &BankAddress,
) -> Result<Fixed, RiskError> {
    let target = market.bank(bank)?;
    if target.config.operational_state == OperationalState::Paused {
        return Ok(Fixed::ZERO);
    }
    let range = market.price(bank)?.weighted;
    let decimals = u32::from(target.state.mint_decimals);

    let init_positions = value_positions(balances, market, RequirementType::Initial, None)?;
    let Some(own_init) = own_asset(&init_positions, bank) else {
        return Ok(Fixed::ZERO);
    };
    let entire = own_init.quantity;
    let (init_assets, init_liabilities) = totals(&init_positions)?;
    let free = (init_assets - init_liabilities).max(Fixed::ZERO);

    let maint_positions = value_positions(balances, market, RequirementType::Maintenance, None)?;
    let maint_weight = own_asset(&maint_positions, bank).map_or(Fixed::ZERO, |p| p.weight);
    let init_weight = own_init.weight;

    let amount = if init_weight.is_zero() && maint_weight.is_zero() {
        // Not collateral: free unless the account is already at its limit with debt
        if free.is_zero() && !init_liabilities.is_zero() {
            Fixed::ZERO
        } else {
            entire
        }
    } else if init_weight.is_zero() {
        // Retiring collateral: only maintenance weight left
        if init_liabilities.is_zero() {
            entire
        } else if free.is_zero() {
            Fixed::ZERO
        } else {
            let (maint_assets, maint_liabilities) = totals(&maint_positions)?;
            (maint_assets - maint_liabilities)
                .max(Fixed::ZERO)
                .checked_div(range.low * maint_weight)?
                .min(entire)
        }
    } else if init_liabilities.is_zero() || own_init.value <= free {
        entire
    } else {
        free.checked_div(range.low * init_weight)?.min(entire)
    };

    Ok(amount.round_dp(decimals, Rounding::Down))
}
