//! Mutable bank totals
//!
//! Share totals and native totals live side by side; the ratio between them
//! is the value of one share.

use lendrisk_core::{Fixed, Rounding, MAX_MINT_DECIMALS};
use lendrisk_rates::{accrual_factor, rates, utilization, BankRates, SECONDS_PER_YEAR};
use serde::{Deserialize, Serialize};

use crate::config::BankConfig;
use crate::error::BankError;
use crate::shares::{amount_to_shares, shares_to_amount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankState {
    pub total_asset_shares: Fixed,
    pub total_liability_shares: Fixed,
    /// Native units owed to depositors, interest included
    pub total_deposits: Fixed,
    /// Native units owed by borrowers, interest included
    pub total_borrows: Fixed,
    pub mint_decimals: u8,
    /// Unix seconds of the last accrual
    pub last_update: i64,
    /// Protocol and insurance share of accrued interest
    #[serde(default)]
    pub collected_fees: Fixed,
}

/// Headroom under the deposit and borrow limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingCapacity {
    pub deposit_capacity: Fixed,
    pub borrow_capacity: Fixed,
}

impl BankState {
    /// Empty bank
    pub fn new(mint_decimals: u8, last_update: i64) -> Self {
        Self {
            total_asset_shares: Fixed::ZERO,
            total_liability_shares: Fixed::ZERO,
            total_deposits: Fixed::ZERO,
            total_borrows: Fixed::ZERO,
            mint_decimals,
            last_update,
            collected_fees: Fixed::ZERO,
        }
    }

    /// Reject snapshots with negative totals or unscalable mint decimals
    pub fn validate(&self) -> Result<(), BankError> {
        if self.mint_decimals > MAX_MINT_DECIMALS {
            return Err(BankError::UnsupportedDecimals {
                decimals: self.mint_decimals,
                max: MAX_MINT_DECIMALS,
            });
        }
        let fields = [
            ("total_asset_shares", self.total_asset_shares),
            ("total_liability_shares", self.total_liability_shares),
            ("total_deposits", self.total_deposits),
            ("total_borrows", self.total_borrows),
            ("collected_fees", self.collected_fees),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| v.is_negative()) {
            return Err(BankError::InvariantViolation(format!("{name} is negative: {value}")));
        }
        Ok(())
    }

    /// Withdrawable value of asset shares, rounded down
    pub fn asset_amount(&self, shares: Fixed) -> Result<Fixed, BankError> {
        Ok(shares_to_amount(
            shares,
            self.total_asset_shares,
            self.total_deposits,
            Rounding::Down,
        )?)
    }

    /// Debt of liability shares, rounded up
    pub fn liability_amount(&self, shares: Fixed) -> Result<Fixed, BankError> {
        Ok(shares_to_amount(
            shares,
            self.total_liability_shares,
            self.total_borrows,
            Rounding::Up,
        )?)
    }

    pub fn asset_shares_for(&self, amount: Fixed, rounding: Rounding) -> Result<Fixed, BankError> {
        Ok(amount_to_shares(
            amount,
            self.total_asset_shares,
            self.total_deposits,
            rounding,
        )?)
    }

    pub fn liability_shares_for(&self, amount: Fixed, rounding: Rounding) -> Result<Fixed, BankError> {
        Ok(amount_to_shares(
            amount,
            self.total_liability_shares,
            self.total_borrows,
            rounding,
        )?)
    }

    /// Native units that can still leave the bank
    pub fn available_liquidity(&self) -> Fixed {
        (self.total_deposits - self.total_borrows).max(Fixed::ZERO)
    }

    pub fn utilization(&self) -> Fixed {
        utilization(self.total_borrows, self.total_deposits)
    }

    pub fn rates(&self, config: &BankConfig) -> Result<BankRates, BankError> {
        Ok(rates(self.utilization(), &config.interest)?)
    }

    /// Accrue borrow interest up to `now`.
    ///
    /// Borrowers owe the full interest; depositors receive it minus the
    /// protocol and insurance fees. Returns the interest accrued.
    pub fn accrue(&mut self, config: &BankConfig, now: i64) -> Result<Fixed, BankError> {
        let elapsed = now.saturating_sub(self.last_update);
        if elapsed <= 0 {
            return Ok(Fixed::ZERO);
        }
        let elapsed = elapsed.unsigned_abs();

        let bank_rates = self.rates(config)?;
        let growth = accrual_factor(bank_rates.borrow_apr, elapsed)?;
        let interest = self.total_borrows * (growth - Fixed::ONE);
        let fees = interest * (config.interest.protocol_fee + config.interest.insurance_fee);

        self.total_borrows = self.total_borrows + interest;
        self.total_deposits = self.total_deposits + interest - fees;
        self.collected_fees = self.collected_fees + fees;
        self.last_update = now;

        tracing::debug!(
            elapsed_secs = elapsed,
            borrow_apr = %bank_rates.borrow_apr,
            interest = %interest,
            fees = %fees,
            "Accrued bank interest"
        );

        Ok(interest)
    }

    /// Headroom under the limits, after setting aside twice the interest
    /// accrued since the last update.
    pub fn remaining_capacity(&self, config: &BankConfig, now: i64) -> Result<RemainingCapacity, BankError> {
        let elapsed = Fixed::from(now.saturating_sub(self.last_update).max(0));
        let year_fraction = elapsed.checked_div(Fixed::from(SECONDS_PER_YEAR))?;
        let bank_rates = self.rates(config)?;

        let lend_interest = bank_rates.lend_apr * year_fraction * self.total_deposits;
        let borrow_interest = bank_rates.borrow_apr * year_fraction * self.total_borrows;

        let deposit_capacity =
            config.deposit_limit - self.total_deposits - Fixed::TWO * lend_interest;
        let borrow_capacity =
            config.borrow_limit - self.total_borrows - Fixed::TWO * borrow_interest;

        Ok(RemainingCapacity {
            deposit_capacity: deposit_capacity.max(Fixed::ZERO),
            borrow_capacity: borrow_capacity.max(Fixed::ZERO),
        })
    }
}
