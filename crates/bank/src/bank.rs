//! Bank operations
//!
//! Each operation computes the new bank totals and the new balance first,
//! checks them, and only then writes both. An error leaves both untouched.

use lendrisk_core::{BankAddress, Fixed, Rounding};
use lendrisk_rates::BankRates;
use serde::{Deserialize, Serialize};

use crate::balance::UserBalance;
use crate::config::{BankConfig, OperationalState};
use crate::error::BankError;
use crate::state::{BankState, RemainingCapacity};

/// A bank snapshot: address, static config and mutable totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub address: BankAddress,
    pub config: BankConfig,
    pub state: BankState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Deposit,
    Withdraw,
    Borrow,
    Repay,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
            Operation::Borrow => "borrow",
            Operation::Repay => "repay",
        }
    }

    fn increases_exposure(self) -> bool {
        matches!(self, Operation::Deposit | Operation::Borrow)
    }
}

impl Bank {
    pub fn new(address: BankAddress, config: BankConfig, state: BankState) -> Self {
        Self {
            address,
            config,
            state,
        }
    }

    pub fn validate(&self) -> Result<(), BankError> {
        self.config.validate()?;
        self.state.validate()
    }

    pub fn is_operational(&self) -> bool {
        self.config.operational_state == OperationalState::Operational
    }

    pub fn rates(&self) -> Result<BankRates, BankError> {
        self.state.rates(&self.config)
    }

    pub fn accrue(&mut self, now: i64) -> Result<Fixed, BankError> {
        self.state.accrue(&self.config, now)
    }

    pub fn remaining_capacity(&self, now: i64) -> Result<RemainingCapacity, BankError> {
        self.state.remaining_capacity(&self.config, now)
    }

    /// Native amounts `(assets, liabilities)` of a balance in this bank
    pub fn balance_amounts(&self, balance: &UserBalance) -> Result<(Fixed, Fixed), BankError> {
        Ok((
            self.state.asset_amount(balance.asset_shares())?,
            self.state.liability_amount(balance.liability_shares())?,
        ))
    }

    /// Lend `amount` native units. Returns the shares minted.
    pub fn deposit(&mut self, balance: &mut UserBalance, amount: Fixed) -> Result<Fixed, BankError> {
        self.check(balance, Operation::Deposit, amount)?;
        if balance.liability_shares().is_positive() {
            return Err(self.mixed(Operation::Deposit, "owing"));
        }

        let new_deposits = self.state.total_deposits + amount;
        if new_deposits > self.config.deposit_limit {
            return Err(BankError::CapExceeded {
                bank: self.address.clone(),
                limit: "deposit",
                requested: amount,
                remaining: (self.config.deposit_limit - self.state.total_deposits).max(Fixed::ZERO),
            });
        }

        let shares = self.state.asset_shares_for(amount, Rounding::Down)?;
        if shares.is_zero() {
            return Err(BankError::InvalidAmount(amount));
        }

        self.state.total_asset_shares = self.state.total_asset_shares + shares;
        self.state.total_deposits = new_deposits;
        balance.set_shares(balance.asset_shares() + shares, Fixed::ZERO);

        tracing::debug!(bank = %self.address.short(), amount = %amount, shares = %shares, "Deposit");
        Ok(shares)
    }

    /// Withdraw `amount` native units. Returns the shares burned.
    pub fn withdraw(&mut self, balance: &mut UserBalance, amount: Fixed) -> Result<Fixed, BankError> {
        self.check(balance, Operation::Withdraw, amount)?;
        let held = balance.asset_shares();
        let available = self.state.asset_amount(held)?;
        if amount > available {
            return Err(BankError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        self.check_liquidity(amount)?;

        let burned = self.state.asset_shares_for(amount, Rounding::Up)?.min(held);
        self.commit_withdraw(balance, amount, burned);
        Ok(burned)
    }

    /// Withdraw the whole position, burning every share. Returns the amount paid out.
    pub fn withdraw_all(&mut self, balance: &mut UserBalance) -> Result<Fixed, BankError> {
        self.check_balance_bank(balance)?;
        self.check_state(Operation::Withdraw)?;
        let held = balance.asset_shares();
        let amount = self.state.asset_amount(held)?;
        self.check_liquidity(amount)?;

        self.commit_withdraw(balance, amount, held);
        Ok(amount)
    }

    /// Borrow `amount` native units. Returns the liability shares minted.
    pub fn borrow(&mut self, balance: &mut UserBalance, amount: Fixed) -> Result<Fixed, BankError> {
        self.check(balance, Operation::Borrow, amount)?;
        if balance.asset_shares().is_positive() {
            return Err(self.mixed(Operation::Borrow, "lending"));
        }
        self.check_liquidity(amount)?;

        let new_borrows = self.state.total_borrows + amount;
        if new_borrows > self.config.borrow_limit {
            return Err(BankError::CapExceeded {
                bank: self.address.clone(),
                limit: "borrow",
                requested: amount,
                remaining: (self.config.borrow_limit - self.state.total_borrows).max(Fixed::ZERO),
            });
        }

        let shares = self.state.liability_shares_for(amount, Rounding::Up)?;

        self.state.total_liability_shares = self.state.total_liability_shares + shares;
        self.state.total_borrows = new_borrows;
        balance.set_shares(Fixed::ZERO, balance.liability_shares() + shares);

        tracing::debug!(bank = %self.address.short(), amount = %amount, shares = %shares, "Borrow");
        Ok(shares)
    }

    /// Repay `amount` native units. Returns the liability shares burned.
    pub fn repay(&mut self, balance: &mut UserBalance, amount: Fixed) -> Result<Fixed, BankError> {
        self.check(balance, Operation::Repay, amount)?;
        let held = balance.liability_shares();
        let owed = self.state.liability_amount(held)?;
        if amount > owed {
            return Err(BankError::InsufficientBalance {
                requested: amount,
                available: owed,
            });
        }

        let burned = self.state.liability_shares_for(amount, Rounding::Down)?.min(held);
        self.commit_repay(balance, amount, burned);
        Ok(burned)
    }

    /// Repay the whole debt, burning every share. Returns the amount paid in.
    pub fn repay_all(&mut self, balance: &mut UserBalance) -> Result<Fixed, BankError> {
        self.check_balance_bank(balance)?;
        self.check_state(Operation::Repay)?;
        let held = balance.liability_shares();
        let owed = self.state.liability_amount(held)?;

        self.commit_repay(balance, owed, held);
        Ok(owed)
    }

    fn commit_withdraw(&mut self, balance: &mut UserBalance, amount: Fixed, burned: Fixed) {
        self.state.total_asset_shares = (self.state.total_asset_shares - burned).max(Fixed::ZERO);
        self.state.total_deposits = (self.state.total_deposits - amount).max(Fixed::ZERO);
        balance.set_shares(balance.asset_shares() - burned, Fixed::ZERO);

        tracing::debug!(bank = %self.address.short(), amount = %amount, shares = %burned, "Withdraw");
    }

    fn commit_repay(&mut self, balance: &mut UserBalance, amount: Fixed, burned: Fixed) {
        self.state.total_liability_shares =
            (self.state.total_liability_shares - burned).max(Fixed::ZERO);
        // Rounded-up debt can exceed the native total by less than one unit
        self.state.total_borrows = (self.state.total_borrows - amount).max(Fixed::ZERO);
        balance.set_shares(Fixed::ZERO, balance.liability_shares() - burned);

        tracing::debug!(bank = %self.address.short(), amount = %amount, shares = %burned, "Repay");
    }

    fn check(&self, balance: &UserBalance, op: Operation, amount: Fixed) -> Result<(), BankError> {
        self.check_balance_bank(balance)?;
        self.check_state(op)?;
        if !amount.is_positive() || amount != amount.floor() {
            return Err(BankError::InvalidAmount(amount));
        }
        Ok(())
    }

    fn check_balance_bank(&self, balance: &UserBalance) -> Result<(), BankError> {
        if balance.bank() != &self.address {
            return Err(BankError::InvariantViolation(format!(
                "balance of bank {} applied to bank {}",
                balance.bank(),
                self.address
            )));
        }
        Ok(())
    }

    fn check_state(&self, op: Operation) -> Result<(), BankError> {
        match self.config.operational_state {
            OperationalState::Operational => Ok(()),
            OperationalState::Paused => Err(BankError::Paused {
                bank: self.address.clone(),
            }),
            OperationalState::ReduceOnly if op.increases_exposure() => Err(BankError::ReduceOnly {
                bank: self.address.clone(),
                operation: op.name(),
            }),
            OperationalState::ReduceOnly => Ok(()),
        }
    }

    fn check_liquidity(&self, amount: Fixed) -> Result<(), BankError> {
        let available = self.state.available_liquidity();
        if amount > available {
            return Err(BankError::InsufficientLiquidity {
                bank: self.address.clone(),
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    fn mixed(&self, op: Operation, holding: &'static str) -> BankError {
        BankError::MixedPosition {
            bank: self.address.clone(),
            operation: op.name(),
            holding,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{empty_bank, seeded_bank};
    use super::*;
    use rust_decimal_macros::dec;

    fn balance(bank: &Bank) -> UserBalance {
        UserBalance::empty(bank.address.clone())
    }

    #[test]
    fn test_deposit_then_withdraw_all() {
        let mut bank = empty_bank("USDC");
        let mut user = balance(&bank);

        let minted = bank.deposit(&mut user, Fixed::from(100u64)).unwrap();
        assert_eq!(minted, dec!(100));
        assert_eq!(bank.state.total_deposits, dec!(100));

        let paid = bank.withdraw_all(&mut user).unwrap();
        assert_eq!(paid, dec!(100));
        assert!(user.is_empty());
        assert_eq!(bank.state.total_asset_shares, dec!(0));
    }

    #[test]
    fn test_borrow_and_repay_all() {
        let mut bank = seeded_bank("USDC", 1_000);
        let mut user = balance(&bank);

        bank.borrow(&mut user, Fixed::from(300u64)).unwrap();
        assert_eq!(bank.state.total_borrows, dec!(300));
        assert_eq!(bank.state.available_liquidity(), dec!(700));

        let owed = bank.repay_all(&mut user).unwrap();
        assert_eq!(owed, dec!(300));
        assert!(user.is_empty());
        assert_eq!(bank.state.total_liability_shares, dec!(0));
    }

    #[test]
    fn test_mixed_positions_rejected() {
        let mut bank = seeded_bank("SOL", 1_000);
        let mut lender = balance(&bank);
        bank.deposit(&mut lender, Fixed::from(10u64)).unwrap();
        assert!(matches!(
            bank.borrow(&mut lender, Fixed::from(1u64)),
            Err(BankError::MixedPosition { .. })
        ));

        let mut borrower = balance(&bank);
        bank.borrow(&mut borrower, Fixed::from(10u64)).unwrap();
        assert!(matches!(
            bank.deposit(&mut borrower, Fixed::from(1u64)),
            Err(BankError::MixedPosition { .. })
        ));
    }

    #[test]
    fn test_failed_operation_leaves_state_untouched() {
        let mut bank = seeded_bank("SOL", 100);
        let mut user = balance(&bank);
        let before = bank.clone();

        let err = bank.borrow(&mut user, Fixed::from(101u64)).unwrap_err();
        assert!(matches!(err, BankError::InsufficientLiquidity { .. }));
        assert_eq!(bank, before);
        assert!(user.is_empty());
    }

    #[test]
    fn test_caps() {
        let mut bank = seeded_bank("SOL", 1_000);
        bank.config.borrow_limit = Fixed::from(50u64);
        bank.config.deposit_limit = Fixed::from(1_010u64);
        let mut user = balance(&bank);

        assert!(matches!(
            bank.borrow(&mut user, Fixed::from(51u64)),
            Err(BankError::CapExceeded { limit: "borrow", .. })
        ));
        let mut lender = balance(&bank);
        assert!(matches!(
            bank.deposit(&mut lender, Fixed::from(11u64)),
            Err(BankError::CapExceeded { limit: "deposit", .. })
        ));
    }

    #[test]
    fn test_operational_state_gates() {
        let mut bank = seeded_bank("SOL", 1_000);
        let mut user = balance(&bank);
        bank.borrow(&mut user, Fixed::from(10u64)).unwrap();

        bank.config.operational_state = OperationalState::ReduceOnly;
        assert!(matches!(
            bank.borrow(&mut user, Fixed::from(1u64)),
            Err(BankError::ReduceOnly { operation: "borrow", .. })
        ));
        bank.repay(&mut user, Fixed::from(5u64)).unwrap();

        bank.config.operational_state = OperationalState::Paused;
        assert!(matches!(
            bank.repay(&mut user, Fixed::from(5u64)),
            Err(BankError::Paused { .. })
        ));
    }

    #[test]
    fn test_invalid_amounts() {
        let mut bank = empty_bank("SOL");
        let mut user = balance(&bank);
        assert!(matches!(
            bank.deposit(&mut user, Fixed::ZERO),
            Err(BankError::InvalidAmount(_))
        ));
        assert!(matches!(
            bank.deposit(&mut user, Fixed::from(dec!(1.5))),
            Err(BankError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_wrong_bank_balance() {
        let mut bank = empty_bank("SOL");
        let mut other = UserBalance::empty(BankAddress::new("USDC"));
        assert!(matches!(
            bank.deposit(&mut other, Fixed::ONE),
            Err(BankError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_interest_rounds_against_user() {
        let mut bank = seeded_bank("USDC", 1_000);
        let mut user = balance(&bank);
        bank.borrow(&mut user, Fixed::from(300u64)).unwrap();

        // 300 debt grows to 300.5: user owes 301
        bank.state.total_borrows = Fixed::from(dec!(300.5));
        let (_, owed) = bank.balance_amounts(&user).unwrap();
        assert_eq!(owed, dec!(301));

        assert!(matches!(
            bank.repay(&mut user, Fixed::from(302u64)),
            Err(BankError::InsufficientBalance { .. })
        ));
        assert_eq!(bank.repay_all(&mut user).unwrap(), dec!(301));
        assert_eq!(bank.state.total_borrows, dec!(0));
    }

    #[test]
    fn test_withdraw_more_than_held() {
        let mut bank = seeded_bank("USDC", 1_000);
        let mut user = balance(&bank);
        bank.deposit(&mut user, Fixed::from(10u64)).unwrap();
        assert!(matches!(
            bank.withdraw(&mut user, Fixed::from(11u64)),
            Err(BankError::InsufficientBalance { .. })
        ));
        let burned = bank.withdraw(&mut user, Fixed::from(4u64)).unwrap();
        assert_eq!(burned, dec!(4));
        assert_eq!(user.asset_shares(), dec!(6));
    }
}
