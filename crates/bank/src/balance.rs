//! User balances
//!
//! A balance is a pure lending position or a pure borrowing position, never
//! both. The share fields are private and every mutation path re-checks
//! that rule; a snapshot that violates it fails to load.

use lendrisk_core::{BankAddress, Fixed};
use serde::{Deserialize, Serialize};

use crate::error::BankError;

/// Side of a non-empty balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSide {
    Assets,
    Liabilities,
}

/// One user's position in one bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBalance", into = "RawBalance")]
pub struct UserBalance {
    bank: BankAddress,
    asset_shares: Fixed,
    liability_shares: Fixed,
}

#[derive(Serialize, Deserialize)]
struct RawBalance {
    bank: BankAddress,
    #[serde(default)]
    asset_shares: Fixed,
    #[serde(default)]
    liability_shares: Fixed,
}

impl TryFrom<RawBalance> for UserBalance {
    type Error = BankError;

    fn try_from(raw: RawBalance) -> Result<Self, Self::Error> {
        Self::checked(raw.bank, raw.asset_shares, raw.liability_shares)
    }
}

impl From<UserBalance> for RawBalance {
    fn from(balance: UserBalance) -> Self {
        Self {
            bank: balance.bank,
            asset_shares: balance.asset_shares,
            liability_shares: balance.liability_shares,
        }
    }
}

impl UserBalance {
    /// # Panics
    /// When both share fields are non-zero or either is negative.
    pub fn new(bank: BankAddress, asset_shares: Fixed, liability_shares: Fixed) -> Self {
        match Self::checked(bank, asset_shares, liability_shares) {
            Ok(balance) => balance,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible constructor for untrusted ledger data
    pub fn checked(bank: BankAddress, asset_shares: Fixed, liability_shares: Fixed) -> Result<Self, BankError> {
        if asset_shares.is_negative() || liability_shares.is_negative() {
            return Err(BankError::InvariantViolation(format!(
                "negative shares in bank {bank}: assets {asset_shares}, liabilities {liability_shares}"
            )));
        }
        if asset_shares.is_positive() && liability_shares.is_positive() {
            return Err(BankError::InvariantViolation(format!(
                "balance in bank {bank} holds both asset shares {asset_shares} and liability shares {liability_shares}"
            )));
        }
        Ok(Self {
            bank,
            asset_shares,
            liability_shares,
        })
    }

    pub fn empty(bank: BankAddress) -> Self {
        Self {
            bank,
            asset_shares: Fixed::ZERO,
            liability_shares: Fixed::ZERO,
        }
    }

    pub fn lending(bank: BankAddress, shares: Fixed) -> Self {
        Self::new(bank, shares, Fixed::ZERO)
    }

    pub fn borrowing(bank: BankAddress, shares: Fixed) -> Self {
        Self::new(bank, Fixed::ZERO, shares)
    }

    pub fn bank(&self) -> &BankAddress {
        &self.bank
    }

    pub fn asset_shares(&self) -> Fixed {
        self.asset_shares
    }

    pub fn liability_shares(&self) -> Fixed {
        self.liability_shares
    }

    pub fn is_empty(&self) -> bool {
        self.asset_shares.is_zero() && self.liability_shares.is_zero()
    }

    pub fn side(&self) -> Option<BalanceSide> {
        if self.asset_shares.is_positive() {
            Some(BalanceSide::Assets)
        } else if self.liability_shares.is_positive() {
            Some(BalanceSide::Liabilities)
        } else {
            None
        }
    }

    /// Replace both share fields. Only bank operations call this, after
    /// computing the new values.
    pub(crate) fn set_shares(&mut self, asset_shares: Fixed, liability_shares: Fixed) {
        assert!(
            !(asset_shares.is_positive() && liability_shares.is_positive()),
            "balance in bank {} would hold both asset and liability shares",
            self.bank
        );
        assert!(
            !asset_shares.is_negative() && !liability_shares.is_negative(),
            "balance in bank {} would hold negative shares",
            self.bank
        );
        self.asset_shares = asset_shares;
        self.liability_shares = liability_shares;
    }
}

/// A user's balances across banks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    balances: Vec<UserBalance>,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            balances: Vec::new(),
        }
    }

    /// # Panics
    /// When two balances point at the same bank.
    pub fn with_balances(id: impl Into<String>, balances: Vec<UserBalance>) -> Self {
        let account = Self {
            id: id.into(),
            balances,
        };
        if let Err(e) = account.validate() {
            panic!("{e}");
        }
        account
    }

    /// One balance per bank
    pub fn validate(&self) -> Result<(), BankError> {
        for (i, balance) in self.balances.iter().enumerate() {
            if self.balances[..i].iter().any(|b| b.bank == balance.bank) {
                return Err(BankError::InvariantViolation(format!(
                    "account {} has two balances in bank {}",
                    self.id, balance.bank
                )));
            }
        }
        Ok(())
    }

    /// All balances, empty ones included
    pub fn balances(&self) -> &[UserBalance] {
        &self.balances
    }

    pub fn active_balances(&self) -> impl Iterator<Item = &UserBalance> {
        self.balances.iter().filter(|b| !b.is_empty())
    }

    pub fn balance(&self, bank: &BankAddress) -> Option<&UserBalance> {
        self.balances.iter().find(|b| &b.bank == bank)
    }

    /// Balance for `bank`, created empty when absent
    pub fn balance_mut(&mut self, bank: &BankAddress) -> &mut UserBalance {
        let idx = match self.balances.iter().position(|b| &b.bank == bank) {
            Some(idx) => idx,
            None => {
                self.balances.push(UserBalance::empty(bank.clone()));
                self.balances.len() - 1
            }
        };
        &mut self.balances[idx]
    }

    /// Banks this account owes to
    pub fn liability_banks(&self) -> impl Iterator<Item = &BankAddress> {
        self.balances
            .iter()
            .filter(|b| b.side() == Some(BalanceSide::Liabilities))
            .map(|b| &b.bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sides() {
        let sol = BankAddress::new("SOL");
        assert_eq!(UserBalance::empty(sol.clone()).side(), None);
        assert_eq!(
            UserBalance::lending(sol.clone(), Fixed::ONE).side(),
            Some(BalanceSide::Assets)
        );
        assert_eq!(
            UserBalance::borrowing(sol, Fixed::ONE).side(),
            Some(BalanceSide::Liabilities)
        );
    }

    #[test]
    #[should_panic(expected = "holds both asset shares")]
    fn test_mixed_balance_panics() {
        UserBalance::new(BankAddress::new("SOL"), Fixed::ONE, Fixed::ONE);
    }

    #[test]
    fn test_corrupt_snapshot_fails_to_load() {
        let json = r#"{"bank":"SOL","asset_shares":"1","liability_shares":"2"}"#;
        let err = serde_json::from_str::<UserBalance>(json).unwrap_err();
        assert!(err.to_string().contains("Invariant violation"));

        let ok = r#"{"bank":"SOL","asset_shares":"1.5"}"#;
        let balance: UserBalance = serde_json::from_str(ok).unwrap();
        assert_eq!(balance.asset_shares(), dec!(1.5));
        assert_eq!(balance.liability_shares(), dec!(0));
    }

    #[test]
    fn test_account_balance_mut_inserts_once() {
        let mut account = Account::new("alice");
        let sol = BankAddress::new("SOL");
        account.balance_mut(&sol);
        account.balance_mut(&sol);
        assert_eq!(account.balances().len(), 1);
        assert_eq!(account.active_balances().count(), 0);
    }

    #[test]
    fn test_duplicate_bank_rejected() {
        let sol = BankAddress::new("SOL");
        let account = Account {
            id: "bob".into(),
            balances: vec![UserBalance::empty(sol.clone()), UserBalance::empty(sol)],
        };
        assert!(matches!(account.validate(), Err(BankError::InvariantViolation(_))));
    }
}
