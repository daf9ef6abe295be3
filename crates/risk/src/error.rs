//! Risk engine errors

use lendrisk_bank::BankError;
use lendrisk_core::{BankAddress, CoreError};
use lendrisk_rates::RateError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    /// No usable price: absent from the snapshot or reported as zero
    #[error("Zero or missing price for bank {bank}")]
    ZeroOrMissingPrice { bank: BankAddress },

    #[error("Bank not found in snapshot: {bank}")]
    BankNotFound { bank: BankAddress },

    #[error("Leverage is unbounded: {deposit_bank} collateral fully covers {borrow_bank} debt")]
    UnboundedLeverage {
        deposit_bank: BankAddress,
        borrow_bank: BankAddress,
    },

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error("Arithmetic error: {0}")]
    Core(#[from] CoreError),
}
