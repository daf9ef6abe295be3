//! Bank accounting errors

use lendrisk_core::{BankAddress, CoreError, Fixed};
use lendrisk_rates::RateError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("Bank not found: {0}")]
    BankNotFound(BankAddress),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Bank {bank} is paused")]
    Paused { bank: BankAddress },

    #[error("Bank {bank} is reduce-only: {operation} rejected")]
    ReduceOnly {
        bank: BankAddress,
        operation: &'static str,
    },

    /// A deposit into a balance that owes, or a borrow against one that lends
    #[error("Mixed position rejected in bank {bank}: cannot {operation} while {holding}")]
    MixedPosition {
        bank: BankAddress,
        operation: &'static str,
        holding: &'static str,
    },

    #[error("Invalid amount {0}: must be a positive whole number of native units")]
    InvalidAmount(Fixed),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Fixed, available: Fixed },

    #[error("Insufficient liquidity in bank {bank}: requested {requested}, available {available}")]
    InsufficientLiquidity {
        bank: BankAddress,
        requested: Fixed,
        available: Fixed,
    },

    #[error("{limit} cap exceeded in bank {bank}: requested {requested}, remaining {remaining}")]
    CapExceeded {
        bank: BankAddress,
        limit: &'static str,
        requested: Fixed,
        remaining: Fixed,
    },

    /// Ledger data that can only come from corruption upstream
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Mint decimals {decimals} exceed the supported maximum of {max}")]
    UnsupportedDecimals { decimals: u8, max: u8 },

    #[error("Invalid bank config: {0}")]
    InvalidConfig(String),

    #[error("Snapshot decode failed: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error("Arithmetic error: {0}")]
    Core(#[from] CoreError),
}
