//! Lendrisk Bank Accounting
//!
//! Share-based deposit/borrow ledger for single-asset banks.
//!
//! A [`Bank`] pairs its static [`BankConfig`] with the mutable [`BankState`].
//! Deposits, withdrawals, borrows and repayments update the bank totals and
//! the user's [`UserBalance`] together or not at all.

pub mod balance;
pub mod bank;
pub mod config;
pub mod error;
pub mod ledger;
pub mod shares;
pub mod state;

pub use balance::{Account, BalanceSide, UserBalance};
pub use bank::Bank;
pub use config::{BankConfig, OperationalState, RequirementType, RiskTier};
pub use error::BankError;
pub use ledger::{LedgerReader, LedgerSnapshot, MemoryLedger};
pub use shares::{amount_to_shares, shares_to_amount, SHARE_DECIMALS};
pub use state::{BankState, RemainingCapacity};
