//! Planner errors
//!
//! Up-front rejections, aborts and non-convergence are all recoverable:
//! the caller may retry with a lower target or a looser slippage limit.

use lendrisk_bank::BankError;
use lendrisk_core::{BankAddress, Bps, CoreError, Fixed};
use lendrisk_risk::RiskError;
use thiserror::Error;

use crate::plan::AdvisoryPlan;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("No swap route from {input} to {output}")]
    NoRoute { input: BankAddress, output: BankAddress },

    #[error("Invalid swap amount: {0}")]
    InvalidAmount(Fixed),

    #[error("Quoter unavailable: {0}")]
    Unavailable(String),
}

/// Why a plan was abandoned mid-way
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    #[error("Price impact {impact} exceeds the {max} slippage limit")]
    SlippageExceeded { impact: Bps, max: Bps },

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

    #[error("Projected initial health is negative: net {net}")]
    Undercollateralized { net: Fixed },

    #[error("Swap quote failed: {0}")]
    Quote(#[from] QuoteError),

    #[error("Cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    #[error("Target leverage {0} is below 1")]
    InvalidTarget(Fixed),

    #[error("Target leverage {target} exceeds the maximum {max}")]
    LeverageTooHigh { target: Fixed, max: Fixed },

    #[error("Bank {0} is not operational")]
    BankNotOperational(BankAddress),

    #[error("Principal {0} must be at least one native unit")]
    InvalidPrincipal(Fixed),

    #[error("Deposit and borrow bank are the same: {0}")]
    SameBank(BankAddress),

    #[error("Invalid planner config: {0}")]
    InvalidConfig(String),

    #[error("Plan aborted: {0}")]
    Aborted(AbortReason),

    /// Carries the best partial plan. Never submit it.
    #[error(
        "Did not converge after {iterations} iterations ({reason}); best plan is advisory only",
        iterations = .0.iterations(),
        reason = .0.reason()
    )]
    DidNotConverge(Box<AdvisoryPlan>),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Bank(BankError),

    #[error("Arithmetic error: {0}")]
    Core(#[from] CoreError),
}

impl LoopError {
    /// Retrying with adjusted parameters may succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            LoopError::Risk(_) | LoopError::Bank(_) | LoopError::Core(_) | LoopError::InvalidConfig(_)
        )
    }
}

impl From<AbortReason> for LoopError {
    fn from(reason: AbortReason) -> Self {
        LoopError::Aborted(reason)
    }
}

/// Liquidity and cap failures of a simulated bank operation are aborts
impl From<BankError> for LoopError {
    fn from(e: BankError) -> Self {
        match e {
            BankError::InsufficientLiquidity {
                bank,
                requested,
                available,
            } => AbortReason::InsufficientLiquidity {
                bank,
                requested,
                available,
            }
            .into(),
            BankError::CapExceeded {
                bank,
                limit,
                requested,
                remaining,
            } => AbortReason::CapExceeded {
                bank,
                limit,
                requested,
                remaining,
            }
            .into(),
            other => LoopError::Bank(other),
        }
    }
}
