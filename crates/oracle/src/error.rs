//! Oracle error types

use lendrisk_core::{BankAddress, Fixed};
use thiserror::Error;

/// Oracle-related errors
#[derive(Debug, Error)]
pub enum OracleError {
    /// No feed is configured for the bank
    #[error("Price feed not found for bank {bank}")]
    FeedNotFound { bank: BankAddress },

    /// Price data is older than the configured max age
    #[error("Stale price: observed {age_secs}s ago, max age is {max_age_secs}s")]
    StalePrice { age_secs: i64, max_age_secs: u64 },

    /// Price is zero; the market value is unavailable
    #[error("Zero or missing price")]
    ZeroOrMissingPrice,

    /// Price data is invalid
    #[error("Invalid price {price}: {reason}")]
    InvalidPrice { price: Fixed, reason: &'static str },

    /// Oracle configuration rejected
    #[error("Invalid oracle config: {0}")]
    InvalidConfig(String),
}

impl OracleError {
    /// Stale and zero prices mean "no usable price right now"
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            OracleError::StalePrice { .. } | OracleError::ZeroOrMissingPrice
        )
    }
}
