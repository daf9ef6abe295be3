//! Rate model errors

use lendrisk_core::{CoreError, Fixed};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error("Invalid rate curve: {0}")]
    InvalidCurve(String),

    #[error("Fee fractions must sum below 1: protocol {protocol} + insurance {insurance}")]
    FeesTooHigh { protocol: Fixed, insurance: Fixed },

    #[error("Arithmetic error: {0}")]
    Core(#[from] CoreError),
}
