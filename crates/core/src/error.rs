//! Core numeric errors

use thiserror::Error;

/// Errors that can occur in fixed-point arithmetic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Value out of range for {target}: {value}")]
    OutOfRange { target: &'static str, value: String },

    #[error("Invalid decimal literal: {0}")]
    Parse(String),
}
