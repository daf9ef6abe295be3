//! Lendrisk Core - Numeric domain types
//!
//! This crate contains the fundamental types used across Lendrisk:
//! - `Fixed`: Deterministic decimal wrapper for every monetary quantity
//! - `Rounding`: The rounding modes the engine is allowed to use
//! - `Bps`: Basis points (1/10_000)
//! - `BankAddress`: Key of a bank across ledger, oracle and risk maps
//! - Wire codec for the 48-fractional-bit ledger encoding

pub mod address;
pub mod bps;
pub mod error;
pub mod fixed;
pub mod wire;

pub use address::BankAddress;
pub use bps::Bps;
pub use error::CoreError;
pub use fixed::{Fixed, Rounding, MAX_MINT_DECIMALS};
pub use wire::WrappedI80F48;
