//! Lendrisk Interest Rate Model
//!
//! Converts pool utilization into borrow and lend APR:
//! - `RateCurve`: legacy three-point curve or multipoint curve
//! - `InterestRateConfig`: curve plus the fee splits taken from borrow interest
//! - APR to APY compounding and simple accrual over an interval

pub mod apy;
pub mod curve;
pub mod error;
pub mod model;

pub use apy::{accrual_factor, apr_to_apy, HOURS_PER_YEAR, SECONDS_PER_YEAR};
pub use curve::{CurvePoint, RateCurve, MAX_CURVE_POINTS};
pub use error::RateError;
pub use model::{rates, utilization, BankRates, InterestRateConfig};
