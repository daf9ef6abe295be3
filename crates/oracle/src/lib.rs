//! Lendrisk Price Oracle
//!
//! Turns raw (price, confidence, timestamp) observations into bounded price
//! ranges. Every downstream valuation reads prices through this crate.

mod error;
mod feed;
mod mock;
mod model;
mod types;

pub use error::OracleError;
pub use feed::{fetch_bounded, PriceFeed};
pub use mock::MockPriceFeed;
pub use model::OracleConfig;
pub use types::{BoundedPrice, OraclePrice, PriceBias, PriceRange};
