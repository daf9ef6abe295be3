//! Lendrisk Risk Engine
//!
//! Aggregates an account's balances across banks into weighted health
//! components. All functions are pure over a [`MarketSnapshot`]:
//! - `compute_health` / `assess`: health under a requirement type
//! - `liquidation_price`: closed-form price at which Maintenance health hits zero
//! - `free_collateral`, `max_borrow`, `max_withdraw`: Initial-requirement headroom
//! - `max_leverage`, `account_value`, `net_apy`

pub mod error;
pub mod health;
pub mod limits;
pub mod liquidation;
pub mod market;
pub mod portfolio;

pub use error::RiskError;
pub use health::{assess, compute_health, value_positions, AccountHealth, HealthAssessment, PositionValue};
pub use lendrisk_bank::RequirementType;
pub use limits::{free_collateral, max_borrow, max_withdraw};
pub use liquidation::liquidation_price;
pub use market::MarketSnapshot;
pub use portfolio::{account_value, max_leverage, net_apy, MaxLeverage};
