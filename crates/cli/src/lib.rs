//! Lendrisk CLI - snapshot-driven front end
//!
//! Loads `lendrisk.toml` and a JSON snapshot, then runs one command against
//! the in-memory ledger, price feed and quoter built from it.

pub mod commands;
pub mod config;
pub mod context;
pub mod snapshot;

pub use config::{ConfigError, ConfigLoader, LendriskConfig};
pub use context::AppContext;
pub use snapshot::{PriceEntry, SnapshotFile};
