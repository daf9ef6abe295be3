//! Snapshot file: ledger contents, raw oracle observations and swap rates
//!
//! ```json
//! {
//!   "now": 1700000000,
//!   "banks": [ ... ],
//!   "accounts": [ ... ],
//!   "prices": [{ "bank": "SOL", "price": "150", "confidence": "0.4", "timestamp": 1700000000 }],
//!   "swap_rates": [{ "input": "USDC", "output": "SOL", "rate": "0.0066", "price_impact_bps": 10 }]
//! }
//! ```
//!
//! `now` pins the evaluation time; without it the wall clock is used.

use lendrisk_bank::LedgerSnapshot;
use lendrisk_core::BankAddress;
use lendrisk_looping::SwapRate;
use lendrisk_oracle::OraclePrice;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub bank: BankAddress,
    #[serde(flatten)]
    pub observation: OraclePrice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub now: Option<i64>,
    #[serde(flatten)]
    pub ledger: LedgerSnapshot,
    #[serde(default)]
    pub prices: Vec<PriceEntry>,
    #[serde(default)]
    pub swap_rates: Vec<SwapRate>,
}

impl SnapshotFile {
    /// Parse and validate; corrupt balances are rejected here
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.ledger.validate()?;
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read snapshot {}: {e}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_minimal() {
        let snapshot = SnapshotFile::from_json("{}").unwrap();
        assert_eq!(snapshot, SnapshotFile::default());
    }

    #[test]
    fn test_parse_prices_and_rates() {
        let json = r#"{
            "now": 100,
            "prices": [{ "bank": "SOL", "price": "150", "confidence": "0.4", "timestamp": 90,
                         "ema_price": "149" }],
            "swap_rates": [{ "input": "USDC", "output": "SOL", "rate": "0.0066" }]
        }"#;
        let snapshot = SnapshotFile::from_json(json).unwrap();

        assert_eq!(snapshot.now, Some(100));
        let entry = &snapshot.prices[0];
        assert_eq!(entry.bank, BankAddress::new("SOL"));
        assert_eq!(entry.observation.price, dec!(150));
        assert_eq!(entry.observation.ema_price.unwrap(), dec!(149));
        assert_eq!(snapshot.swap_rates[0].rate, dec!(0.0066));
    }

    #[test]
    fn test_mixed_balance_is_rejected() {
        let json = r#"{
            "accounts": [{ "id": "a", "balances": [
                { "bank": "SOL", "asset_shares": "1", "liability_shares": "1" }
            ]}]
        }"#;
        assert!(SnapshotFile::from_json(json).is_err());
    }
}
