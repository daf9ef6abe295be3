//! Application context - wires config, snapshot and collaborators together

use chrono::Utc;
use lendrisk_bank::{LedgerReader, MemoryLedger};
use lendrisk_core::BankAddress;
use lendrisk_looping::FixedRateQuoter;
use lendrisk_oracle::{fetch_bounded, MockPriceFeed};
use lendrisk_risk::MarketSnapshot;
use std::collections::HashMap;
use std::path::Path;

use crate::config::LendriskConfig;
use crate::snapshot::SnapshotFile;

pub struct AppContext {
    pub config: LendriskConfig,
    pub ledger: MemoryLedger,
    pub feed: MockPriceFeed,
    pub quoter: FixedRateQuoter,
    now: i64,
}

impl AppContext {
    pub fn new(config: LendriskConfig, snapshot: SnapshotFile) -> Self {
        let now = snapshot.now.unwrap_or_else(|| Utc::now().timestamp());
        let feed = MockPriceFeed::with_prices(
            snapshot
                .prices
                .into_iter()
                .map(|entry| (entry.bank, entry.observation)),
        );
        Self {
            config,
            ledger: MemoryLedger::from_snapshot(snapshot.ledger),
            feed,
            quoter: FixedRateQuoter::from_rates(snapshot.swap_rates),
            now,
        }
    }

    pub fn load(config: LendriskConfig, snapshot_path: &Path) -> anyhow::Result<Self> {
        let snapshot = SnapshotFile::load(snapshot_path)?;
        let ctx = Self::new(config, snapshot);
        tracing::debug!(
            snapshot = %snapshot_path.display(),
            banks = ctx.ledger.bank_addresses().len(),
            prices = ctx.feed.len(),
            swap_rates = ctx.quoter.len(),
            now = ctx.now,
            "Loaded snapshot"
        );
        Ok(ctx)
    }

    /// Evaluation time, unix seconds
    pub fn now(&self) -> i64 {
        self.now
    }

    /// Banks and bounded prices for `banks`, as of [`now`](Self::now).
    ///
    /// Fails on the first missing bank or missing, stale or invalid price.
    pub async fn market(&self, banks: &[BankAddress]) -> anyhow::Result<MarketSnapshot> {
        let mut addresses = banks.to_vec();
        addresses.sort();
        addresses.dedup();

        let mut bank_map = HashMap::with_capacity(addresses.len());
        for address in &addresses {
            let bank = self.ledger.get_bank(address).await?;
            bank_map.insert(address.clone(), bank);
        }
        let prices = fetch_bounded(&self.feed, &addresses, &self.config.oracle, self.now).await?;
        Ok(MarketSnapshot::new(bank_map, prices))
    }
}
