//! Price feed interface
//!
//! Feeds return raw observations. Bounding always goes through
//! [`OracleConfig`] so no consumer ever sees an uncapped confidence.

use async_trait::async_trait;
use lendrisk_core::BankAddress;
use std::collections::HashMap;

use crate::error::OracleError;
use crate::model::OracleConfig;
use crate::types::{BoundedPrice, OraclePrice};

/// Source of raw oracle observations, keyed by bank.
///
/// Implementations can be:
/// - MockPriceFeed: fixed observations for tests and offline snapshots
/// - REST or websocket backed feeds living outside this workspace
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Latest raw observation for a bank
    async fn get_price(&self, bank: &BankAddress) -> Result<OraclePrice, OracleError>;

    /// Get observations for several banks at once
    async fn get_prices(&self, banks: &[BankAddress]) -> Vec<Result<OraclePrice, OracleError>> {
        let mut results = Vec::with_capacity(banks.len());
        for bank in banks {
            results.push(self.get_price(bank).await);
        }
        results
    }
}

/// Fetch and bound prices for every bank, failing on the first bank whose
/// price is missing, stale or invalid.
pub async fn fetch_bounded(
    feed: &dyn PriceFeed,
    banks: &[BankAddress],
    config: &OracleConfig,
    now: i64,
) -> Result<HashMap<BankAddress, BoundedPrice>, OracleError> {
    let observations = feed.get_prices(banks).await;
    let mut bounded = HashMap::with_capacity(banks.len());

    for (bank, observation) in banks.iter().zip(observations) {
        let price = observation.and_then(|obs| config.bound(&obs, now)).map_err(|e| {
            tracing::warn!(bank = %bank.short(), error = %e, "Price unavailable");
            e
        })?;
        tracing::debug!(
            bank = %bank.short(),
            price = %price.realtime.price,
            confidence = %price.realtime.confidence(),
            "Bounded oracle price"
        );
        bounded.insert(bank.clone(), price);
    }

    Ok(bounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPriceFeed;
    use lendrisk_core::Fixed;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fetch_bounded_all_fresh() {
        let feed = MockPriceFeed::new();
        let sol = BankAddress::new("SOL");
        let usdc = BankAddress::new("USDC");
        feed.set_price(sol.clone(), OraclePrice::new(Fixed::from(dec!(150)), Fixed::from(dec!(0.5)), 100));
        feed.set_price(usdc.clone(), OraclePrice::new(Fixed::ONE, Fixed::from(dec!(0.001)), 100));

        let prices = fetch_bounded(&feed, &[sol.clone(), usdc.clone()], &OracleConfig::default(), 110)
            .await
            .unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[&sol].realtime.low, dec!(149.5));
        assert_eq!(prices[&usdc].realtime.high, dec!(1.001));
    }

    #[tokio::test]
    async fn test_fetch_bounded_fails_closed_on_stale() {
        let feed = MockPriceFeed::new();
        let sol = BankAddress::new("SOL");
        let usdc = BankAddress::new("USDC");
        feed.set_price(sol.clone(), OraclePrice::new(Fixed::from(dec!(150)), Fixed::ZERO, 0));
        feed.set_price(usdc.clone(), OraclePrice::new(Fixed::ONE, Fixed::ZERO, 1_000));

        let result = fetch_bounded(&feed, &[usdc, sol], &OracleConfig::default(), 1_000).await;
        assert!(matches!(result, Err(OracleError::StalePrice { .. })));
    }

    #[tokio::test]
    async fn test_fetch_bounded_missing_feed() {
        let feed = MockPriceFeed::new();
        let result = fetch_bounded(&feed, &[BankAddress::new("JUP")], &OracleConfig::default(), 0).await;
        assert!(matches!(result, Err(OracleError::FeedNotFound { .. })));
    }
}
