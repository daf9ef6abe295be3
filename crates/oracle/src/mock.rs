//! Mock price feed for testing
//!
//! Serves fixed observations that can be updated programmatically.

use async_trait::async_trait;
use lendrisk_core::{BankAddress, Fixed};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::OracleError;
use crate::feed::PriceFeed;
use crate::types::OraclePrice;

/// In-memory price feed.
///
/// Used by unit tests and by the CLI when prices come from a snapshot file.
#[derive(Default)]
pub struct MockPriceFeed {
    prices: RwLock<HashMap<BankAddress, OraclePrice>>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a feed from a list of observations
    pub fn with_prices(prices: impl IntoIterator<Item = (BankAddress, OraclePrice)>) -> Self {
        Self {
            prices: RwLock::new(prices.into_iter().collect()),
        }
    }

    pub fn set_price(&self, bank: BankAddress, price: OraclePrice) {
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        prices.insert(bank, price);
    }

    /// Set a price with zero confidence
    pub fn set_simple(&self, bank: BankAddress, price: Fixed, timestamp: i64) {
        self.set_price(bank, OraclePrice::new(price, Fixed::ZERO, timestamp));
    }

    /// Remove a price (for testing missing feeds)
    pub fn remove_price(&self, bank: &BankAddress) {
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        prices.remove(bank);
    }

    pub fn len(&self) -> usize {
        self.prices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn get_price(&self, bank: &BankAddress) -> Result<OraclePrice, OracleError> {
        let prices = self.prices.read().unwrap_or_else(PoisonError::into_inner);
        prices
            .get(bank)
            .cloned()
            .ok_or_else(|| OracleError::FeedNotFound { bank: bank.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_feed_set_and_remove() {
        let feed = MockPriceFeed::new();
        let bonk = BankAddress::new("BONK");

        assert!(feed.get_price(&bonk).await.is_err());

        feed.set_simple(bonk.clone(), Fixed::from(dec!(0.00002)), 42);
        let price = feed.get_price(&bonk).await.unwrap();
        assert_eq!(price.price, dec!(0.00002));
        assert_eq!(price.timestamp, 42);
        assert_eq!(feed.len(), 1);

        feed.remove_price(&bonk);
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_mock_feed_batch() {
        let feed = MockPriceFeed::with_prices([
            (BankAddress::new("SOL"), OraclePrice::new(Fixed::from(150i64), Fixed::ZERO, 0)),
        ]);
        let results = feed
            .get_prices(&[BankAddress::new("SOL"), BankAddress::new("ETH")])
            .await;
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(OracleError::FeedNotFound { .. })));
    }
}
