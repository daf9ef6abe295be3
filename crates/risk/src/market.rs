//! Point-in-time banks and prices

use lendrisk_bank::Bank;
use lendrisk_core::BankAddress;
use lendrisk_oracle::BoundedPrice;
use std::collections::HashMap;

use crate::error::RiskError;

/// Everything one risk computation reads.
///
/// Each call owns or borrows its own copy, so a ledger update during a
/// computation never leaks into it.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub banks: HashMap<BankAddress, Bank>,
    pub prices: HashMap<BankAddress, BoundedPrice>,
}

impl MarketSnapshot {
    pub fn new(banks: HashMap<BankAddress, Bank>, prices: HashMap<BankAddress, BoundedPrice>) -> Self {
        Self { banks, prices }
    }

    pub fn with_bank(mut self, bank: Bank, price: BoundedPrice) -> Self {
        self.prices.insert(bank.address.clone(), price);
        self.banks.insert(bank.address.clone(), bank);
        self
    }

    pub fn bank(&self, address: &BankAddress) -> Result<&Bank, RiskError> {
        self.banks.get(address).ok_or_else(|| RiskError::BankNotFound {
            bank: address.clone(),
        })
    }

    pub fn bank_mut(&mut self, address: &BankAddress) -> Result<&mut Bank, RiskError> {
        self.banks.get_mut(address).ok_or_else(|| RiskError::BankNotFound {
            bank: address.clone(),
        })
    }

    /// A usable price. Zero prices are unavailable, never a market value.
    pub fn price(&self, address: &BankAddress) -> Result<&BoundedPrice, RiskError> {
        match self.prices.get(address) {
            Some(price) if !price.is_zero() => Ok(price),
            _ => {
                tracing::warn!(bank = %address.short(), "No usable price for bank");
                Err(RiskError::ZeroOrMissingPrice {
                    bank: address.clone(),
                })
            }
        }
    }

    pub fn set_price(&mut self, address: BankAddress, price: BoundedPrice) {
        self.prices.insert(address, price);
    }
}
