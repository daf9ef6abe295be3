//! Swap quoting
//!
//! The planner only reads `(output_amount, price_impact_bps, instructions)`
//! from a quote; routing is the quoter's business.

use async_trait::async_trait;
use lendrisk_core::{BankAddress, Bps, Fixed};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::QuoteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    /// UI units of the output asset, after slippage
    pub output_amount: Fixed,
    pub price_impact_bps: Bps,
    /// Opaque, passed through to the submitter
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// External swap aggregator
#[async_trait]
pub trait SwapQuoter: Send + Sync {
    /// Quote selling `amount` (UI units) of `input`'s asset for `output`'s asset
    async fn quote(
        &self,
        input: &BankAddress,
        output: &BankAddress,
        amount: Fixed,
        max_slippage_bps: Bps,
    ) -> Result<SwapQuote, QuoteError>;
}

/// A fixed exchange rate between two banks' assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRate {
    pub input: BankAddress,
    pub output: BankAddress,
    /// Output units per input unit, before impact
    pub rate: Fixed,
    #[serde(default)]
    pub price_impact_bps: Bps,
}

/// Quoter over a static rate table
#[derive(Debug, Clone, Default)]
pub struct FixedRateQuoter {
    rates: HashMap<(BankAddress, BankAddress), SwapRate>,
}

impl FixedRateQuoter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rates(rates: impl IntoIterator<Item = SwapRate>) -> Self {
        let mut quoter = Self::new();
        for rate in rates {
            quoter.insert(rate);
        }
        quoter
    }

    pub fn with_rate(mut self, input: &str, output: &str, rate: Fixed, price_impact_bps: Bps) -> Self {
        self.insert(SwapRate {
            input: BankAddress::new(input),
            output: BankAddress::new(output),
            rate,
            price_impact_bps,
        });
        self
    }

    pub fn insert(&mut self, rate: SwapRate) {
        self.rates
            .insert((rate.input.clone(), rate.output.clone()), rate);
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
impl SwapQuoter for FixedRateQuoter {
    async fn quote(
        &self,
        input: &BankAddress,
        output: &BankAddress,
        amount: Fixed,
        _max_slippage_bps: Bps,
    ) -> Result<SwapQuote, QuoteError> {
        if !amount.is_positive() {
            return Err(QuoteError::InvalidAmount(amount));
        }
        let rate = self
            .rates
            .get(&(input.clone(), output.clone()))
            .ok_or_else(|| QuoteError::NoRoute {
                input: input.clone(),
                output: output.clone(),
            })?;

        let output_amount = amount * rate.rate * (Fixed::ONE - rate.price_impact_bps.as_fraction());
        tracing::debug!(
            input = %input.short(),
            output = %output.short(),
            amount = %amount,
            output_amount = %output_amount,
            impact = %rate.price_impact_bps,
            "Quoted swap"
        );
        Ok(SwapQuote {
            output_amount,
            price_impact_bps: rate.price_impact_bps,
            instructions: vec![format!("swap {amount} {input} -> {output_amount} {output}")],
        })
    }
}
