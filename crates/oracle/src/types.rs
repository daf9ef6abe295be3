//! Core oracle types

use lendrisk_core::Fixed;
use serde::{Deserialize, Serialize};

/// A raw oracle observation, before confidence capping.
///
/// `ema_price` / `ema_confidence` carry the feed's time-weighted pair when the
/// oracle publishes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    pub price: Fixed,
    pub confidence: Fixed,
    /// Unix seconds of publication
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ema_price: Option<Fixed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ema_confidence: Option<Fixed>,
}

impl OraclePrice {
    pub fn new(price: Fixed, confidence: Fixed, timestamp: i64) -> Self {
        Self {
            price,
            confidence,
            timestamp,
            ema_price: None,
            ema_confidence: None,
        }
    }

    /// Attach a time-weighted price and confidence
    pub fn with_ema(mut self, ema_price: Fixed, ema_confidence: Fixed) -> Self {
        self.ema_price = Some(ema_price);
        self.ema_confidence = Some(ema_confidence);
        self
    }
}

/// Which end of the range a valuation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBias {
    Lowest,
    None,
    Highest,
}

/// A confidence-bounded price.
///
/// # Invariant
/// `low <= price <= high`, and `high - price == price - low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: Fixed,
    pub price: Fixed,
    pub high: Fixed,
}

impl PriceRange {
    pub const ZERO: Self = Self {
        low: Fixed::ZERO,
        price: Fixed::ZERO,
        high: Fixed::ZERO,
    };

    /// Range of `price ∓ half_width`. The caller has already capped `half_width`.
    pub fn around(price: Fixed, half_width: Fixed) -> Self {
        Self {
            low: price - half_width,
            price,
            high: price + half_width,
        }
    }

    pub fn get(&self, bias: PriceBias) -> Fixed {
        match bias {
            PriceBias::Lowest => self.low,
            PriceBias::None => self.price,
            PriceBias::Highest => self.high,
        }
    }

    /// Capped confidence half-width
    pub fn confidence(&self) -> Fixed {
        self.price - self.low
    }

    pub fn width(&self) -> Fixed {
        self.high - self.low
    }

    /// A zero price means "unavailable", never a valid market value
    pub fn is_zero(&self) -> bool {
        self.price.is_zero()
    }
}

/// Realtime and time-weighted ranges derived from one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedPrice {
    pub realtime: PriceRange,
    pub weighted: PriceRange,
    pub timestamp: i64,
}

impl BoundedPrice {
    /// Same range for both views, e.g. for fixed test prices
    pub fn uniform(range: PriceRange, timestamp: i64) -> Self {
        Self {
            realtime: range,
            weighted: range,
            timestamp,
        }
    }

    pub fn range(&self, weighted: bool) -> &PriceRange {
        if weighted {
            &self.weighted
        } else {
            &self.realtime
        }
    }

    pub fn is_zero(&self) -> bool {
        self.realtime.is_zero() || self.weighted.is_zero()
    }
}
