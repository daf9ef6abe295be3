//! Confidence capping and staleness checks

use lendrisk_core::Fixed;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::types::{BoundedPrice, OraclePrice, PriceRange};

/// Protocol parameters for bounding oracle observations.
///
/// These come from the live protocol configuration. `Default` only seeds
/// a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Cap on the confidence half-width, as a fraction of price
    pub max_confidence_fraction: Fixed,
    /// Standard-deviation multiple applied to the raw confidence
    pub confidence_multiplier: Fixed,
    /// Observations older than this are stale
    pub max_age_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_confidence_fraction: Fixed::from_parts(5, 2), // 5%
            confidence_multiplier: Fixed::ONE,
            max_age_secs: 60,
        }
    }
}

impl OracleConfig {
    pub fn validate(&self) -> Result<(), OracleError> {
        if !self.max_confidence_fraction.is_positive() || self.max_confidence_fraction > Fixed::ONE {
            return Err(OracleError::InvalidConfig(format!(
                "max_confidence_fraction must be in (0, 1], got {}",
                self.max_confidence_fraction
            )));
        }
        if !self.confidence_multiplier.is_positive() {
            return Err(OracleError::InvalidConfig(format!(
                "confidence_multiplier must be positive, got {}",
                self.confidence_multiplier
            )));
        }
        Ok(())
    }

    /// `min(confidence * multiplier, price * max_confidence_fraction)`
    pub fn cap_confidence(&self, price: Fixed, confidence: Fixed) -> Fixed {
        let scaled = confidence * self.confidence_multiplier;
        let cap = price * self.max_confidence_fraction;
        scaled.min(cap)
    }

    /// Bound one (price, confidence) pair. A zero price collapses to `{0, 0}`.
    pub fn bound_range(&self, price: Fixed, confidence: Fixed) -> Result<PriceRange, OracleError> {
        if price.is_negative() {
            return Err(OracleError::InvalidPrice {
                price,
                reason: "negative price",
            });
        }
        if confidence.is_negative() {
            return Err(OracleError::InvalidPrice {
                price,
                reason: "negative confidence",
            });
        }
        if price.is_zero() {
            return Ok(PriceRange::ZERO);
        }
        Ok(PriceRange::around(price, self.cap_confidence(price, confidence)))
    }

    /// Bound an observation as of `now` (unix seconds).
    ///
    /// Stale data is an error, never a silently reused value. The weighted
    /// range falls back to the realtime one when the feed has no EMA.
    pub fn bound(&self, observation: &OraclePrice, now: i64) -> Result<BoundedPrice, OracleError> {
        let age_secs = now.saturating_sub(observation.timestamp);
        let max_age = i64::try_from(self.max_age_secs).unwrap_or(i64::MAX);

        if age_secs > max_age {
            tracing::warn!(
                age_secs,
                max_age_secs = self.max_age_secs,
                "Rejecting stale oracle price"
            );
            return Err(OracleError::StalePrice {
                age_secs,
                max_age_secs: self.max_age_secs,
            });
        }
        if age_secs < max_age.saturating_neg() {
            return Err(OracleError::InvalidPrice {
                price: observation.price,
                reason: "timestamp is in the future",
            });
        }

        let realtime = self.bound_range(observation.price, observation.confidence)?;
        let weighted = match observation.ema_price {
            Some(ema_price) => {
                let ema_confidence = observation.ema_confidence.unwrap_or(observation.confidence);
                self.bound_range(ema_price, ema_confidence)?
            }
            None => realtime,
        };

        if realtime.is_zero() {
            tracing::warn!("Oracle reported a zero price");
        }

        Ok(BoundedPrice {
            realtime,
            weighted,
            timestamp: observation.timestamp,
        })
    }
}
