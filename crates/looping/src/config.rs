//! Planner configuration

use lendrisk_core::{Bps, Fixed};
use serde::{Deserialize, Serialize};

use crate::error::LoopError;

/// Convergence and slippage parameters.
///
/// `max_iterations` and `max_slippage_bps` seed each [`LoopRequest`]
/// and can be overridden per request.
///
/// [`LoopRequest`]: crate::LoopRequest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Converged once `|target - leverage| < epsilon`
    pub epsilon: Fixed,
    pub max_iterations: u32,
    pub max_slippage_bps: Bps,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            epsilon: Fixed::from_parts(1, 4),
            max_iterations: 16,
            max_slippage_bps: Bps(100),
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), LoopError> {
        if !self.epsilon.is_positive() {
            return Err(LoopError::InvalidConfig(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.max_iterations == 0 {
            return Err(LoopError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.max_slippage_bps > Bps::MAX {
            return Err(LoopError::InvalidConfig(format!(
                "max_slippage_bps must be at most {}, got {}",
                Bps::MAX,
                self.max_slippage_bps
            )));
        }
        Ok(())
    }
}
