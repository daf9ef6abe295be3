//! Static bank configuration

use lendrisk_core::{BankAddress, Fixed};
use lendrisk_rates::InterestRateConfig;
use serde::{Deserialize, Serialize};

use crate::error::BankError;

/// Which weights a valuation applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    /// Opening new positions; stricter weights
    Initial,
    /// Liquidation threshold
    Maintenance,
    /// Unweighted, for display and net worth
    Equity,
}

impl RequirementType {
    pub const ALL: [RequirementType; 3] = [
        RequirementType::Initial,
        RequirementType::Maintenance,
        RequirementType::Equity,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Can back any borrow
    #[default]
    Collateral,
    /// Can only back borrows in its paired bank
    Isolated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalState {
    #[default]
    Operational,
    /// Only withdraw and repay
    ReduceOnly,
    Paused,
}

/// Per-asset configuration, immutable within a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankConfig {
    /// Oracle feed id this bank is priced by
    pub oracle_key: String,
    pub asset_weight_init: Fixed,
    pub asset_weight_maint: Fixed,
    pub liability_weight_init: Fixed,
    pub liability_weight_maint: Fixed,
    /// Native units
    pub deposit_limit: Fixed,
    /// Native units
    pub borrow_limit: Fixed,
    /// USD value above which the initial asset weight is scaled down; zero disables
    #[serde(default)]
    pub total_asset_value_init_limit: Fixed,
    #[serde(default)]
    pub risk_tier: RiskTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolated_pair: Option<BankAddress>,
    pub interest: InterestRateConfig,
    #[serde(default)]
    pub operational_state: OperationalState,
}

impl BankConfig {
    pub fn validate(&self) -> Result<(), BankError> {
        let w = |name: &str, msg: String| Err(BankError::InvalidConfig(format!("{name}: {msg}")));

        if self.asset_weight_init.is_negative() || self.asset_weight_init > self.asset_weight_maint {
            return w(
                "asset_weight_init",
                format!("must be in [0, asset_weight_maint], got {}", self.asset_weight_init),
            );
        }
        if self.asset_weight_maint > Fixed::ONE {
            return w("asset_weight_maint", format!("must be <= 1, got {}", self.asset_weight_maint));
        }
        if self.liability_weight_maint < Fixed::ONE {
            return w(
                "liability_weight_maint",
                format!("must be >= 1, got {}", self.liability_weight_maint),
            );
        }
        if self.liability_weight_init < self.liability_weight_maint {
            return w(
                "liability_weight_init",
                format!("must be >= liability_weight_maint, got {}", self.liability_weight_init),
            );
        }
        if self.deposit_limit.is_negative() || self.borrow_limit.is_negative() {
            return w("limits", "must be non-negative".to_string());
        }
        if self.total_asset_value_init_limit.is_negative() {
            return w("total_asset_value_init_limit", "must be non-negative".to_string());
        }
        self.interest.validate()?;
        Ok(())
    }

    pub fn asset_weight(&self, requirement: RequirementType) -> Fixed {
        match requirement {
            RequirementType::Initial => self.asset_weight_init,
            RequirementType::Maintenance => self.asset_weight_maint,
            RequirementType::Equity => Fixed::ONE,
        }
    }

    pub fn liability_weight(&self, requirement: RequirementType) -> Fixed {
        match requirement {
            RequirementType::Initial => self.liability_weight_init,
            RequirementType::Maintenance => self.liability_weight_maint,
            RequirementType::Equity => Fixed::ONE,
        }
    }

    /// Initial asset weight after the soft collateral limit.
    ///
    /// When the bank's total collateral value exceeds the limit the weight
    /// shrinks by `limit / total_value`.
    pub fn discounted_init_asset_weight(&self, total_asset_value: Fixed) -> Result<Fixed, BankError> {
        let limit = self.total_asset_value_init_limit;
        if limit.is_zero() || total_asset_value <= limit {
            return Ok(self.asset_weight_init);
        }
        Ok(self.asset_weight_init.mul_div(
            limit,
            total_asset_value,
            18,
            lendrisk_core::Rounding::Down,
        )?)
    }

    pub fn is_isolated(&self) -> bool {
        self.risk_tier == RiskTier::Isolated
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use lendrisk_rates::RateCurve;

    /// 80% / 90% collateral, 120% / 110% debt weights, 10% at 80% utilization
    pub fn collateral_config(oracle_key: &str) -> BankConfig {
        BankConfig {
            oracle_key: oracle_key.to_string(),
            asset_weight_init: Fixed::from_parts(8, 1),
            asset_weight_maint: Fixed::from_parts(9, 1),
            liability_weight_init: Fixed::from_parts(12, 1),
            liability_weight_maint: Fixed::from_parts(11, 1),
            deposit_limit: Fixed::from(1_000_000_000u64),
            borrow_limit: Fixed::from(1_000_000_000u64),
            total_asset_value_init_limit: Fixed::ZERO,
            risk_tier: RiskTier::Collateral,
            isolated_pair: None,
            interest: InterestRateConfig {
                curve: RateCurve::legacy(Fixed::from_parts(8, 1), Fixed::from_parts(1, 1), Fixed::ONE),
                protocol_fee: Fixed::from_parts(1, 1),
                insurance_fee: Fixed::ZERO,
            },
            operational_state: OperationalState::Operational,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::collateral_config;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_weights_by_requirement() {
        let cfg = collateral_config("SOL");
        assert_eq!(cfg.asset_weight(RequirementType::Initial), dec!(0.8));
        assert_eq!(cfg.asset_weight(RequirementType::Maintenance), dec!(0.9));
        assert_eq!(cfg.asset_weight(RequirementType::Equity), dec!(1));
        assert_eq!(cfg.liability_weight(RequirementType::Initial), dec!(1.2));
        assert_eq!(cfg.liability_weight(RequirementType::Equity), dec!(1));
    }

    #[test]
    fn test_validate() {
        assert!(collateral_config("SOL").validate().is_ok());

        let mut cfg = collateral_config("SOL");
        cfg.asset_weight_init = Fixed::from(dec!(0.95));
        assert!(matches!(cfg.validate(), Err(BankError::InvalidConfig(_))));

        let mut cfg = collateral_config("SOL");
        cfg.liability_weight_maint = Fixed::from(dec!(0.9));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_soft_init_limit() {
        let mut cfg = collateral_config("SOL");
        cfg.total_asset_value_init_limit = Fixed::from(1_000u64);

        let under = cfg.discounted_init_asset_weight(Fixed::from(500u64)).unwrap();
        assert_eq!(under, dec!(0.8));

        let over = cfg.discounted_init_asset_weight(Fixed::from(4_000u64)).unwrap();
        assert_eq!(over, dec!(0.2));
    }
}
