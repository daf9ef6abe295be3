//! Account health
//!
//! Every non-empty balance is converted to UI units, priced at the
//! conservative end of its range for the requirement type, and weighted:
//!
//! | requirement | range    | assets at | liabilities at | weights          |
//! |-------------|----------|-----------|----------------|------------------|
//! | Initial     | weighted | low       | high           | init (soft limit) |
//! | Maintenance | realtime | low       | high           | maint            |
//! | Equity      | realtime | price     | price          | 1                |
//!
//! An isolated-tier deposit counts as collateral only while every liability
//! of the account sits in the deposit bank's isolated pair.

use lendrisk_bank::{BalanceSide, Bank, RequirementType, UserBalance};
use lendrisk_core::{BankAddress, CoreError, Fixed};
use lendrisk_oracle::PriceBias;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RiskError;
use crate::market::MarketSnapshot;

/// One balance, valued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionValue {
    pub bank: BankAddress,
    pub side: BalanceSide,
    /// UI units
    pub quantity: Fixed,
    /// Biased price applied to `quantity`
    pub price: Fixed,
    /// Half-width of the range `price` came from
    pub confidence: Fixed,
    /// Effective weight after the isolation gate and soft limit
    pub weight: Fixed,
    /// `quantity * price * weight`
    pub value: Fixed,
}

/// Weighted health components under one requirement type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHealth {
    pub requirement: RequirementType,
    pub assets: Fixed,
    pub liabilities: Fixed,
    /// `(assets - liabilities) / assets`; 1 without liabilities;
    /// [`Fixed::MIN`] for debt with no assets
    pub ratio: Fixed,
}

impl AccountHealth {
    pub fn from_components(
        requirement: RequirementType,
        assets: Fixed,
        liabilities: Fixed,
    ) -> Result<Self, RiskError> {
        let ratio = if liabilities.is_zero() {
            Fixed::ONE
        } else if !assets.is_positive() {
            Fixed::MIN
        } else {
            (assets - liabilities).checked_div(assets)?
        };
        Ok(Self {
            requirement,
            assets,
            liabilities,
            ratio,
        })
    }

    /// `assets - liabilities`
    pub fn net(&self) -> Fixed {
        self.assets - self.liabilities
    }

    /// Ratio at or below zero
    pub fn is_below_requirement(&self) -> bool {
        !self.ratio.is_positive()
    }
}

/// Health as shown to a user: a number, or an explicit refusal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthAssessment {
    Determined(AccountHealth),
    /// Some input was stale or missing. Treated as liquidatable.
    Undetermined { reason: String },
}

impl HealthAssessment {
    pub fn undetermined(reason: impl Into<String>) -> Self {
        HealthAssessment::Undetermined {
            reason: reason.into(),
        }
    }

    pub fn health(&self) -> Option<&AccountHealth> {
        match self {
            HealthAssessment::Determined(health) => Some(health),
            HealthAssessment::Undetermined { .. } => None,
        }
    }

    /// Fails closed: an undetermined account counts as liquidatable
    pub fn is_liquidatable(&self) -> bool {
        match self {
            HealthAssessment::Determined(health) => health.is_below_requirement(),
            HealthAssessment::Undetermined { .. } => true,
        }
    }
}

impl fmt::Display for HealthAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthAssessment::Determined(h) if h.ratio == Fixed::MIN => write!(
                f,
                "assets {} / liabilities {} / ratio -inf",
                h.assets.display(2),
                h.liabilities.display(2)
            ),
            HealthAssessment::Determined(h) => write!(
                f,
                "assets {} / liabilities {} / ratio {}",
                h.assets.display(2),
                h.liabilities.display(2),
                h.ratio.display(4)
            ),
            HealthAssessment::Undetermined { reason } => {
                write!(f, "cannot determine account health ({reason})")
            }
        }
    }
}

/// Value every non-empty balance.
///
/// `extra_liability` adds a bank to the account's liability set for the
/// isolation gate, for projecting a borrow that has not happened yet.
pub fn value_positions(
    balances: &[UserBalance],
    market: &MarketSnapshot,
    requirement: RequirementType,
    extra_liability: Option<&BankAddress>,
) -> Result<Vec<PositionValue>, RiskError> {
    let liability_banks: Vec<&BankAddress> = balances
        .iter()
        .filter(|b| b.side() == Some(BalanceSide::Liabilities))
        .map(|b| b.bank())
        .chain(extra_liability)
        .collect();

    let mut positions = Vec::new();
    for balance in balances {
        let Some(side) = balance.side() else {
            continue;
        };
        let bank = market.bank(balance.bank())?;
        let bounded = market.price(balance.bank())?;
        let range = bounded.range(requirement == RequirementType::Initial);
        let (asset_native, liability_native) = bank.balance_amounts(balance)?;
        let decimals = bank.state.mint_decimals;

        let (quantity, price, weight) = match side {
            BalanceSide::Assets => {
                let bias = match requirement {
                    RequirementType::Equity => PriceBias::None,
                    _ => PriceBias::Lowest,
                };
                let weight = if requirement != RequirementType::Equity
                    && !counts_as_collateral(bank, &liability_banks)
                {
                    Fixed::ZERO
                } else {
                    asset_weight(bank, requirement, range.price)?
                };
                (asset_native.to_ui(decimals)?, range.get(bias), weight)
            }
            BalanceSide::Liabilities => {
                let bias = match requirement {
                    RequirementType::Equity => PriceBias::None,
                    _ => PriceBias::Highest,
                };
                (
                    liability_native.to_ui(decimals)?,
                    range.get(bias),
                    bank.config.liability_weight(requirement),
                )
            }
        };

        let value = quantity
            .checked_mul(price)
            .and_then(|v| v.checked_mul(weight))
            .ok_or(CoreError::Overflow("position value"))?;
        tracing::debug!(
            bank = %bank.address.short(),
            ?side,
            ?requirement,
            quantity = %quantity,
            price = %price,
            weight = %weight,
            value = %value,
            "Valued balance"
        );
        positions.push(PositionValue {
            bank: bank.address.clone(),
            side,
            quantity,
            price,
            confidence: range.confidence(),
            weight,
            value,
        });
    }
    Ok(positions)
}

/// `(assets, liabilities)` totals of valued positions
pub(crate) fn totals<'a>(
    positions: impl IntoIterator<Item = &'a PositionValue>,
) -> Result<(Fixed, Fixed), RiskError> {
    let (mut assets, mut liabilities) = (Fixed::ZERO, Fixed::ZERO);
    for p in positions {
        let total = match p.side {
            BalanceSide::Assets => &mut assets,
            BalanceSide::Liabilities => &mut liabilities,
        };
        *total = total
            .checked_add(p.value)
            .ok_or(CoreError::Overflow("health totals"))?;
    }
    Ok((assets, liabilities))
}

/// Health of an account under one requirement type.
///
/// A missing or zero price for any active balance is an error; no position
/// is ever skipped.
pub fn compute_health(
    balances: &[UserBalance],
    market: &MarketSnapshot,
    requirement: RequirementType,
) -> Result<AccountHealth, RiskError> {
    let positions = value_positions(balances, market, requirement, None)?;
    let (assets, liabilities) = totals(&positions)?;
    AccountHealth::from_components(requirement, assets, liabilities)
}

/// Fail-closed view of [`compute_health`]
pub fn assess(
    balances: &[UserBalance],
    market: &MarketSnapshot,
    requirement: RequirementType,
) -> HealthAssessment {
    match compute_health(balances, market, requirement) {
        Ok(health) => HealthAssessment::Determined(health),
        Err(e) => {
            tracing::warn!(error = %e, ?requirement, "Cannot determine account health");
            HealthAssessment::undetermined(e.to_string())
        }
    }
}

fn counts_as_collateral(bank: &Bank, liability_banks: &[&BankAddress]) -> bool {
    if !bank.config.is_isolated() {
        return true;
    }
    let pair = bank.config.isolated_pair.as_ref();
    liability_banks.iter().all(|l| Some(*l) == pair)
}

fn asset_weight(bank: &Bank, requirement: RequirementType, price: Fixed) -> Result<Fixed, RiskError> {
    match requirement {
        RequirementType::Initial => {
            let total_value = bank
                .state
                .total_deposits
                .to_ui(bank.state.mint_decimals)?
                .checked_mul(price)
                .ok_or(CoreError::Overflow("bank collateral value"))?;
            Ok(bank.config.discounted_init_asset_weight(total_value)?)
        }
        other => Ok(bank.config.asset_weight(other)),
    }
}
