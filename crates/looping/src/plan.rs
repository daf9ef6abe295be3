//! Plan types

use lendrisk_core::{BankAddress, Bps, Fixed};
use lendrisk_risk::AccountHealth;
use serde::Serialize;
use std::fmt;

use crate::config::PlannerConfig;

/// What the caller asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopRequest {
    pub deposit_bank: BankAddress,
    pub borrow_bank: BankAddress,
    /// UI units of the deposit asset
    pub principal: Fixed,
    /// `total deposit value / principal value`
    pub target_leverage: Fixed,
    pub max_slippage_bps: Bps,
    pub max_iterations: u32,
    /// Unix seconds; borrow capacity is measured as of this time
    pub now: i64,
}

impl LoopRequest {
    /// Request with slippage and iteration limits taken from `config`
    pub fn new(
        deposit_bank: BankAddress,
        borrow_bank: BankAddress,
        principal: Fixed,
        target_leverage: Fixed,
        config: &PlannerConfig,
        now: i64,
    ) -> Self {
        Self {
            deposit_bank,
            borrow_bank,
            principal,
            target_leverage,
            max_slippage_bps: config.max_slippage_bps,
            max_iterations: config.max_iterations,
            now,
        }
    }
}

/// One abstract operation. Amounts are UI units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoopStep {
    Deposit {
        bank: BankAddress,
        amount: Fixed,
    },
    Borrow {
        bank: BankAddress,
        amount: Fixed,
    },
    Swap {
        input: BankAddress,
        output: BankAddress,
        input_amount: Fixed,
        output_amount: Fixed,
        price_impact_bps: Bps,
        instructions: Vec<String>,
    },
}

impl LoopStep {
    pub fn is_borrow(&self) -> bool {
        matches!(self, LoopStep::Borrow { .. })
    }
}

impl fmt::Display for LoopStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopStep::Deposit { bank, amount } => write!(f, "deposit {} {bank}", amount.display(6)),
            LoopStep::Borrow { bank, amount } => write!(f, "borrow  {} {bank}", amount.display(6)),
            LoopStep::Swap {
                input,
                output,
                input_amount,
                output_amount,
                price_impact_bps,
                ..
            } => write!(
                f,
                "swap    {} {input} -> {} {output} (impact {price_impact_bps})",
                input_amount.display(6),
                output_amount.display(6)
            ),
        }
    }
}

/// A converged plan, the only kind a submitter accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopPlan {
    pub(crate) steps: Vec<LoopStep>,
    pub(crate) target_leverage: Fixed,
    pub(crate) achieved_leverage: Fixed,
    pub(crate) total_borrowed: Fixed,
    pub(crate) total_deposited: Fixed,
    pub(crate) iterations: u32,
    pub(crate) maintenance_health: AccountHealth,
    pub(crate) liquidation_price: Option<Fixed>,
}

impl LoopPlan {
    pub fn steps(&self) -> &[LoopStep] {
        &self.steps
    }

    pub fn borrow_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_borrow()).count()
    }

    pub fn target_leverage(&self) -> Fixed {
        self.target_leverage
    }

    pub fn achieved_leverage(&self) -> Fixed {
        self.achieved_leverage
    }

    /// `target - achieved`
    pub fn residual(&self) -> Fixed {
        self.target_leverage - self.achieved_leverage
    }

    /// UI units of the borrow asset
    pub fn total_borrowed(&self) -> Fixed {
        self.total_borrowed
    }

    /// UI units of the deposit asset, principal included
    pub fn total_deposited(&self) -> Fixed {
        self.total_deposited
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Projected Maintenance health once every step has executed
    pub fn maintenance_health(&self) -> &AccountHealth {
        &self.maintenance_health
    }

    /// Deposit-asset price at which the looped account becomes liquidatable
    pub fn liquidation_price(&self) -> Option<Fixed> {
        self.liquidation_price
    }
}

/// Best partial plan of a loop that did not converge. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvisoryPlan {
    pub(crate) steps: Vec<LoopStep>,
    pub(crate) target_leverage: Fixed,
    pub(crate) achieved_leverage: Fixed,
    pub(crate) total_borrowed: Fixed,
    pub(crate) iterations: u32,
    pub(crate) reason: &'static str,
}

impl AdvisoryPlan {
    pub fn steps(&self) -> &[LoopStep] {
        &self.steps
    }

    pub fn target_leverage(&self) -> Fixed {
        self.target_leverage
    }

    pub fn achieved_leverage(&self) -> Fixed {
        self.achieved_leverage
    }

    pub fn residual(&self) -> Fixed {
        self.target_leverage - self.achieved_leverage
    }

    pub fn total_borrowed(&self) -> Fixed {
        self.total_borrowed
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }
}
