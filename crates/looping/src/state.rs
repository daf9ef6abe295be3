//! Synchronous loop state machine
//!
//! `next_move` decides what to borrow next, `apply_quote` folds a swap
//! quote back in. Both work on private copies of the banks and the account,
//! so an error leaves the state exactly as it was.

use lendrisk_bank::{Account, Bank};
use lendrisk_core::{BankAddress, Fixed};
use lendrisk_risk::{compute_health, liquidation_price, max_leverage, MarketSnapshot, RequirementType, RiskError};

use crate::error::{AbortReason, LoopError};
use crate::plan::{AdvisoryPlan, LoopPlan, LoopRequest, LoopStep};
use crate::quote::SwapQuote;

/// Borrow to execute this iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowIntent {
    /// Whole native units
    pub native: Fixed,
    /// Same amount in UI units, as quoted
    pub amount: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextMove {
    Converged,
    Borrow(BorrowIntent),
    /// Cannot get closer to the target
    Stalled(&'static str),
}

#[derive(Debug, Clone)]
pub struct LoopState {
    request: LoopRequest,
    market: MarketSnapshot,
    account: Account,
    /// Value of the principal actually deposited
    principal_value: Fixed,
    deposit_price: Fixed,
    deposited: Fixed,
    borrowed: Fixed,
    iterations: u32,
    steps: Vec<LoopStep>,
}

impl LoopState {
    /// Validate `request` and deposit the principal
    pub fn start(market: MarketSnapshot, account: Account, request: LoopRequest) -> Result<Self, LoopError> {
        validate(&market, &request)?;

        let deposit_bank = market.bank(&request.deposit_bank)?;
        let decimals = deposit_bank.state.mint_decimals;
        let native = Fixed::from_ui(request.principal, decimals)?.floor();
        if !native.is_positive() {
            return Err(LoopError::InvalidPrincipal(request.principal));
        }
        let principal = native.to_ui(decimals)?;
        let deposit_price = market.price(&request.deposit_bank)?.realtime.price;

        let mut state = Self {
            principal_value: principal * deposit_price,
            deposit_price,
            deposited: Fixed::ZERO,
            borrowed: Fixed::ZERO,
            iterations: 0,
            steps: Vec::new(),
            request,
            market,
            account,
        };

        let bank = state.request.deposit_bank.clone();
        state
            .market
            .bank_mut(&bank)?
            .deposit(state.account.balance_mut(&bank), native)?;
        state.deposited = principal;
        state.steps.push(LoopStep::Deposit {
            bank,
            amount: principal,
        });
        Ok(state)
    }

    pub fn request(&self) -> &LoopRequest {
        &self.request
    }

    pub fn steps(&self) -> &[LoopStep] {
        &self.steps
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Projected account after the steps so far
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Projected banks after the steps so far
    pub fn market(&self) -> &MarketSnapshot {
        &self.market
    }

    /// `deposit value / principal value`
    pub fn leverage(&self) -> Result<Fixed, LoopError> {
        Ok((self.deposited * self.deposit_price).checked_div(self.principal_value)?)
    }

    pub fn next_move(&self, epsilon: Fixed) -> Result<NextMove, LoopError> {
        let gap = self.request.target_leverage - self.leverage()?;
        if gap.abs() < epsilon {
            return Ok(NextMove::Converged);
        }
        if gap.is_negative() {
            return Ok(NextMove::Stalled("overshot the target leverage"));
        }
        if self.iterations >= self.request.max_iterations {
            return Ok(NextMove::Stalled("iteration limit reached"));
        }

        let address = &self.request.borrow_bank;
        let bank = self.market.bank(address)?;
        let borrow_price = self.market.price(address)?.realtime.price;
        let decimals = bank.state.mint_decimals;

        let needed = (gap * self.principal_value).checked_div(borrow_price)?;
        let native = Fixed::from_ui(needed, decimals)?.floor();
        if native.is_zero() {
            return Ok(NextMove::Stalled("remaining borrow rounds to zero"));
        }

        let available = bank.state.available_liquidity();
        if native > available {
            return Err(AbortReason::InsufficientLiquidity {
                bank: address.clone(),
                requested: native,
                available,
            }
            .into());
        }
        let remaining = bank.remaining_capacity(self.request.now)?.borrow_capacity;
        if native > remaining {
            return Err(AbortReason::CapExceeded {
                bank: address.clone(),
                limit: "borrow",
                requested: native,
                remaining,
            }
            .into());
        }

        Ok(NextMove::Borrow(BorrowIntent {
            native,
            amount: native.to_ui(decimals)?,
        }))
    }

    /// Borrow `intent`, swap it per `quote` and deposit the output
    pub fn apply_quote(&mut self, intent: &BorrowIntent, quote: SwapQuote) -> Result<(), LoopError> {
        if quote.price_impact_bps > self.request.max_slippage_bps {
            return Err(AbortReason::SlippageExceeded {
                impact: quote.price_impact_bps,
                max: self.request.max_slippage_bps,
            }
            .into());
        }

        let borrow_address = self.request.borrow_bank.clone();
        let deposit_address = self.request.deposit_bank.clone();
        let mut market = self.market.clone();
        let mut account = self.account.clone();

        market
            .bank_mut(&borrow_address)?
            .borrow(account.balance_mut(&borrow_address), intent.native)?;

        let deposit_bank = market.bank_mut(&deposit_address)?;
        let decimals = deposit_bank.state.mint_decimals;
        let out_native = Fixed::from_ui(quote.output_amount, decimals)?.floor();
        if out_native.is_positive() {
            deposit_bank.deposit(account.balance_mut(&deposit_address), out_native)?;
        }
        let received = out_native.to_ui(decimals)?;

        let health = compute_health(account.balances(), &market, RequirementType::Initial)?;
        if health.net().is_negative() {
            return Err(AbortReason::Undercollateralized { net: health.net() }.into());
        }

        self.market = market;
        self.account = account;
        self.iterations += 1;
        self.borrowed = self.borrowed + intent.amount;
        self.deposited = self.deposited + received;
        self.steps.push(LoopStep::Borrow {
            bank: borrow_address.clone(),
            amount: intent.amount,
        });
        self.steps.push(LoopStep::Swap {
            input: borrow_address,
            output: deposit_address.clone(),
            input_amount: intent.amount,
            output_amount: quote.output_amount,
            price_impact_bps: quote.price_impact_bps,
            instructions: quote.instructions,
        });
        if received.is_positive() {
            self.steps.push(LoopStep::Deposit {
                bank: deposit_address,
                amount: received,
            });
        }

        tracing::debug!(
            iteration = self.iterations,
            borrowed = %intent.amount,
            received = %received,
            initial_net = %health.net(),
            "Applied loop iteration"
        );
        Ok(())
    }

    /// Seal a converged state into a plan
    pub fn finish(self) -> Result<LoopPlan, LoopError> {
        let achieved_leverage = self.leverage()?;
        let balances = self.account.balances();
        let maintenance_health = compute_health(balances, &self.market, RequirementType::Maintenance)?;
        let liquidation_price = liquidation_price(balances, &self.market, &self.request.deposit_bank)?;
        Ok(LoopPlan {
            steps: self.steps,
            target_leverage: self.request.target_leverage,
            achieved_leverage,
            total_borrowed: self.borrowed,
            total_deposited: self.deposited,
            iterations: self.iterations,
            maintenance_health,
            liquidation_price,
        })
    }

    pub fn into_advisory(self, reason: &'static str) -> AdvisoryPlan {
        let achieved_leverage = self.leverage().unwrap_or(Fixed::ZERO);
        AdvisoryPlan {
            steps: self.steps,
            target_leverage: self.request.target_leverage,
            achieved_leverage,
            total_borrowed: self.borrowed,
            iterations: self.iterations,
            reason,
        }
    }
}

fn validate(market: &MarketSnapshot, request: &LoopRequest) -> Result<(), LoopError> {
    if !request.principal.is_positive() {
        return Err(LoopError::InvalidPrincipal(request.principal));
    }
    if request.deposit_bank == request.borrow_bank {
        return Err(LoopError::SameBank(request.deposit_bank.clone()));
    }
    if request.target_leverage < Fixed::ONE {
        return Err(LoopError::InvalidTarget(request.target_leverage));
    }

    let deposit = operational(market, &request.deposit_bank)?;
    let borrow = operational(market, &request.borrow_bank)?;
    match max_leverage(deposit, borrow) {
        Ok(max) if request.target_leverage > max.max_leverage => Err(LoopError::LeverageTooHigh {
            target: request.target_leverage,
            max: max.max_leverage,
        }),
        Ok(_) | Err(RiskError::UnboundedLeverage { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn operational<'a>(market: &'a MarketSnapshot, address: &BankAddress) -> Result<&'a Bank, LoopError> {
    let bank = market.bank(address)?;
    if !bank.is_operational() {
        return Err(LoopError::BankNotOperational(address.clone()));
    }
    Ok(bank)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lendrisk_bank::{Bank, BankConfig, BankState, OperationalState, RiskTier};
    use lendrisk_core::{BankAddress, Fixed};
    use lendrisk_oracle::{BoundedPrice, PriceRange};
    use lendrisk_rates::{InterestRateConfig, RateCurve};
    use lendrisk_risk::MarketSnapshot;
    use rust_decimal::Decimal;

    const SCALE: u64 = 1_000_000;

    /// Six-decimal bank holding `liquidity` UI units of idle deposits.
    /// Weights: assets 0.8 / 0.9, liabilities 1 / 1.
    pub fn bank(name: &str, liquidity: u64) -> Bank {
        let config = BankConfig {
            oracle_key: name.to_string(),
            asset_weight_init: Fixed::from_parts(8, 1),
            asset_weight_maint: Fixed::from_parts(9, 1),
            liability_weight_init: Fixed::ONE,
            liability_weight_maint: Fixed::ONE,
            deposit_limit: Fixed::from(u64::MAX),
            borrow_limit: Fixed::from(u64::MAX),
            total_asset_value_init_limit: Fixed::ZERO,
            risk_tier: RiskTier::Collateral,
            isolated_pair: None,
            interest: InterestRateConfig {
                curve: RateCurve::legacy(Fixed::from_parts(8, 1), Fixed::from_parts(1, 1), Fixed::ONE),
                protocol_fee: Fixed::ZERO,
                insurance_fee: Fixed::ZERO,
            },
            operational_state: OperationalState::Operational,
        };
        let mut state = BankState::new(6, 0);
        state.total_asset_shares = Fixed::from(liquidity * SCALE);
        state.total_deposits = Fixed::from(liquidity * SCALE);
        Bank::new(BankAddress::new(name), config, state)
    }

    pub fn price(p: Decimal, confidence: Decimal) -> BoundedPrice {
        BoundedPrice::uniform(PriceRange::around(Fixed::from(p), Fixed::from(confidence)), 0)
    }

    /// SOL deposit bank and USDC borrow bank, both priced at 1
    pub fn market() -> MarketSnapshot {
        MarketSnapshot::default()
            .with_bank(bank("SOL", 1_000_000), price(Decimal::ONE, Decimal::ZERO))
            .with_bank(bank("USDC", 1_000_000), price(Decimal::ONE, Decimal::ZERO))
    }
}
