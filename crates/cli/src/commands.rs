//! CLI commands
//!
//! Every command returns the text to print so the binary and the tests
//! share one code path.

use lendrisk_bank::{Account, BankError, LedgerReader};
use lendrisk_core::{BankAddress, Bps, Fixed};
use lendrisk_looping::{
    AdvisoryPlan, CancelToken, DryRunSubmitter, LoopError, LoopPlanner, TransactionSubmitter,
};
use lendrisk_rates::{apr_to_apy, HOURS_PER_YEAR};
use lendrisk_risk::{
    account_value, assess, free_collateral, liquidation_price as price_at_liquidation, max_borrow,
    max_leverage, max_withdraw, net_apy, value_positions, HealthAssessment, MarketSnapshot,
    RequirementType,
};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::context::AppContext;

/// Wall-clock budget for one loop plan
const PLAN_TIMEOUT: Duration = Duration::from_secs(30);

fn active_banks(account: &Account) -> Vec<BankAddress> {
    account.active_balances().map(|b| b.bank().clone()).collect()
}

/// Market for `banks`. Unusable inputs come back as the rendered
/// undetermined-health line instead of an error.
async fn market_or_undetermined(
    ctx: &AppContext,
    account_id: &str,
    banks: &[BankAddress],
) -> Result<MarketSnapshot, String> {
    ctx.market(banks).await.map_err(|e| {
        tracing::warn!(account = account_id, error = %e, "Market data unavailable");
        undetermined(e)
    })
}

fn undetermined(reason: impl std::fmt::Display) -> String {
    format!("{}\n", HealthAssessment::undetermined(reason.to_string()))
}

fn percent(fraction: Fixed) -> String {
    format!("{}%", (fraction * Fixed::from(100u64)).display(2))
}

/// Health of an account under one requirement type.
///
/// Missing banks or unusable prices never fall back to a partial number:
/// the output says the health cannot be determined.
pub async fn health(
    ctx: &AppContext,
    account_id: &str,
    requirement: RequirementType,
) -> anyhow::Result<String> {
    let account = ctx.ledger.get_account(account_id).await?;
    let market = match market_or_undetermined(ctx, account_id, &active_banks(&account)).await {
        Ok(market) => market,
        Err(line) => return Ok(line),
    };

    let assessment = assess(account.balances(), &market, requirement);
    let mut out = String::new();
    writeln!(out, "account {account_id} ({requirement:?})")?;
    writeln!(out, "  {assessment}")?;
    if assessment.health().is_none() {
        return Ok(out);
    }
    if assessment.is_liquidatable() {
        writeln!(out, "  below requirement")?;
    }

    for position in value_positions(account.balances(), &market, requirement, None)? {
        writeln!(
            out,
            "  {:<12} {:?} qty {} @ {} x {} = {}",
            position.bank.short(),
            position.side,
            position.quantity.display(6),
            position.price.display(4),
            position.weight.display(2),
            position.value.display(2)
        )?;
    }

    writeln!(
        out,
        "  free collateral {}",
        free_collateral(account.balances(), &market)?.display(2)
    )?;
    writeln!(
        out,
        "  account value   {}",
        account_value(account.balances(), &market)?.display(2)
    )?;
    writeln!(out, "  net apy         {}", percent(net_apy(account.balances(), &market)?))?;
    Ok(out)
}

/// Price of `bank` at which the account hits its Maintenance requirement.
///
/// Like [`health`], unusable market data is reported, not computed around.
pub async fn liquidation_price(ctx: &AppContext, account_id: &str, bank: &BankAddress) -> anyhow::Result<String> {
    let account = ctx.ledger.get_account(account_id).await?;
    let market = match market_or_undetermined(ctx, account_id, &active_banks(&account)).await {
        Ok(market) => market,
        Err(line) => return Ok(line),
    };

    let price = match price_at_liquidation(account.balances(), &market, bank) {
        Ok(price) => price,
        Err(e) => return Ok(undetermined(e)),
    };
    Ok(match price {
        Some(price) => format!("liquidation price of {bank}: {}\n", price.display(6)),
        None => format!("no liquidation price for {bank}\n"),
    })
}

/// Borrow and withdraw headroom of an account in one bank
pub async fn limits(ctx: &AppContext, account_id: &str, bank: &BankAddress) -> anyhow::Result<String> {
    let account = ctx.ledger.get_account(account_id).await?;
    let mut banks = active_banks(&account);
    banks.push(bank.clone());
    let market = match market_or_undetermined(ctx, account_id, &banks).await {
        Ok(market) => market,
        Err(line) => return Ok(line),
    };

    let headroom = (
        max_borrow(account.balances(), &market, bank),
        max_withdraw(account.balances(), &market, bank),
    );
    let (borrow, withdraw) = match headroom {
        (Ok(borrow), Ok(withdraw)) => (borrow, withdraw),
        (Err(e), _) | (_, Err(e)) => return Ok(undetermined(e)),
    };

    let mut out = String::new();
    writeln!(out, "account {account_id} in {bank}")?;
    writeln!(out, "  max borrow   {}", borrow.display(6))?;
    writeln!(out, "  max withdraw {}", withdraw.display(6))?;
    Ok(out)
}

/// Utilization, rates and capacity of one bank
pub async fn rates(ctx: &AppContext, bank: &BankAddress) -> anyhow::Result<String> {
    let bank = ctx.ledger.get_bank(bank).await?;
    let rates = bank.rates()?;
    let capacity = bank.remaining_capacity(ctx.now())?;
    let decimals = bank.state.mint_decimals;

    let mut out = String::new();
    writeln!(out, "bank {}", bank.address)?;
    writeln!(out, "  utilization  {}", percent(rates.utilization))?;
    writeln!(
        out,
        "  borrow       {} APR / {} APY",
        percent(rates.borrow_apr),
        percent(apr_to_apy(rates.borrow_apr, HOURS_PER_YEAR)?)
    )?;
    writeln!(
        out,
        "  lend         {} APR / {} APY",
        percent(rates.lend_apr),
        percent(apr_to_apy(rates.lend_apr, HOURS_PER_YEAR)?)
    )?;
    writeln!(
        out,
        "  liquidity    {}",
        bank.state.available_liquidity().to_ui(decimals)?.display(6)
    )?;
    writeln!(
        out,
        "  deposit room {}",
        capacity.deposit_capacity.to_ui(decimals)?.display(6)
    )?;
    writeln!(
        out,
        "  borrow room  {}",
        capacity.borrow_capacity.to_ui(decimals)?.display(6)
    )?;
    Ok(out)
}

/// Parameters of the `loop` command
#[derive(Debug, Clone)]
pub struct LoopArgs {
    pub account: String,
    pub deposit_bank: BankAddress,
    pub borrow_bank: BankAddress,
    pub principal: Fixed,
    pub leverage: Fixed,
    pub slippage_bps: Option<u32>,
    pub max_iterations: Option<u32>,
}

/// Plan a leveraged loop and hand it to the dry-run submitter
pub async fn loop_plan(ctx: &AppContext, args: LoopArgs) -> anyhow::Result<String> {
    // A fresh account may loop from nothing
    let account = match ctx.ledger.get_account(&args.account).await {
        Ok(account) => account,
        Err(BankError::AccountNotFound(_)) => Account::new(args.account.as_str()),
        Err(e) => return Err(e.into()),
    };
    let mut banks = active_banks(&account);
    banks.push(args.deposit_bank.clone());
    banks.push(args.borrow_bank.clone());
    let market = ctx.market(&banks).await?;

    let mut out = String::new();
    match max_leverage(market.bank(&args.deposit_bank)?, market.bank(&args.borrow_bank)?) {
        Ok(max) => writeln!(
            out,
            "max leverage {}x (ltv {})",
            max.max_leverage.display(2),
            max.ltv.display(4)
        )?,
        Err(e) => writeln!(out, "max leverage unbounded ({e})")?,
    }

    let planner = LoopPlanner::new(Arc::new(ctx.quoter.clone()), ctx.config.looping)?;
    let mut request = planner.request(
        args.deposit_bank,
        args.borrow_bank,
        args.principal,
        args.leverage,
        ctx.now(),
    );
    if let Some(bps) = args.slippage_bps {
        request.max_slippage_bps = Bps(bps);
    }
    if let Some(iterations) = args.max_iterations {
        request.max_iterations = iterations;
    }

    let cancel = CancelToken::with_timeout(PLAN_TIMEOUT);
    let plan = match planner.plan(&market, &account, request, &cancel).await {
        Ok(plan) => plan,
        Err(LoopError::DidNotConverge(advisory)) => {
            write_advisory(&mut out, &advisory)?;
            return Ok(out);
        }
        Err(e) => return Err(e.into()),
    };

    for step in plan.steps() {
        writeln!(out, "  {step}")?;
    }
    writeln!(
        out,
        "leverage {}x (target {}x) after {} iterations",
        plan.achieved_leverage().display(4),
        plan.target_leverage().display(4),
        plan.iterations()
    )?;
    writeln!(
        out,
        "borrowed {} / deposited {}",
        plan.total_borrowed().display(6),
        plan.total_deposited().display(6)
    )?;
    writeln!(out, "maintenance health {}", plan.maintenance_health().ratio.display(4))?;
    match plan.liquidation_price() {
        Some(price) => writeln!(out, "liquidation price {}", price.display(6))?,
        None => writeln!(out, "liquidation price none")?,
    }

    let receipt = DryRunSubmitter::new().submit(&plan).await?;
    writeln!(out, "submitted {receipt}")?;
    Ok(out)
}

fn write_advisory(out: &mut String, advisory: &AdvisoryPlan) -> std::fmt::Result {
    writeln!(out, "did not converge: {} (not submitted)", advisory.reason())?;
    for step in advisory.steps() {
        writeln!(out, "  {step}")?;
    }
    writeln!(
        out,
        "leverage {}x (target {}x, residual {}) after {} iterations",
        advisory.achieved_leverage().display(4),
        advisory.target_leverage().display(4),
        advisory.residual().display(4),
        advisory.iterations()
    )
}
