//! End-to-end planning scenarios against in-memory banks and quoters

use async_trait::async_trait;
use lendrisk_bank::{Account, Bank, BankConfig, BankState, OperationalState, RiskTier};
use lendrisk_core::{BankAddress, Bps, Fixed};
use lendrisk_looping::{
    AbortReason, CancelToken, DryRunSubmitter, FixedRateQuoter, LoopError, LoopPlanner, PlannerConfig,
    QuoteError, SwapQuote, SwapQuoter, TransactionSubmitter,
};
use lendrisk_oracle::{BoundedPrice, PriceRange};
use lendrisk_rates::{InterestRateConfig, RateCurve};
use lendrisk_risk::MarketSnapshot;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SCALE: u64 = 1_000_000;

fn bank(name: &str, liquidity: u64, borrow_limit: Option<u64>) -> Bank {
    let config = BankConfig {
        oracle_key: name.to_string(),
        asset_weight_init: Fixed::from(dec!(0.8)),
        asset_weight_maint: Fixed::from(dec!(0.9)),
        liability_weight_init: Fixed::ONE,
        liability_weight_maint: Fixed::ONE,
        deposit_limit: Fixed::from(u64::MAX),
        borrow_limit: Fixed::from(borrow_limit.map_or(u64::MAX, |l| l * SCALE)),
        total_asset_value_init_limit: Fixed::ZERO,
        risk_tier: RiskTier::Collateral,
        isolated_pair: None,
        interest: InterestRateConfig {
            curve: RateCurve::legacy(Fixed::from(dec!(0.8)), Fixed::from(dec!(0.1)), Fixed::ONE),
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

fn unit_price() -> BoundedPrice {
    BoundedPrice::uniform(PriceRange::around(Fixed::ONE, Fixed::ZERO), 0)
}

fn market(usdc: Bank) -> MarketSnapshot {
    MarketSnapshot::default()
        .with_bank(bank("SOL", 1_000_000, None), unit_price())
        .with_bank(usdc, unit_price())
}

fn planner(quoter: impl SwapQuoter + 'static) -> LoopPlanner {
    LoopPlanner::new(Arc::new(quoter), PlannerConfig::default()).unwrap()
}

fn par_quoter(impact: u32) -> FixedRateQuoter {
    FixedRateQuoter::new().with_rate("USDC", "SOL", Fixed::ONE, Bps(impact))
}

async fn plan(
    planner: &LoopPlanner,
    market: &MarketSnapshot,
    target: Fixed,
    cancel: &CancelToken,
) -> Result<lendrisk_looping::LoopPlan, LoopError> {
    let request = planner.request(
        BankAddress::new("SOL"),
        BankAddress::new("USDC"),
        Fixed::from(100u64),
        target,
        0,
    );
    planner.plan(market, &Account::new("looper"), request, cancel).await
}

/// Counts quotes and cancels a token on the first one
struct CancellingQuoter {
    inner: FixedRateQuoter,
    cancel: CancelToken,
    calls: AtomicUsize,
}

#[async_trait]
impl SwapQuoter for CancellingQuoter {
    async fn quote(
        &self,
        input: &BankAddress,
        output: &BankAddress,
        amount: Fixed,
        max_slippage_bps: Bps,
    ) -> Result<SwapQuote, QuoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
        self.inner.quote(input, output, amount, max_slippage_bps).await
    }
}

#[tokio::test]
async fn test_unit_leverage_has_no_borrow_steps() {
    // No routes at all: any quote would fail
    let p = planner(FixedRateQuoter::new());
    let m = market(bank("USDC", 1_000_000, None));
    let loop_plan = plan(&p, &m, Fixed::ONE, &CancelToken::new()).await.unwrap();

    assert_eq!(loop_plan.borrow_steps(), 0);
    assert_eq!(loop_plan.steps().len(), 1);
    assert_eq!(loop_plan.iterations(), 0);
    assert_eq!(loop_plan.liquidation_price(), None);
}

#[tokio::test]
async fn test_excess_slippage_aborts_whole_plan() {
    let p = planner(par_quoter(250));
    let m = market(bank("USDC", 1_000_000, None));
    let err = plan(&p, &m, Fixed::from(3u64), &CancelToken::new()).await.unwrap_err();

    assert_eq!(
        err,
        LoopError::Aborted(AbortReason::SlippageExceeded {
            impact: Bps(250),
            max: Bps(100),
        })
    );
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_principal_100_to_three_x() {
    let p = planner(par_quoter(0));
    let m = market(bank("USDC", 1_000_000, None));
    let loop_plan = plan(&p, &m, Fixed::from(3u64), &CancelToken::new()).await.unwrap();

    assert!((loop_plan.achieved_leverage() - Fixed::from(3u64)).abs() < p.config().epsilon);
    assert_eq!(loop_plan.total_borrowed(), dec!(200));
    assert_eq!(loop_plan.total_deposited(), dec!(300));
    assert!(loop_plan.iterations() <= p.config().max_iterations);
    assert!(loop_plan.maintenance_health().ratio.is_positive());

    let submitter = DryRunSubmitter::new();
    submitter.submit(&loop_plan).await.unwrap();
    assert_eq!(submitter.submitted().len(), 1);
}

#[tokio::test]
async fn test_thin_liquidity_aborts() {
    let p = planner(par_quoter(0));
    let m = market(bank("USDC", 150, None));
    let err = plan(&p, &m, Fixed::from(3u64), &CancelToken::new()).await.unwrap_err();

    assert!(matches!(
        err,
        LoopError::Aborted(AbortReason::InsufficientLiquidity { .. })
    ));
}

#[tokio::test]
async fn test_borrow_cap_aborts() {
    let p = planner(par_quoter(0));
    let m = market(bank("USDC", 1_000_000, Some(100)));
    let err = plan(&p, &m, Fixed::from(3u64), &CancelToken::new()).await.unwrap_err();

    let LoopError::Aborted(AbortReason::CapExceeded {
        limit,
        requested,
        remaining,
        ..
    }) = err
    else {
        panic!("expected CapExceeded, got {err:?}");
    };
    assert_eq!(limit, "borrow");
    assert_eq!(requested, Fixed::from(200 * SCALE));
    assert_eq!(remaining, Fixed::from(100 * SCALE));
}

#[tokio::test]
async fn test_cancellation_waits_for_the_quote() {
    let cancel = CancelToken::new();
    let quoter = Arc::new(CancellingQuoter {
        inner: par_quoter(50),
        cancel: cancel.clone(),
        calls: AtomicUsize::new(0),
    });
    let p = LoopPlanner::new(quoter.clone(), PlannerConfig::default()).unwrap();
    let m = market(bank("USDC", 1_000_000, None));

    // 50 bps impact needs a second iteration; the token trips during the first quote
    let err = plan(&p, &m, Fixed::from(3u64), &cancel).await.unwrap_err();
    assert_eq!(err, LoopError::Aborted(AbortReason::Cancelled));
    assert_eq!(quoter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_independent_plans_run_concurrently() {
    let p = Arc::new(planner(par_quoter(0)));
    let m = Arc::new(market(bank("USDC", 1_000_000, None)));

    let handles: Vec<_> = (2u64..=4)
        .map(|target| {
            let p = Arc::clone(&p);
            let m = Arc::clone(&m);
            tokio::spawn(async move { plan(&p, &m, Fixed::from(target), &CancelToken::new()).await })
        })
        .collect();

    for (handle, target) in handles.into_iter().zip(2u64..=4) {
        let loop_plan = handle.await.unwrap().unwrap();
        assert_eq!(loop_plan.achieved_leverage(), Fixed::from(target));
    }
}
