//! Async planning driver

use lendrisk_bank::Account;
use lendrisk_core::{BankAddress, Fixed};
use lendrisk_risk::MarketSnapshot;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::config::PlannerConfig;
use crate::error::{AbortReason, LoopError};
use crate::plan::{LoopPlan, LoopRequest};
use crate::quote::SwapQuoter;
use crate::state::{LoopState, NextMove};

/// Runs [`LoopState`] against a swap quoter.
///
/// Each `plan` call starts from its own copy of the market and account;
/// nothing carries over between calls.
pub struct LoopPlanner {
    quoter: Arc<dyn SwapQuoter>,
    config: PlannerConfig,
}

impl LoopPlanner {
    pub fn new(quoter: Arc<dyn SwapQuoter>, config: PlannerConfig) -> Result<Self, LoopError> {
        config.validate()?;
        Ok(Self { quoter, config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Request using this planner's slippage and iteration limits
    pub fn request(
        &self,
        deposit_bank: BankAddress,
        borrow_bank: BankAddress,
        principal: Fixed,
        target_leverage: Fixed,
        now: i64,
    ) -> LoopRequest {
        LoopRequest::new(deposit_bank, borrow_bank, principal, target_leverage, &self.config, now)
    }

    /// Plan a loop. `Ok` only for a converged plan.
    pub async fn plan(
        &self,
        market: &MarketSnapshot,
        account: &Account,
        request: LoopRequest,
        cancel: &CancelToken,
    ) -> Result<LoopPlan, LoopError> {
        let deposit_bank = request.deposit_bank.clone();
        let borrow_bank = request.borrow_bank.clone();
        let target = request.target_leverage;

        let result = self.run(market.clone(), account.clone(), request, cancel).await;
        match &result {
            Ok(plan) => tracing::info!(
                account = %account.id,
                deposit_bank = %deposit_bank.short(),
                borrow_bank = %borrow_bank.short(),
                target = %target,
                leverage = %plan.achieved_leverage(),
                iterations = plan.iterations(),
                "Loop plan converged"
            ),
            Err(e) => tracing::warn!(
                account = %account.id,
                deposit_bank = %deposit_bank.short(),
                borrow_bank = %borrow_bank.short(),
                target = %target,
                error = %e,
                "Loop plan failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        market: MarketSnapshot,
        account: Account,
        request: LoopRequest,
        cancel: &CancelToken,
    ) -> Result<LoopPlan, LoopError> {
        let mut state = LoopState::start(market, account, request)?;
        loop {
            if cancel.is_cancelled() {
                return Err(AbortReason::Cancelled.into());
            }
            match state.next_move(self.config.epsilon)? {
                NextMove::Converged => return state.finish(),
                NextMove::Stalled(reason) => {
                    return Err(LoopError::DidNotConverge(Box::new(state.into_advisory(reason))));
                }
                NextMove::Borrow(intent) => {
                    let request = state.request();
                    let quote = self
                        .quoter
                        .quote(
                            &request.borrow_bank,
                            &request.deposit_bank,
                            intent.amount,
                            request.max_slippage_bps,
                        )
                        .await
                        .map_err(AbortReason::from)?;
                    state.apply_quote(&intent, quote)?;
                }
            }
        }
    }
}
