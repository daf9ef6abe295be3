//! Plan submission
//!
//! Signing, broadcast and confirmation live behind [`TransactionSubmitter`].
//! Only a converged [`LoopPlan`] can be handed over; an advisory plan is a
//! different type.

use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

use crate::error::LoopError;
use crate::plan::LoopPlan;

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Execute every step of `plan`. Returns an opaque receipt.
    async fn submit(&self, plan: &LoopPlan) -> Result<String, LoopError>;
}

/// Records plans instead of executing them
#[derive(Debug, Default)]
pub struct DryRunSubmitter {
    submitted: RwLock<Vec<LoopPlan>>,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<LoopPlan> {
        self.submitted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TransactionSubmitter for DryRunSubmitter {
    async fn submit(&self, plan: &LoopPlan) -> Result<String, LoopError> {
        let mut submitted = self.submitted.write().unwrap_or_else(PoisonError::into_inner);
        submitted.push(plan.clone());
        let receipt = format!("dry-run-{}", submitted.len());
        tracing::info!(
            receipt = %receipt,
            steps = plan.steps().len(),
            leverage = %plan.achieved_leverage(),
            "Recorded loop plan"
        );
        Ok(receipt)
    }
}
