//! Lendrisk Looping Planner
//!
//! Plans the deposit -> borrow -> swap -> deposit sequence that takes a
//! principal to a target leverage.
//!
//! ```text
//! LoopState::start ──► next_move ──► Converged ──► LoopPlan
//!                         │    ▲
//!                  Borrow │    │ apply_quote
//!                         ▼    │
//!                     SwapQuoter::quote (async)
//! ```
//!
//! The iteration itself is synchronous ([`LoopState`]); [`LoopPlanner`]
//! only adds the quote fetch and cancellation between steps. A plan is
//! all-or-nothing: any abort discards every step.

pub mod cancel;
pub mod config;
pub mod error;
pub mod plan;
pub mod planner;
pub mod quote;
pub mod state;
pub mod submit;

pub use cancel::CancelToken;
pub use config::PlannerConfig;
pub use error::{AbortReason, LoopError, QuoteError};
pub use plan::{AdvisoryPlan, LoopPlan, LoopRequest, LoopStep};
pub use planner::LoopPlanner;
pub use quote::{FixedRateQuoter, SwapQuote, SwapQuoter, SwapRate};
pub use state::{BorrowIntent, LoopState, NextMove};
pub use submit::{DryRunSubmitter, TransactionSubmitter};
