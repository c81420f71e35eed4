//! Seam between the rebalancing engine and an external optimizer.
//!
//! Any backend that can turn an [`OptimizeRequest`] into whole-share
//! holdings plugs in here: the HTTP solver service in production, or a
//! mock in tests.

use async_trait::async_trait;

use super::types::{OptimizeRequest, OptimizeResponse, SolverError};

/// Backend able to solve a rebalance as an optimization problem.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PortfolioOptimizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Solve one rebalance.
    ///
    /// Returning `Ok` with a non-successful status is allowed; the caller
    /// decides whether the answer is usable.
    async fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, SolverError>;
}
