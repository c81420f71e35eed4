//! Time-boxed solver attempts.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use super::traits::PortfolioOptimizer;
use super::types::{OptimizeRequest, SolverError};
use crate::strategy::AllocationResult;

/// Wraps a [`PortfolioOptimizer`] with a deadline and success check.
#[derive(Clone)]
pub struct OptimizerAdapter {
    backend: Arc<dyn PortfolioOptimizer>,
    deadline: Duration,
}

impl OptimizerAdapter {
    pub fn new(backend: Arc<dyn PortfolioOptimizer>, deadline: Duration) -> Self {
        Self { backend, deadline }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Ask the backend for an allocation.
    ///
    /// Only an `optimal` or `heuristic` answer received before the deadline
    /// is returned; the in-flight call is dropped once the deadline passes.
    #[instrument(skip(self, request), fields(backend = self.backend.name()))]
    pub async fn attempt(&self, request: &OptimizeRequest) -> Result<AllocationResult, SolverError> {
        let response = match timeout(self.deadline, self.backend.optimize(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(deadline = ?self.deadline, "Solver deadline elapsed");
                return Err(SolverError::Timeout(self.deadline));
            }
        };

        if !response.solver_status.is_success() {
            return Err(SolverError::Unsuccessful(response.solver_status));
        }

        info!(
            status = %response.solver_status,
            allocations = response.allocations.len(),
            unused_budget = ?response.optimization_metrics.unused_budget,
            "Adopting solver allocation"
        );

        Ok(response.into_allocation(request.optimization_strategy))
    }
}

impl std::fmt::Debug for OptimizerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizerAdapter")
            .field("backend", &self.backend.name())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::traits::MockPortfolioOptimizer;
    use crate::optimizer::types::{OptimizeResponse, SolverAllocation, SolverStatus};
    use crate::strategy::{AllocationSource, ShareBasis, StrategyKind};
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    fn request() -> OptimizeRequest {
        OptimizeRequest {
            current_holdings: Vec::new(),
            target_etfs: Vec::new(),
            extra_cash: Decimal::ONE_HUNDRED,
            optimization_strategy: StrategyKind::MultiShare,
        }
    }

    fn response(status: SolverStatus) -> OptimizeResponse {
        OptimizeResponse {
            solver_status: status,
            allocations: vec![SolverAllocation {
                etf_name: "VTI".to_string(),
                final_shares: 2,
                deviation: None,
                final_value: None,
                cost_of_purchase: None,
            }],
            optimization_metrics: Default::default(),
        }
    }

    fn mock_returning(status: SolverStatus) -> MockPortfolioOptimizer {
        let mut mock = MockPortfolioOptimizer::new();
        mock.expect_name().return_const("mock");
        mock.expect_optimize()
            .times(1)
            .returning(move |_| Ok(response(status)));
        mock
    }

    struct StalledOptimizer;

    #[async_trait]
    impl PortfolioOptimizer for StalledOptimizer {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn optimize(
            &self,
            _request: &OptimizeRequest,
        ) -> Result<OptimizeResponse, SolverError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(response(SolverStatus::Optimal))
        }
    }

    #[tokio::test]
    async fn test_success_is_adopted() {
        let adapter = OptimizerAdapter::new(
            Arc::new(mock_returning(SolverStatus::Heuristic)),
            Duration::from_secs(1),
        );

        let allocation = adapter.attempt(&request()).await.unwrap();
        assert_eq!(allocation.source, AllocationSource::Solver);
        assert_eq!(allocation.basis, ShareBasis::Held);
        assert_eq!(allocation.strategy_used, StrategyKind::MultiShare);
        assert_eq!(allocation.final_shares["VTI"], 2);
    }

    #[tokio::test]
    async fn test_infeasible_is_rejected() {
        let adapter = OptimizerAdapter::new(
            Arc::new(mock_returning(SolverStatus::Infeasible)),
            Duration::from_secs(1),
        );

        let err = adapter.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, SolverError::Unsuccessful(SolverStatus::Infeasible)));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let mut mock = MockPortfolioOptimizer::new();
        mock.expect_name().return_const("mock");
        mock.expect_optimize().returning(|_| {
            Err(SolverError::HttpStatus {
                status: 500,
                body: String::new(),
            })
        });
        let adapter = OptimizerAdapter::new(Arc::new(mock), Duration::from_secs(1));

        let err = adapter.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, SolverError::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let adapter = OptimizerAdapter::new(Arc::new(StalledOptimizer), Duration::from_millis(50));

        let err = adapter.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, SolverError::Timeout(_)));
    }
}
