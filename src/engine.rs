//! Rebalance run orchestration.
//!
//! One run: select targets, compute differences and budget, offer the
//! problem to the external optimizer, and fall back to the local
//! floor + promotion heuristics when the optimizer does not deliver.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::Result;
use crate::optimizer::{
    AllocationCommit, OptimizeRequest, OptimizerAdapter, PortfolioOptimizer, SolverClient,
};
use crate::portfolio::RebalanceRequest;
use crate::strategy::{
    aggregate_budget, build_orders, compute_differences, AllocationResult, BudgetSummary,
    DifferenceReport, FallbackOrchestrator, OrderSummary, RebalancingOrder, TargetSelector,
};

/// Outcome of one rebalance run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceResult {
    /// Target orders in target order, then liquidations
    pub orders: Vec<RebalancingOrder>,
    /// The allocation the orders were built from
    pub allocation: AllocationResult,
    pub total_portfolio_value: Decimal,
    pub available_budget: Decimal,
    pub generated_at: DateTime<Utc>,
}

impl RebalanceResult {
    pub fn summary(&self) -> OrderSummary {
        OrderSummary::from_orders(&self.orders)
    }
}

/// Everything computed before the allocation step.
struct RunPlan {
    report: DifferenceReport,
    budget: BudgetSummary,
}

/// Stateless rebalancing engine; safe to share across concurrent runs.
#[derive(Debug, Clone)]
pub struct RebalanceEngine {
    config: Config,
    selector: TargetSelector,
    orchestrator: FallbackOrchestrator,
    optimizer: Option<OptimizerAdapter>,
}

impl RebalanceEngine {
    /// Create an engine, connecting the solver service when configured.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut engine = Self::offline(config);

        let optimizer = &engine.config.optimizer;
        if !optimizer.enabled {
            info!("External optimizer disabled, using local heuristics only");
        } else if optimizer.base_url.is_none() {
            info!("No optimizer base_url configured, using local heuristics only");
        } else {
            let client = SolverClient::from_config(optimizer)?;
            info!(base_url = client.base_url(), "External optimizer enabled");
            let deadline = Duration::from_secs(optimizer.timeout_secs);
            engine = engine.with_optimizer(Arc::new(client), deadline);
        }

        Ok(engine)
    }

    /// Create an engine that never contacts an optimizer.
    pub fn offline(config: Config) -> Self {
        Self {
            selector: TargetSelector::new(&config.selection),
            orchestrator: FallbackOrchestrator::new(config.strategy.clone()),
            config,
            optimizer: None,
        }
    }

    /// Attach an optimizer backend with its own deadline.
    pub fn with_optimizer(mut self, backend: Arc<dyn PortfolioOptimizer>, deadline: Duration) -> Self {
        self.optimizer = Some(OptimizerAdapter::new(backend, deadline));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_optimizer(&self) -> bool {
        self.optimizer.is_some()
    }

    /// Run a full rebalance.
    ///
    /// The optimizer, when attached, is awaited once under its deadline. Its
    /// answer is used only if it succeeds; otherwise the local heuristics
    /// produce the allocation. The two paths never mix within a run.
    #[instrument(skip_all, fields(holdings = request.holdings.len(), extra_cash = %request.extra_cash))]
    pub async fn rebalance(&self, request: &RebalanceRequest) -> Result<RebalanceResult> {
        let plan = self.prepare(request)?;
        let commit = AllocationCommit::new();

        if let Some(adapter) = &self.optimizer {
            let solver_request = OptimizeRequest::build(
                request,
                &plan.report,
                &self.config.optimizer,
                self.config.strategy.primary,
            );

            match adapter.attempt(&solver_request).await {
                Ok(allocation) => {
                    commit.commit(allocation);
                }
                Err(e) => {
                    warn!(
                        backend = adapter.backend_name(),
                        error = %e,
                        "Optimizer unavailable, falling back to local heuristics"
                    );
                }
            }
        }

        let allocation = match commit.into_inner() {
            Some(allocation) => allocation,
            None => self.local_allocation(request, &plan.budget),
        };

        Ok(self.finish(plan, allocation))
    }

    /// Run the local heuristics only, without touching the optimizer.
    #[instrument(skip_all, fields(holdings = request.holdings.len(), extra_cash = %request.extra_cash))]
    pub fn plan_locally(&self, request: &RebalanceRequest) -> Result<RebalanceResult> {
        let plan = self.prepare(request)?;
        let allocation = self.local_allocation(request, &plan.budget);
        Ok(self.finish(plan, allocation))
    }

    fn prepare(&self, request: &RebalanceRequest) -> Result<RunPlan> {
        request.validate()?;
        self.config.strategy.validate()?;

        let targets = self.selector.select(&request.momentum)?;
        let report = compute_differences(request, &targets);
        let budget = aggregate_budget(&report, request.extra_cash);

        Ok(RunPlan { report, budget })
    }

    fn local_allocation(&self, request: &RebalanceRequest, budget: &BudgetSummary) -> AllocationResult {
        self.orchestrator.allocate(
            &budget.buy_candidates,
            budget.available_budget,
            &request.momentum_averages(),
        )
    }

    fn finish(&self, plan: RunPlan, allocation: AllocationResult) -> RebalanceResult {
        let orders = build_orders(&plan.report, &allocation);

        info!(
            source = ?allocation.source,
            strategy = %allocation.strategy_used,
            orders = orders.len(),
            leftover = %allocation.leftover_budget,
            "Rebalance complete"
        );

        RebalanceResult {
            orders,
            allocation,
            total_portfolio_value: plan.report.total_portfolio_value,
            available_budget: plan.budget.available_budget,
            generated_at: Utc::now(),
        }
    }
}
