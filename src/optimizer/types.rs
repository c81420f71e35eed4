//! Wire types for the external portfolio optimizer.

use crate::config::OptimizerConfig;
use crate::portfolio::RebalanceRequest;
use crate::strategy::{
    AllocationResult, AllocationSource, DifferenceReport, ShareBasis, StrategyKind,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a solver attempt was abandoned in favor of local heuristics.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("solver did not answer within {0:?}")]
    Timeout(Duration),

    #[error("solver returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("failed to decode solver response: {0}")]
    Decode(String),

    #[error("solver reported status '{0}'")]
    Unsuccessful(SolverStatus),
}

/// Holding as sent to the solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolverHolding {
    pub name: String,
    pub shares: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Target asset with its allowed deviation band.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverTarget {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub allowed_deviation: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_share: Decimal,
}

/// Full optimization problem for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub current_holdings: Vec<SolverHolding>,
    #[serde(rename = "targetETFs")]
    pub target_etfs: Vec<SolverTarget>,
    #[serde(with = "rust_decimal::serde::float")]
    pub extra_cash: Decimal,
    pub optimization_strategy: StrategyKind,
}

impl OptimizeRequest {
    /// Describe a run to the solver.
    ///
    /// Alternative-bucket targets get the tighter deviation band.
    pub fn build(
        request: &RebalanceRequest,
        report: &DifferenceReport,
        config: &OptimizerConfig,
        strategy: StrategyKind,
    ) -> Self {
        let current_holdings = request
            .holdings
            .iter()
            .filter(|(_, holding)| holding.shares > 0)
            .map(|(ticker, holding)| SolverHolding {
                name: ticker.clone(),
                shares: holding.shares,
                price: request.resolve_price(ticker),
            })
            .collect();

        let target_etfs = report
            .differences
            .iter()
            .map(|diff| SolverTarget {
                name: diff.ticker.clone(),
                target_percentage: diff.target_pct,
                allowed_deviation: if diff.alternative {
                    config.alternative_allowed_deviation
                } else {
                    config.default_allowed_deviation
                },
                price_per_share: diff.price,
            })
            .collect();

        Self {
            current_holdings,
            target_etfs,
            extra_cash: request.extra_cash,
            optimization_strategy: strategy,
        }
    }
}

/// Solver outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverStatus {
    Optimal,
    Heuristic,
    Infeasible,
    Error,
    #[serde(other)]
    Unknown,
}

impl SolverStatus {
    /// Whether the response may be adopted as the run's allocation.
    pub fn is_success(&self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Heuristic)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Heuristic => "heuristic",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Error => "error",
            SolverStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Per-asset solver result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverAllocation {
    pub etf_name: String,
    /// Total shares held after the trade
    pub final_shares: i64,
    #[serde(default)]
    pub deviation: Option<Decimal>,
    #[serde(default)]
    pub final_value: Option<Decimal>,
    #[serde(default)]
    pub cost_of_purchase: Option<Decimal>,
}

/// Aggregate solver metrics.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationMetrics {
    #[serde(default)]
    pub unused_budget: Option<Decimal>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Solver reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub solver_status: SolverStatus,
    #[serde(default)]
    pub allocations: Vec<SolverAllocation>,
    #[serde(default)]
    pub optimization_metrics: OptimizationMetrics,
}

impl OptimizeResponse {
    /// Adopt the solver's answer as-is.
    pub fn into_allocation(self, strategy: StrategyKind) -> AllocationResult {
        let mut final_shares = HashMap::new();
        let mut deviations = HashMap::new();
        let mut final_values = HashMap::new();

        for allocation in self.allocations {
            if let Some(deviation) = allocation.deviation {
                deviations.insert(allocation.etf_name.clone(), deviation);
            }
            if let Some(value) = allocation.final_value {
                final_values.insert(allocation.etf_name.clone(), value);
            }
            final_shares.insert(allocation.etf_name, allocation.final_shares);
        }

        AllocationResult {
            final_shares,
            leftover_budget: self
                .optimization_metrics
                .unused_budget
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO),
            promotions: 0,
            strategy_used: strategy,
            source: AllocationSource::Solver,
            basis: ShareBasis::Held,
            deviations: Some(deviations),
            final_values: Some(final_values),
        }
    }
}
