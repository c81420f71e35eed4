//! Primary + fallback promotion orchestration for the local allocation path.

use super::floor::allocate_floors;
use super::promotion::{compute_promotions, StrategyKind};
use super::types::{AllocationResult, AllocationSource, BuyCandidate, ShareBasis};
use crate::error::{RebalanceError, Result};
use crate::utils::decimal::share_cost;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Which strategies run, and how far the promotion loop may go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy applied to the post-floor leftover budget
    #[serde(default = "default_primary")]
    pub primary: StrategyKind,
    /// Spend what the primary leaves behind with a second strategy
    #[serde(default = "default_enable_fallback")]
    pub enable_fallback: bool,
    /// Second strategy, run on the same floor baseline
    #[serde(default = "default_fallback")]
    pub fallback: Option<StrategyKind>,
    /// Upper bound on promotions per strategy pass
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_primary() -> StrategyKind {
    StrategyKind::RemainderFirst
}

fn default_enable_fallback() -> bool {
    true
}

fn default_fallback() -> Option<StrategyKind> {
    Some(StrategyKind::MultiShare)
}

fn default_max_iterations() -> u32 {
    10_000
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            enable_fallback: default_enable_fallback(),
            fallback: default_fallback(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(RebalanceError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Fallback strategy, if one should run.
    pub fn active_fallback(&self) -> Option<StrategyKind> {
        self.fallback.filter(|_| self.enable_fallback)
    }
}

/// Runs floor allocation, the primary strategy, then the optional fallback.
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    config: StrategyConfig,
}

impl FallbackOrchestrator {
    /// Create a new orchestrator.
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Allocate whole shares to `candidates` within `available_budget`.
    ///
    /// Fallback promotions are computed against the floor baseline and added
    /// on top of the primary result as increments.
    pub fn allocate(
        &self,
        candidates: &[BuyCandidate],
        available_budget: Decimal,
        momentum: &HashMap<String, Decimal>,
    ) -> AllocationResult {
        let floor = allocate_floors(candidates, available_budget);
        let prices: HashMap<&str, Decimal> = floor
            .candidates
            .iter()
            .map(|c| (c.ticker.as_str(), c.price))
            .collect();
        let floors: HashMap<&str, i64> = floor.floor_shares().collect();

        if !floor.has_leftover() {
            debug!("No budget left after floor allocation, skipping promotions");
            return self.result(
                floor.floor_shares().map(|(t, s)| (t.to_string(), s)).collect(),
                floor.leftover_budget,
                0,
            );
        }

        let mut final_shares = compute_promotions(
            self.config.primary,
            &floor.candidates,
            floor.leftover_budget,
            momentum,
            self.config.max_iterations,
        );

        let spent = spend(&final_shares, &prices);
        let remaining = available_budget - spent;

        if let Some(fallback) = self.config.active_fallback() {
            if remaining > Decimal::ZERO {
                let fallback_shares = compute_promotions(
                    fallback,
                    &floor.candidates,
                    remaining,
                    momentum,
                    self.config.max_iterations,
                );

                for (ticker, shares) in &fallback_shares {
                    let increment = shares - floors.get(ticker.as_str()).copied().unwrap_or(0);
                    *final_shares.entry(ticker.clone()).or_insert(0) += increment;
                }

                debug!(
                    %fallback,
                    budget = %remaining,
                    "Fallback strategy applied"
                );
            }
        }

        let final_spend = spend(&final_shares, &prices);
        let leftover = (available_budget - final_spend).max(Decimal::ZERO);
        let promotions: i64 = final_shares
            .iter()
            .map(|(ticker, shares)| shares - floors.get(ticker.as_str()).copied().unwrap_or(0))
            .sum();

        info!(
            primary = %self.config.primary,
            fallback = ?self.config.active_fallback(),
            %available_budget,
            %final_spend,
            %leftover,
            promotions,
            "Local allocation complete"
        );

        self.result(final_shares, leftover, promotions)
    }

    fn result(
        &self,
        final_shares: HashMap<String, i64>,
        leftover_budget: Decimal,
        promotions: i64,
    ) -> AllocationResult {
        AllocationResult {
            final_shares,
            leftover_budget,
            promotions,
            strategy_used: self.config.primary,
            source: AllocationSource::Local,
            basis: ShareBasis::Purchased,
            deviations: None,
            final_values: None,
        }
    }
}

fn spend(shares: &HashMap<String, i64>, prices: &HashMap<&str, Decimal>) -> Decimal {
    shares
        .iter()
        .map(|(ticker, count)| {
            share_cost(*count, prices.get(ticker.as_str()).copied().unwrap_or(Decimal::ZERO))
        })
        .sum()
}
