//! Per-run allocation types.
//!
//! Everything here is created fresh for one rebalance invocation and dropped
//! once the order list is produced.

use super::promotion::StrategyKind;
use crate::utils::decimal::{floor_shares, round_shares, share_cost};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An asset selected into the target universe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAsset {
    pub ticker: String,
    /// Target share of total portfolio value (0-100)
    pub target_pct: Decimal,
    /// Member of the alternative-asset bucket
    pub alternative: bool,
}

/// Target versus current value for one target-universe asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDifference {
    pub ticker: String,
    pub price: Decimal,
    pub current_shares: i64,
    pub target_pct: Decimal,
    pub target_value: Decimal,
    pub current_value: Decimal,
    /// Positive = underweight (buy), negative = overweight (sell)
    pub difference: Decimal,
    pub alternative: bool,
}

impl AssetDifference {
    /// Shares to sell for an overweight asset: rounded, capped at the holding.
    pub fn sell_shares(&self) -> i64 {
        if self.difference >= Decimal::ZERO || self.price <= Decimal::ZERO {
            return 0;
        }
        round_shares(self.difference.abs() / self.price).min(self.current_shares)
    }
}

/// A held position outside the target universe, to be sold in full.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidationCandidate {
    pub ticker: String,
    pub shares: i64,
    pub price: Decimal,
    pub reason: LiquidationReason,
}

impl LiquidationCandidate {
    pub fn value(&self) -> Decimal {
        share_cost(self.shares, self.price)
    }
}

/// Whole-share purchase candidate derived from a positive difference.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyCandidate {
    pub ticker: String,
    pub exact_shares: Decimal,
    pub floor_shares: i64,
    /// Fractional share left over after flooring (0 <= remainder < 1)
    pub remainder: Decimal,
    pub price: Decimal,
    pub target_value: Decimal,
    pub current_value: Decimal,
    pub difference: Decimal,
}

impl BuyCandidate {
    pub fn from_difference(diff: &AssetDifference) -> Self {
        let exact_shares = if diff.price > Decimal::ZERO {
            diff.difference.max(Decimal::ZERO) / diff.price
        } else {
            Decimal::ZERO
        };
        let floor = floor_shares(exact_shares);

        Self {
            ticker: diff.ticker.clone(),
            exact_shares,
            floor_shares: floor,
            remainder: exact_shares - Decimal::from(floor),
            price: diff.price,
            target_value: diff.target_value,
            current_value: diff.current_value,
            difference: diff.difference,
        }
    }

    /// Cost of this candidate's floor allocation.
    pub fn floor_cost(&self) -> Decimal {
        share_cost(self.floor_shares, self.price)
    }
}

/// Where an allocation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationSource {
    /// Floor allocation plus greedy promotions
    Local,
    /// Adopted from the external optimizer
    Solver,
}

/// What the share counts in `AllocationResult::final_shares` measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareBasis {
    /// Shares to purchase on top of the current holding
    Purchased,
    /// Total shares held after the rebalance
    Held,
}

/// Final whole-share allocation for the buy side of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub final_shares: HashMap<String, i64>,
    pub leftover_budget: Decimal,
    pub promotions: i64,
    pub strategy_used: StrategyKind,
    pub source: AllocationSource,
    pub basis: ShareBasis,
    /// Solver-reported deviation per ticker, in percentage points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviations: Option<HashMap<String, Decimal>>,
    /// Solver-reported post-trade value per ticker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_values: Option<HashMap<String, Decimal>>,
}

impl AllocationResult {
    /// Shares recorded for a ticker (zero if absent).
    pub fn shares_for(&self, ticker: &str) -> i64 {
        self.final_shares.get(ticker).copied().unwrap_or(0)
    }

    /// Net shares to buy for a ticker given its current holding.
    pub fn net_purchase(&self, ticker: &str, current_shares: i64) -> i64 {
        match self.basis {
            ShareBasis::Purchased => self.shares_for(ticker),
            ShareBasis::Held => self
                .final_shares
                .get(ticker)
                .map(|held| held - current_shares)
                .unwrap_or(0),
        }
    }

    pub fn deviation_for(&self, ticker: &str) -> Option<Decimal> {
        self.deviations.as_ref()?.get(ticker).copied()
    }

    pub fn final_value_for(&self, ticker: &str) -> Option<Decimal> {
        self.final_values.as_ref()?.get(ticker).copied()
    }
}

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderAction::Buy => "BUY",
            OrderAction::Sell => "SELL",
            OrderAction::Hold => "HOLD",
        };
        f.pad(s)
    }
}

/// Why a held ticker outside the target universe is being sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiquidationReason {
    /// Still in the asset universe but no longer selected
    DroppedFromTargets,
    /// Not a member of any universe category
    OffUniverse,
}

/// One line of the rebalance plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingOrder {
    pub ticker: String,
    pub action: OrderAction,
    /// Signed net share delta (negative for sells)
    pub shares: i64,
    pub target_value: Decimal,
    pub current_value: Decimal,
    pub final_value: Decimal,
    /// Signed dollar delta actually realized by the order
    pub difference: Decimal,
    pub deviation_percentage: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation: Option<LiquidationReason>,
}
