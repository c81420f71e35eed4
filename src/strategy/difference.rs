//! Target versus current value per asset, plus the liquidation sweep list.

use super::types::{AssetDifference, LiquidationCandidate, LiquidationReason, TargetAsset};
use crate::portfolio::RebalanceRequest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use tracing::debug;

/// Differences for the target universe and holdings outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceReport {
    /// Holdings at resolved prices plus extra cash
    pub total_portfolio_value: Decimal,
    /// One entry per target, in target order
    pub differences: Vec<AssetDifference>,
    /// Held tickers not in the target universe, by ticker
    pub liquidations: Vec<LiquidationCandidate>,
}

/// Compute target value, current value and signed difference per target.
pub fn compute_differences(request: &RebalanceRequest, targets: &[TargetAsset]) -> DifferenceReport {
    let total_portfolio_value = request.total_value();

    let differences: Vec<AssetDifference> = targets
        .iter()
        .map(|target| {
            let price = request.resolve_price(&target.ticker);
            let current_shares = request.held_shares(&target.ticker);
            let current_value = Decimal::from(current_shares) * price;
            let target_value = total_portfolio_value * target.target_pct / dec!(100);
            let difference = target_value - current_value;

            debug!(
                ticker = %target.ticker,
                %price,
                current_shares,
                %target_value,
                %current_value,
                %difference,
                "Computed difference"
            );

            AssetDifference {
                ticker: target.ticker.clone(),
                price,
                current_shares,
                target_pct: target.target_pct,
                target_value,
                current_value,
                difference,
                alternative: target.alternative,
            }
        })
        .collect();

    let target_tickers: HashSet<&str> = targets.iter().map(|t| t.ticker.as_str()).collect();
    let liquidations = request
        .holdings
        .iter()
        .filter(|(ticker, holding)| holding.shares > 0 && !target_tickers.contains(ticker.as_str()))
        .map(|(ticker, holding)| LiquidationCandidate {
            ticker: ticker.clone(),
            shares: holding.shares,
            price: request.resolve_price(ticker),
            reason: if request.in_universe(ticker) {
                LiquidationReason::DroppedFromTargets
            } else {
                LiquidationReason::OffUniverse
            },
        })
        .collect();

    DifferenceReport {
        total_portfolio_value,
        differences,
        liquidations,
    }
}
