//! Conversion of final share counts into buy/sell/hold orders.

use super::budget::classify;
use super::difference::DifferenceReport;
use super::types::{AllocationResult, AssetDifference, OrderAction, RebalancingOrder};
use crate::utils::decimal::percent_of;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Deviation reported for a fully liquidated position.
const LIQUIDATION_DEVIATION: Decimal = dec!(-100);

/// Aggregate figures for a produced order list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub buys: usize,
    pub sells: usize,
    pub holds: usize,
    pub liquidations: usize,
    /// Cash spent on purchases
    pub buy_cost: Decimal,
    /// Cash raised by sales, liquidations included
    pub sell_proceeds: Decimal,
}

impl OrderSummary {
    pub fn from_orders(orders: &[RebalancingOrder]) -> Self {
        let mut summary = Self::default();
        for order in orders {
            match order.action {
                OrderAction::Buy => {
                    summary.buys += 1;
                    summary.buy_cost += order.difference.max(Decimal::ZERO);
                }
                OrderAction::Sell => {
                    summary.sells += 1;
                    summary.sell_proceeds += order.difference.abs();
                    if order.liquidation.is_some() {
                        summary.liquidations += 1;
                    }
                }
                OrderAction::Hold => summary.holds += 1,
            }
        }
        summary
    }
}

/// Build the ordered order list: targets in target order, then the sweep.
///
/// No ticker appears twice; a duplicate target entry is dropped with a warning.
pub fn build_orders(report: &DifferenceReport, allocation: &AllocationResult) -> Vec<RebalancingOrder> {
    let total = report.total_portfolio_value;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut orders = Vec::with_capacity(report.differences.len() + report.liquidations.len());

    for diff in &report.differences {
        if !seen.insert(diff.ticker.as_str()) {
            warn!(ticker = %diff.ticker, "Duplicate target ticker, skipping");
            continue;
        }
        orders.push(target_order(diff, allocation, total));
    }

    for liquidation in &report.liquidations {
        if !seen.insert(liquidation.ticker.as_str()) {
            continue;
        }
        let current_value = liquidation.value();

        info!(
            ticker = %liquidation.ticker,
            shares = liquidation.shares,
            reason = ?liquidation.reason,
            "Liquidating holding outside target universe"
        );

        orders.push(RebalancingOrder {
            ticker: liquidation.ticker.clone(),
            action: OrderAction::Sell,
            shares: -liquidation.shares,
            target_value: Decimal::ZERO,
            current_value,
            final_value: Decimal::ZERO,
            difference: -current_value,
            deviation_percentage: LIQUIDATION_DEVIATION,
            liquidation: Some(liquidation.reason),
        });
    }

    let summary = OrderSummary::from_orders(&orders);
    info!(
        buys = summary.buys,
        sells = summary.sells,
        holds = summary.holds,
        liquidations = summary.liquidations,
        buy_cost = %summary.buy_cost,
        sell_proceeds = %summary.sell_proceeds,
        "Built rebalancing orders"
    );

    orders
}

fn target_order(diff: &AssetDifference, allocation: &AllocationResult, total: Decimal) -> RebalancingOrder {
    let action = classify(diff.difference);

    let (shares, final_value, realized) = match action {
        OrderAction::Buy => {
            let net = allocation.net_purchase(&diff.ticker, diff.current_shares);
            let delta = Decimal::from(net) * diff.price;
            let final_value = allocation
                .final_value_for(&diff.ticker)
                .unwrap_or(diff.current_value + delta);
            (net, final_value, delta)
        }
        OrderAction::Sell => {
            let sold = diff.sell_shares();
            let delta = Decimal::from(sold) * diff.price;
            let final_value = (diff.current_value - delta).max(Decimal::ZERO);
            (-sold, final_value, -delta)
        }
        OrderAction::Hold => (0, diff.current_value, Decimal::ZERO),
    };

    let deviation_percentage = allocation
        .deviation_for(&diff.ticker)
        .unwrap_or_else(|| percent_of(final_value, total) - percent_of(diff.target_value, total));

    RebalancingOrder {
        ticker: diff.ticker.clone(),
        action,
        shares,
        target_value: diff.target_value,
        current_value: diff.current_value,
        final_value,
        difference: realized,
        deviation_percentage,
        liquidation: None,
    }
}
