//! Buy/sell/hold partitioning and available budget.

use super::difference::DifferenceReport;
use super::types::{BuyCandidate, OrderAction};
use rust_decimal::Decimal;
use tracing::info;

/// Budget available to a run and the candidates competing for it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    /// Underweight targets, in target order
    pub buy_candidates: Vec<BuyCandidate>,
    pub sell_tickers: Vec<String>,
    pub hold_tickers: Vec<String>,
    pub extra_cash: Decimal,
    /// Proceeds from trimming overweight targets
    pub sale_proceeds: Decimal,
    /// Proceeds from the liquidation sweep
    pub liquidation_proceeds: Decimal,
    pub available_budget: Decimal,
}

/// Classify a signed difference into an order direction.
pub fn classify(difference: Decimal) -> OrderAction {
    if difference > Decimal::ZERO {
        OrderAction::Buy
    } else if difference < Decimal::ZERO {
        OrderAction::Sell
    } else {
        OrderAction::Hold
    }
}

/// Partition targets and total up the cash the buy side may spend.
///
/// Sale proceeds use the same rounded, holding-capped share counts the
/// order builder emits, so the budget matches what the sells will raise.
pub fn aggregate_budget(report: &DifferenceReport, extra_cash: Decimal) -> BudgetSummary {
    let mut buy_candidates = Vec::new();
    let mut sell_tickers = Vec::new();
    let mut hold_tickers = Vec::new();
    let mut sale_proceeds = Decimal::ZERO;

    for diff in &report.differences {
        match classify(diff.difference) {
            OrderAction::Buy => buy_candidates.push(BuyCandidate::from_difference(diff)),
            OrderAction::Sell => {
                sale_proceeds += Decimal::from(diff.sell_shares()) * diff.price;
                sell_tickers.push(diff.ticker.clone());
            }
            OrderAction::Hold => hold_tickers.push(diff.ticker.clone()),
        }
    }

    let liquidation_proceeds: Decimal = report.liquidations.iter().map(|l| l.value()).sum();
    let available_budget = extra_cash + sale_proceeds + liquidation_proceeds;

    info!(
        buys = buy_candidates.len(),
        sells = sell_tickers.len(),
        holds = hold_tickers.len(),
        liquidations = report.liquidations.len(),
        %extra_cash,
        %sale_proceeds,
        %liquidation_proceeds,
        %available_budget,
        "Aggregated rebalance budget"
    );

    BudgetSummary {
        buy_candidates,
        sell_tickers,
        hold_tickers,
        extra_cash,
        sale_proceeds,
        liquidation_proceeds,
        available_budget,
    }
}
