//! Local rebalancing pipeline.
//!
//! Contains the core logic for:
//! - Target universe selection and equal weighting
//! - Target/current differences and the liquidation sweep list
//! - Budget aggregation across buys, sells and liquidations
//! - Whole-share floor allocation and greedy promotions
//! - Order construction

mod budget;
mod difference;
mod fallback;
mod floor;
mod orders;
mod promotion;
mod target;
mod types;

pub use budget::{aggregate_budget, classify, BudgetSummary};
pub use difference::{compute_differences, DifferenceReport};
pub use fallback::{FallbackOrchestrator, StrategyConfig};
pub use floor::{allocate_floors, FloorAllocation};
pub use orders::{build_orders, OrderSummary};
pub use promotion::{compute_promotions, StrategyKind};
pub use target::TargetSelector;
pub use types::*;
