//! External portfolio optimizer integration.
//!
//! A run first offers the rebalance to a solver service. Its answer is
//! adopted only when it reports `optimal` or `heuristic` before the
//! deadline; anything else hands the run to the local heuristics.

mod adapter;
mod client;
mod commit;
mod traits;
mod types;

pub use adapter::OptimizerAdapter;
pub use client::SolverClient;
pub use commit::AllocationCommit;
#[cfg(test)]
pub use traits::MockPortfolioOptimizer;
pub use traits::PortfolioOptimizer;
pub use types::*;
