//! Terminal error conditions of a rebalance run.
//!
//! Only these propagate to the caller. Budget shortfall, optimizer outages
//! and missing prices are all recovered inside the run.

use thiserror::Error;

/// Errors that abort a rebalance run before any order is produced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RebalanceError {
    /// Request or strategy configuration failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Momentum selection produced no assets and no alternative bucket applies.
    #[error("no eligible assets: momentum selection produced an empty target set")]
    NoEligibleAssets,
}

/// Result alias for rebalance operations.
pub type Result<T> = std::result::Result<T, RebalanceError>;
