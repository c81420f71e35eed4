//! # Momentum Rebalancer
//!
//! Budget-constrained rebalancing engine: turns momentum-ranked targets,
//! current holdings and a cash budget into whole-share BUY/SELL/HOLD orders
//! that never overspend.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `error`: Terminal error conditions of a run
//! - `portfolio`: Holdings, momentum scores and the run request
//! - `strategy`: Target selection, budgeting, floor allocation, promotion
//!   strategies and order construction
//! - `optimizer`: External solver client with timeout and fallback semantics
//! - `engine`: Control flow tying the pieces into one run
//! - `utils`: Shared utilities and decimal arithmetic

pub mod config;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod portfolio;
pub mod strategy;
pub mod utils;

pub use config::Config;
pub use engine::{RebalanceEngine, RebalanceResult};
pub use error::RebalanceError;
