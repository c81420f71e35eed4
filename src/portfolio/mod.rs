//! Portfolio snapshot consumed by a rebalance run.
//!
//! Holdings, quotes, momentum scores and universe membership are all owned
//! by the caller; the engine reads them and never writes back.

mod types;

pub use types::*;
