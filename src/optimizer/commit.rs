//! Single-assignment slot for a run's allocation.

use std::sync::OnceLock;
use tracing::warn;

use crate::strategy::{AllocationResult, AllocationSource};

/// Holds the one allocation a run acts on.
///
/// The first commit wins. Anything committed afterwards (a solver answer
/// that arrives after the local path already ran, a duplicate response)
/// is discarded.
#[derive(Debug, Default)]
pub struct AllocationCommit {
    slot: OnceLock<AllocationResult>,
}

impl AllocationCommit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to commit `allocation`. Returns `false` if the slot was taken.
    pub fn commit(&self, allocation: AllocationResult) -> bool {
        let source = allocation.source;
        match self.slot.set(allocation) {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    discarded = ?source,
                    committed = ?self.slot.get().map(|a| a.source),
                    "Allocation already committed, discarding"
                );
                false
            }
        }
    }

    pub fn is_committed(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn source(&self) -> Option<AllocationSource> {
        self.slot.get().map(|a| a.source)
    }

    pub fn into_inner(self) -> Option<AllocationResult> {
        self.slot.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{ShareBasis, StrategyKind};
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    fn allocation(source: AllocationSource, shares: i64) -> AllocationResult {
        AllocationResult {
            final_shares: HashMap::from([("VTI".to_string(), shares)]),
            leftover_budget: Decimal::ZERO,
            promotions: 0,
            strategy_used: StrategyKind::RemainderFirst,
            source,
            basis: ShareBasis::Purchased,
            deviations: None,
            final_values: None,
        }
    }

    #[test]
    fn test_first_commit_wins() {
        let commit = AllocationCommit::new();
        assert!(!commit.is_committed());

        assert!(commit.commit(allocation(AllocationSource::Local, 3)));
        assert!(!commit.commit(allocation(AllocationSource::Solver, 9)));
        assert_eq!(commit.source(), Some(AllocationSource::Local));

        let committed = commit.into_inner().unwrap();
        assert_eq!(committed.final_shares["VTI"], 3);
    }

    #[test]
    fn test_empty_commit() {
        assert!(AllocationCommit::new().into_inner().is_none());
    }
}
