//! Whole-share floor allocation with proportional scaling on shortfall.

use super::types::BuyCandidate;
use crate::utils::decimal::floor_shares;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Outcome of the floor pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorAllocation {
    /// Candidates with `floor_shares` possibly scaled down
    pub candidates: Vec<BuyCandidate>,
    pub total_floor_cost: Decimal,
    /// Budget left for promotions (never negative)
    pub leftover_budget: Decimal,
    /// Factor applied when floors exceeded the budget
    pub scale_factor: Option<Decimal>,
}

impl FloorAllocation {
    /// Whether any budget remains for promotions.
    pub fn has_leftover(&self) -> bool {
        self.leftover_budget > Decimal::ZERO
    }

    /// Ticker -> floor shares.
    pub fn floor_shares(&self) -> impl Iterator<Item = (&str, i64)> {
        self.candidates
            .iter()
            .map(|c| (c.ticker.as_str(), c.floor_shares))
    }
}

/// Allocate each candidate its floor shares within `available_budget`.
///
/// When the combined floor cost exceeds the budget every floor is scaled by
/// `budget / cost` and floored again, so the result always fits.
pub fn allocate_floors(candidates: &[BuyCandidate], available_budget: Decimal) -> FloorAllocation {
    let budget = available_budget.max(Decimal::ZERO);
    let mut candidates = candidates.to_vec();

    let mut total_floor_cost = total_cost(&candidates);
    let mut scale_factor = None;

    if total_floor_cost > budget {
        let factor = budget / total_floor_cost;

        for candidate in &mut candidates {
            candidate.floor_shares = floor_shares(Decimal::from(candidate.floor_shares) * factor);
        }

        let scaled_cost = total_cost(&candidates);
        info!(
            original_cost = %total_floor_cost,
            %budget,
            scale_factor = %factor.round_dp(4),
            %scaled_cost,
            "Floor allocation exceeds budget, scaling down"
        );

        total_floor_cost = scaled_cost;
        scale_factor = Some(factor);
    }

    let leftover_budget = (budget - total_floor_cost).max(Decimal::ZERO);

    debug!(
        candidates = candidates.len(),
        %total_floor_cost,
        %leftover_budget,
        "Floor allocation complete"
    );

    FloorAllocation {
        candidates,
        total_floor_cost,
        leftover_budget,
        scale_factor,
    }
}

fn total_cost(candidates: &[BuyCandidate]) -> Decimal {
    candidates.iter().map(BuyCandidate::floor_cost).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candidate(ticker: &str, floor: i64, price: Decimal) -> BuyCandidate {
        BuyCandidate {
            ticker: ticker.to_string(),
            exact_shares: Decimal::from(floor),
            floor_shares: floor,
            remainder: Decimal::ZERO,
            price,
            target_value: Decimal::from(floor) * price,
            current_value: Decimal::ZERO,
            difference: Decimal::from(floor) * price,
        }
    }

    #[test]
    fn test_floors_within_budget_untouched() {
        let candidates = vec![candidate("AAA", 2, dec!(10)), candidate("BBB", 1, dec!(50))];
        let allocation = allocate_floors(&candidates, dec!(100));

        assert_eq!(allocation.candidates, candidates);
        assert_eq!(allocation.total_floor_cost, dec!(70));
        assert_eq!(allocation.leftover_budget, dec!(30));
        assert!(allocation.scale_factor.is_none());
        assert!(allocation.has_leftover());
    }

    #[test]
    fn test_proportional_scaling_on_shortfall() {
        let candidates = vec![candidate("AAA", 10, dec!(60)), candidate("BBB", 5, dec!(120))];
        let allocation = allocate_floors(&candidates, dec!(1000));

        let floors: Vec<(&str, i64)> = allocation.floor_shares().collect();
        assert_eq!(floors, vec![("AAA", 8), ("BBB", 4)]);
        assert_eq!(allocation.total_floor_cost, dec!(960));
        assert_eq!(allocation.leftover_budget, dec!(40));

        let factor = allocation.scale_factor.unwrap();
        assert!(factor > dec!(0.8333) && factor < dec!(0.8334));
    }

    #[test]
    fn test_zero_budget_zeroes_floors() {
        let candidates = vec![candidate("AAA", 3, dec!(25))];
        let allocation = allocate_floors(&candidates, Decimal::ZERO);

        assert_eq!(allocation.candidates[0].floor_shares, 0);
        assert_eq!(allocation.total_floor_cost, Decimal::ZERO);
        assert!(!allocation.has_leftover());
    }

    #[test]
    fn test_exact_fit_leaves_nothing() {
        let candidates = vec![candidate("AAA", 4, dec!(25))];
        let allocation = allocate_floors(&candidates, dec!(100));

        assert_eq!(allocation.leftover_budget, Decimal::ZERO);
        assert!(!allocation.has_leftover());
    }

    #[test]
    fn test_rerun_on_zero_leftover_output_is_stable() {
        let candidates = vec![
            candidate("AAA", 10, dec!(60)),
            candidate("BBB", 5, dec!(120)),
            candidate("CCC", 7, dec!(13.5)),
        ];
        let first = allocate_floors(&candidates, dec!(1000));
        let second = allocate_floors(&first.candidates, first.total_floor_cost);

        assert_eq!(second.candidates, first.candidates);
        assert_eq!(second.leftover_budget, Decimal::ZERO);
        assert!(second.scale_factor.is_none());
    }

    #[test]
    fn test_floor_cost_never_exceeds_budget() {
        let candidates = vec![
            candidate("AAA", 13, dec!(47.31)),
            candidate("BBB", 2, dec!(512.9)),
            candidate("CCC", 41, dec!(3.07)),
        ];
        for budget in [dec!(0), dec!(1), dec!(99.99), dec!(777), dec!(1500), dec!(5000)] {
            let allocation = allocate_floors(&candidates, budget);
            assert!(allocation.total_floor_cost <= budget);
            assert_eq!(allocation.leftover_budget, budget - allocation.total_floor_cost);
        }
    }
}
