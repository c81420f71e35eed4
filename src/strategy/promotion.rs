//! Greedy whole-share promotion strategies.
//!
//! Every strategy starts from the floor allocation and spends leftover budget
//! one share at a time. They differ only in the order candidates are visited:
//!
//! | Strategy | Visit order | Loop |
//! |---|---|---|
//! | remainder-first | remainder, descending | single pass, one share max each |
//! | multi-share | price, ascending | repeated first-affordable |
//! | price-efficient | price, ascending | repeated first-affordable |
//! | momentum-weighted | momentum / price, descending | repeated first-affordable |
//! | hybrid | 0.7 * momentum + 0.3 / price, descending | repeated first-affordable |
//!
//! The repeated loop always restarts from the top of the ordering, so early
//! candidates absorb promotions before later ones see any budget.

use super::types::BuyCandidate;
use crate::error::RebalanceError;
use crate::utils::decimal::safe_div;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Momentum weight in the hybrid score.
const HYBRID_MOMENTUM_WEIGHT: Decimal = dec!(0.7);
/// Price-efficiency weight in the hybrid score.
const HYBRID_PRICE_WEIGHT: Decimal = dec!(0.3);

/// Available promotion strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    RemainderFirst,
    MultiShare,
    // Currently behaves exactly like MultiShare; kept as its own option.
    PriceEfficient,
    MomentumWeighted,
    Hybrid,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::RemainderFirst,
        StrategyKind::MultiShare,
        StrategyKind::PriceEfficient,
        StrategyKind::MomentumWeighted,
        StrategyKind::Hybrid,
    ];

    /// Wire name, also sent to the external optimizer as a hint.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::RemainderFirst => "remainder-first",
            StrategyKind::MultiShare => "multi-share",
            StrategyKind::PriceEfficient => "price-efficient",
            StrategyKind::MomentumWeighted => "momentum-weighted",
            StrategyKind::Hybrid => "hybrid",
        }
    }

    /// One-line description for CLI listings.
    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::RemainderFirst => {
                "Promote the largest fractional remainders first, one share each"
            }
            StrategyKind::MultiShare => "Keep buying the cheapest affordable share",
            StrategyKind::PriceEfficient => "Cheapest affordable share first (same as multi-share)",
            StrategyKind::MomentumWeighted => "Highest momentum per dollar first",
            StrategyKind::Hybrid => "Blend of momentum (70%) and price efficiency (30%)",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = RebalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| RebalanceError::InvalidInput(format!("unknown strategy '{s}'")))
    }
}

/// Spend `budget` on single-share promotions on top of each candidate's floor.
///
/// Returns ticker -> final share count (floor plus promotions). At most
/// `max_iterations` promotions are made; candidates with non-positive prices
/// are never considered affordable.
pub fn compute_promotions(
    kind: StrategyKind,
    candidates: &[BuyCandidate],
    budget: Decimal,
    momentum: &HashMap<String, Decimal>,
    max_iterations: u32,
) -> HashMap<String, i64> {
    let mut shares: HashMap<String, i64> = candidates
        .iter()
        .map(|c| (c.ticker.clone(), c.floor_shares))
        .collect();

    let ordered = visit_order(kind, candidates, momentum);

    let remaining = match kind {
        StrategyKind::RemainderFirst => single_pass(&ordered, budget, &mut shares),
        StrategyKind::MultiShare
        | StrategyKind::PriceEfficient
        | StrategyKind::MomentumWeighted
        | StrategyKind::Hybrid => {
            repeated_first_affordable(&ordered, budget, max_iterations, &mut shares)
        }
    };

    debug!(
        strategy = %kind,
        %budget,
        %remaining,
        "Promotion pass complete"
    );

    shares
}

/// Candidates sorted into the strategy's visit order (stable).
fn visit_order<'a>(
    kind: StrategyKind,
    candidates: &'a [BuyCandidate],
    momentum: &HashMap<String, Decimal>,
) -> Vec<&'a BuyCandidate> {
    let mut ordered: Vec<&BuyCandidate> = candidates.iter().collect();

    match kind {
        StrategyKind::RemainderFirst => {
            ordered.sort_by(|a, b| b.remainder.cmp(&a.remainder));
        }
        StrategyKind::MultiShare | StrategyKind::PriceEfficient => {
            ordered.sort_by(|a, b| a.price.cmp(&b.price));
        }
        StrategyKind::MomentumWeighted => {
            // Raw momentum over price, unnormalized
            ordered.sort_by_cached_key(|c| {
                std::cmp::Reverse(safe_div(momentum_of(momentum, c), c.price))
            });
        }
        StrategyKind::Hybrid => {
            ordered.sort_by_cached_key(|c| {
                std::cmp::Reverse(
                    momentum_of(momentum, c) * HYBRID_MOMENTUM_WEIGHT
                        + safe_div(Decimal::ONE, c.price) * HYBRID_PRICE_WEIGHT,
                )
            });
        }
    }

    ordered
}

fn momentum_of(momentum: &HashMap<String, Decimal>, candidate: &BuyCandidate) -> Decimal {
    momentum
        .get(&candidate.ticker)
        .copied()
        .unwrap_or(Decimal::ZERO)
}

fn is_affordable(candidate: &BuyCandidate, remaining: Decimal) -> bool {
    candidate.price > Decimal::ZERO && candidate.price <= remaining
}

/// One share at most per candidate, in order, while affordable.
fn single_pass(
    ordered: &[&BuyCandidate],
    budget: Decimal,
    shares: &mut HashMap<String, i64>,
) -> Decimal {
    let mut remaining = budget;

    for candidate in ordered {
        if is_affordable(candidate, remaining) {
            *shares.entry(candidate.ticker.clone()).or_insert(0) += 1;
            remaining -= candidate.price;
        }
    }

    remaining
}

/// Promote the first affordable candidate, restart from the top, repeat.
fn repeated_first_affordable(
    ordered: &[&BuyCandidate],
    budget: Decimal,
    max_iterations: u32,
    shares: &mut HashMap<String, i64>,
) -> Decimal {
    let mut remaining = budget;
    let mut iterations = 0u32;

    while let Some(candidate) = ordered.iter().find(|c| is_affordable(c, remaining)) {
        if iterations >= max_iterations {
            warn!(
                max_iterations,
                %remaining,
                "Promotion iteration cap reached with budget left"
            );
            break;
        }

        *shares.entry(candidate.ticker.clone()).or_insert(0) += 1;
        remaining -= candidate.price;
        iterations += 1;
    }

    remaining
}
