//! Target universe selection and equal-weight target percentages.

use super::types::TargetAsset;
use crate::config::{AlternativeBucketConfig, SelectionConfig};
use crate::error::{RebalanceError, Result};
use crate::portfolio::MomentumScore;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

/// Picks the top-N positive-momentum assets plus the alternative bucket.
#[derive(Debug, Clone)]
pub struct TargetSelector {
    top_n: usize,
    alternative: Option<AlternativeBucketConfig>,
}

impl TargetSelector {
    /// Create a new target selector.
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            top_n: config.top_n,
            alternative: config.alternative.clone(),
        }
    }

    /// Build the target universe in allocation order.
    ///
    /// Momentum picks come first (best first), followed by the alternative
    /// bucket in configured order. Momentum picks share whatever the bucket
    /// does not claim; when either side is empty the other takes 100%.
    pub fn select(&self, momentum: &HashMap<String, MomentumScore>) -> Result<Vec<TargetAsset>> {
        let bucket = self.alternative_members(momentum);
        let picks = self.momentum_picks(momentum);

        if picks.is_empty() && bucket.is_empty() {
            return Err(RebalanceError::NoEligibleAssets);
        }

        let bucket_weight = match (&self.alternative, picks.is_empty(), bucket.is_empty()) {
            (_, _, true) => Decimal::ZERO,
            (_, true, false) => Decimal::ONE_HUNDRED,
            (Some(alt), false, false) => alt.weight_pct,
            (None, false, false) => Decimal::ZERO,
        };
        let momentum_weight = Decimal::ONE_HUNDRED - bucket_weight;

        let mut targets = Vec::with_capacity(picks.len() + bucket.len());
        targets.extend(equal_weight(&picks, momentum_weight, false));
        targets.extend(equal_weight(&bucket, bucket_weight, true));

        info!(
            momentum_picks = picks.len(),
            alternative = bucket.len(),
            %bucket_weight,
            tickers = ?targets.iter().map(|t| t.ticker.as_str()).collect::<Vec<_>>(),
            "Selected target universe"
        );

        Ok(targets)
    }

    /// Positive-momentum tickers outside the bucket, best first, capped at top-N.
    fn momentum_picks(&self, momentum: &HashMap<String, MomentumScore>) -> Vec<String> {
        let mut ranked: Vec<(&String, &MomentumScore)> = momentum
            .iter()
            .filter(|(ticker, score)| score.is_positive() && !self.is_alternative(ticker))
            .collect();

        ranked.sort_by(|(ta, a), (tb, b)| b.average.cmp(&a.average).then_with(|| ta.cmp(tb)));

        debug!(
            eligible = ranked.len(),
            top_n = self.top_n,
            "Ranked positive-momentum assets"
        );

        ranked
            .into_iter()
            .take(self.top_n)
            .map(|(ticker, _)| ticker.clone())
            .collect()
    }

    /// Bucket tickers that qualify for this run.
    fn alternative_members(&self, momentum: &HashMap<String, MomentumScore>) -> Vec<String> {
        let Some(alt) = &self.alternative else {
            return Vec::new();
        };

        let mut members: Vec<String> = Vec::new();
        for ticker in &alt.tickers {
            let qualifies = !alt.require_momentum
                || momentum
                    .get(ticker)
                    .map(|m| m.absolute_momentum)
                    .unwrap_or(false);
            if qualifies && !members.contains(ticker) {
                members.push(ticker.clone());
            }
        }
        members
    }

    fn is_alternative(&self, ticker: &str) -> bool {
        self.alternative
            .as_ref()
            .map(|alt| alt.tickers.iter().any(|t| t == ticker))
            .unwrap_or(false)
    }
}

fn equal_weight(tickers: &[String], total_pct: Decimal, alternative: bool) -> Vec<TargetAsset> {
    if tickers.is_empty() {
        return Vec::new();
    }
    let each = total_pct / Decimal::from(tickers.len());
    tickers
        .iter()
        .map(|ticker| TargetAsset {
            ticker: ticker.clone(),
            target_pct: each,
            alternative,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn momentum(entries: &[(&str, Decimal, bool)]) -> HashMap<String, MomentumScore> {
        entries
            .iter()
            .map(|(t, avg, abs)| (t.to_string(), MomentumScore::new(*avg, *abs)))
            .collect()
    }

    fn selector(top_n: usize, alternative: Option<AlternativeBucketConfig>) -> TargetSelector {
        TargetSelector::new(&SelectionConfig { top_n, alternative })
    }

    fn gold_bucket(require_momentum: bool) -> AlternativeBucketConfig {
        AlternativeBucketConfig {
            tickers: vec!["GLD".to_string()],
            weight_pct: dec!(20),
            require_momentum,
        }
    }

    #[test]
    fn test_top_n_positive_momentum_ranked() {
        let scores = momentum(&[
            ("VTI", dec!(0.12), true),
            ("VEA", dec!(0.30), true),
            ("VWO", dec!(0.05), true),
            ("BND", dec!(0.20), true),
        ]);

        let targets = selector(3, None).select(&scores).unwrap();
        let tickers: Vec<&str> = targets.iter().map(|t| t.ticker.as_str()).collect();

        assert_eq!(tickers, vec!["VEA", "BND", "VTI"]);
        let total: Decimal = targets.iter().map(|t| t.target_pct).sum();
        assert!((total - dec!(100)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_negative_or_absent_momentum_excluded() {
        let scores = momentum(&[
            ("VTI", dec!(0.12), true),
            ("VEA", dec!(-0.30), true),
            ("VWO", dec!(0.40), false),
        ]);

        let targets = selector(3, None).select(&scores).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].ticker, "VTI");
        assert_eq!(targets[0].target_pct, dec!(100));
    }

    #[test]
    fn test_ties_broken_by_ticker() {
        let scores = momentum(&[("BBB", dec!(0.1), true), ("AAA", dec!(0.1), true)]);
        let targets = selector(1, None).select(&scores).unwrap();
        assert_eq!(targets[0].ticker, "AAA");
    }

    #[test]
    fn test_alternative_bucket_weighted_separately() {
        let scores = momentum(&[
            ("VTI", dec!(0.12), true),
            ("VEA", dec!(0.30), true),
            ("GLD", dec!(0.50), true),
        ]);

        let targets = selector(3, Some(gold_bucket(true))).select(&scores).unwrap();

        assert_eq!(targets.len(), 3);
        // Bucket member is never ranked with momentum picks and comes last
        assert_eq!(targets[2].ticker, "GLD");
        assert!(targets[2].alternative);
        assert_eq!(targets[2].target_pct, dec!(20));
        assert_eq!(targets[0].target_pct, dec!(40));
        assert_eq!(targets[1].target_pct, dec!(40));
    }

    #[test]
    fn test_alternative_without_momentum_dropped_when_required() {
        let scores = momentum(&[("VTI", dec!(0.12), true), ("GLD", dec!(0.50), false)]);

        let targets = selector(3, Some(gold_bucket(true))).select(&scores).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].target_pct, dec!(100));

        let targets = selector(3, Some(gold_bucket(false))).select(&scores).unwrap();
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_bucket_only_takes_everything() {
        let scores = momentum(&[("VTI", dec!(-0.12), true), ("GLD", dec!(0.02), true)]);

        let targets = selector(3, Some(gold_bucket(true))).select(&scores).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].ticker, "GLD");
        assert_eq!(targets[0].target_pct, dec!(100));
    }

    #[test]
    fn test_no_eligible_assets() {
        let scores = momentum(&[("VTI", dec!(-0.12), true)]);
        assert_eq!(
            selector(3, None).select(&scores),
            Err(RebalanceError::NoEligibleAssets)
        );
        assert_eq!(
            selector(3, None).select(&HashMap::new()),
            Err(RebalanceError::NoEligibleAssets)
        );
    }
}
