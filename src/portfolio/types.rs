//! Input snapshot types consumed by the rebalancing engine.

use crate::error::{RebalanceError, Result};
use crate::utils::decimal::share_cost;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Price substituted when a ticker has no usable quote.
pub const DEFAULT_PRICE: Decimal = Decimal::ONE;

/// A position currently held in the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Display name (e.g., "Vanguard Total Stock Market")
    #[serde(default)]
    pub name: String,
    /// Whole shares held
    pub shares: i64,
    /// Last known price per share
    pub price: Decimal,
}

impl Holding {
    pub fn new(name: impl Into<String>, shares: i64, price: Decimal) -> Self {
        Self {
            name: name.into(),
            shares,
            price,
        }
    }

    /// Market value at the holding's own price.
    pub fn value(&self) -> Decimal {
        share_cost(self.shares, self.price)
    }
}

/// Externally computed momentum metrics for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentumScore {
    /// Average momentum across lookback windows
    pub average: Decimal,
    /// Whether the asset beats the risk-free benchmark
    #[serde(default)]
    pub absolute_momentum: bool,
}

impl MomentumScore {
    pub fn new(average: Decimal, absolute_momentum: bool) -> Self {
        Self {
            average,
            absolute_momentum,
        }
    }

    /// Eligible for the momentum ranking.
    pub fn is_positive(&self) -> bool {
        self.absolute_momentum && self.average > Decimal::ZERO
    }
}

/// Immutable snapshot of everything one rebalance run needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceRequest {
    /// Ticker -> current holding
    #[serde(default)]
    pub holdings: BTreeMap<String, Holding>,
    /// Ticker -> momentum metrics
    #[serde(default)]
    pub momentum: HashMap<String, MomentumScore>,
    /// Ticker -> latest quote
    #[serde(default)]
    pub prices: HashMap<String, Decimal>,
    /// Category -> member tickers
    #[serde(default)]
    pub universe: BTreeMap<String, Vec<String>>,
    /// Uninvested cash available in addition to sale proceeds
    #[serde(default)]
    pub extra_cash: Decimal,
}

impl RebalanceRequest {
    /// Reject requests that would make any allocation meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.extra_cash < Decimal::ZERO {
            return Err(RebalanceError::InvalidInput(format!(
                "extra cash must be non-negative, got {}",
                self.extra_cash
            )));
        }

        for (ticker, holding) in &self.holdings {
            if holding.shares < 0 {
                return Err(RebalanceError::InvalidInput(format!(
                    "{ticker}: negative share count {}",
                    holding.shares
                )));
            }
            if holding.price <= Decimal::ZERO {
                return Err(RebalanceError::InvalidInput(format!(
                    "{ticker}: non-positive holding price {}",
                    holding.price
                )));
            }
        }

        for (ticker, price) in &self.prices {
            if *price <= Decimal::ZERO {
                return Err(RebalanceError::InvalidInput(format!(
                    "{ticker}: non-positive quote {price}"
                )));
            }
        }

        Ok(())
    }

    /// Current price for a ticker: quote, then holding price, then the default.
    pub fn resolve_price(&self, ticker: &str) -> Decimal {
        if let Some(price) = self.prices.get(ticker).filter(|p| **p > Decimal::ZERO) {
            return *price;
        }
        if let Some(holding) = self.holdings.get(ticker).filter(|h| h.price > Decimal::ZERO) {
            return holding.price;
        }
        warn!(%ticker, default = %DEFAULT_PRICE, "No price available, using default");
        DEFAULT_PRICE
    }

    /// Shares currently held (zero if not held).
    pub fn held_shares(&self, ticker: &str) -> i64 {
        self.holdings.get(ticker).map(|h| h.shares).unwrap_or(0)
    }

    /// Whether the ticker belongs to any universe category.
    pub fn in_universe(&self, ticker: &str) -> bool {
        self.universe
            .values()
            .any(|members| members.iter().any(|t| t == ticker))
    }

    /// Market value of every holding at resolved prices.
    pub fn holdings_value(&self) -> Decimal {
        self.holdings
            .iter()
            .map(|(ticker, h)| share_cost(h.shares, self.resolve_price(ticker)))
            .sum()
    }

    /// Total portfolio value: holdings plus extra cash.
    pub fn total_value(&self) -> Decimal {
        self.holdings_value() + self.extra_cash
    }

    /// Ticker -> momentum average, as consumed by the promotion strategies.
    pub fn momentum_averages(&self) -> HashMap<String, Decimal> {
        self.momentum
            .iter()
            .map(|(ticker, m)| (ticker.clone(), m.average))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_request() -> RebalanceRequest {
        let mut request = RebalanceRequest {
            extra_cash: dec!(500),
            ..Default::default()
        };
        request
            .holdings
            .insert("VTI".to_string(), Holding::new("Total Market", 10, dec!(200)));
        request.prices.insert("VTI".to_string(), dec!(210));
        request
            .universe
            .insert("equity".to_string(), vec!["VTI".to_string(), "VEA".to_string()]);
        request
    }

    #[test]
    fn test_resolve_price_prefers_quote() {
        let request = sample_request();
        assert_eq!(request.resolve_price("VTI"), dec!(210));
    }

    #[test]
    fn test_resolve_price_falls_back_to_holding_then_default() {
        let mut request = sample_request();
        request.prices.clear();
        assert_eq!(request.resolve_price("VTI"), dec!(200));
        assert_eq!(request.resolve_price("UNKNOWN"), DEFAULT_PRICE);
    }

    #[test]
    fn test_total_value_uses_resolved_prices() {
        let request = sample_request();
        // 10 * 210 + 500
        assert_eq!(request.total_value(), dec!(2600));
    }

    #[test]
    fn test_validate_rejects_negative_shares() {
        let mut request = sample_request();
        request
            .holdings
            .insert("BAD".to_string(), Holding::new("", -1, dec!(10)));
        assert!(matches!(
            request.validate(),
            Err(RebalanceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_quote() {
        let mut request = sample_request();
        request.prices.insert("VEA".to_string(), Decimal::ZERO);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_cash() {
        let mut request = sample_request();
        request.extra_cash = dec!(-1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_universe_membership() {
        let request = sample_request();
        assert!(request.in_universe("VEA"));
        assert!(!request.in_universe("ZZZ"));
    }

    #[test]
    fn test_request_parses_camel_case_json() {
        let json = r#"{
            "holdings": {"VTI": {"name": "Total Market", "shares": 3, "price": 200.5, "value": 601.5}},
            "momentum": {"VTI": {"average": 0.12, "absoluteMomentum": true}},
            "prices": {"VTI": 201},
            "universe": {"equity": ["VTI"]},
            "extraCash": 1000
        }"#;

        let request: RebalanceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.holdings["VTI"].shares, 3);
        assert!(request.momentum["VTI"].is_positive());
        assert_eq!(request.extra_cash, dec!(1000));
    }
}
