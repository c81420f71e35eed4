//! Configuration management for the rebalancer.
//!
//! Loads settings from environment variables and config files.

use crate::strategy::{StrategyConfig, StrategyKind};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target universe selection
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Promotion strategy selection
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// External optimizer connectivity
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Number of positive-momentum assets to hold
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Separately weighted alternative-asset bucket (e.g., gold, bonds)
    #[serde(default)]
    pub alternative: Option<AlternativeBucketConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeBucketConfig {
    /// Tickers forming the bucket, in allocation order
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Portfolio percentage reserved for the bucket (0-100)
    #[serde(default = "default_alternative_weight_pct")]
    pub weight_pct: Decimal,
    /// Only include bucket tickers that show absolute momentum
    #[serde(default = "default_require_momentum")]
    pub require_momentum: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Attempt the external solver before local heuristics
    #[serde(default = "default_optimizer_enabled")]
    pub enabled: bool,
    /// Solver service base URL (solver is skipped when unset)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Solver request timeout in seconds
    #[serde(default = "default_optimizer_timeout")]
    pub timeout_secs: u64,
    /// Allowed deviation band for regular assets, in percentage points
    #[serde(default = "default_allowed_deviation")]
    pub default_allowed_deviation: Decimal,
    /// Tighter band applied to alternative-bucket assets
    #[serde(default = "default_alternative_allowed_deviation")]
    pub alternative_allowed_deviation: Decimal,
}

// Default value functions
fn default_top_n() -> usize {
    3
}

fn default_alternative_weight_pct() -> Decimal {
    Decimal::new(20, 0) // 20% of the portfolio
}

fn default_require_momentum() -> bool {
    true
}

fn default_optimizer_enabled() -> bool {
    true
}

fn default_optimizer_timeout() -> u64 {
    10
}

fn default_allowed_deviation() -> Decimal {
    Decimal::new(5, 0) // +/- 5 percentage points
}

fn default_alternative_allowed_deviation() -> Decimal {
    Decimal::new(2, 0) // +/- 2 percentage points
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("REBAL"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.selection.top_n >= 1, "top_n must be at least 1");

        if let Some(alternative) = &self.selection.alternative {
            anyhow::ensure!(
                alternative.weight_pct >= Decimal::ZERO
                    && alternative.weight_pct <= Decimal::ONE_HUNDRED,
                "alternative weight_pct must be between 0 and 100"
            );
        }

        anyhow::ensure!(
            self.optimizer.timeout_secs >= 1,
            "optimizer timeout_secs must be at least 1"
        );

        anyhow::ensure!(
            self.optimizer.alternative_allowed_deviation > Decimal::ZERO
                && self.optimizer.alternative_allowed_deviation
                    <= self.optimizer.default_allowed_deviation,
            "alternative_allowed_deviation must be positive and no wider than default_allowed_deviation"
        );

        self.strategy
            .validate()
            .context("Invalid strategy configuration")?;

        Ok(())
    }

    /// Tickers that form the alternative-asset bucket.
    pub fn alternative_tickers(&self) -> &[String] {
        self.selection
            .alternative
            .as_ref()
            .map(|a| a.tickers.as_slice())
            .unwrap_or(&[])
    }

    /// Override the strategy selection (CLI flags take precedence over files).
    pub fn with_strategy(
        mut self,
        primary: Option<StrategyKind>,
        fallback: Option<StrategyKind>,
        disable_fallback: bool,
    ) -> Self {
        if let Some(primary) = primary {
            self.strategy.primary = primary;
        }
        if let Some(fallback) = fallback {
            self.strategy.fallback = Some(fallback);
            self.strategy.enable_fallback = true;
        }
        if disable_fallback {
            self.strategy.enable_fallback = false;
        }
        self
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            alternative: None,
        }
    }
}

impl Default for AlternativeBucketConfig {
    fn default() -> Self {
        Self {
            tickers: Vec::new(),
            weight_pct: default_alternative_weight_pct(),
            require_momentum: default_require_momentum(),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: default_optimizer_enabled(),
            base_url: None,
            timeout_secs: default_optimizer_timeout(),
            default_allowed_deviation: default_allowed_deviation(),
            alternative_allowed_deviation: default_alternative_allowed_deviation(),
        }
    }
}
