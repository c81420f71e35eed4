//! HTTP client for the portfolio optimization service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use super::traits::PortfolioOptimizer;
use super::types::{OptimizeRequest, OptimizeResponse, SolverError};
use crate::config::OptimizerConfig;

/// Path of the solve endpoint, relative to the service base URL.
const OPTIMIZE_PATH: &str = "/optimize";

/// Client for a solver service exposing `POST /optimize`.
#[derive(Debug, Clone)]
pub struct SolverClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl SolverClient {
    /// Create a client from the optimizer section of the config.
    pub fn from_config(config: &OptimizerConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .context("optimizer.base_url is not set")?;
        Self::with_base_url(base_url, Duration::from_secs(config.timeout_secs))
    }

    /// Create a client for a custom base URL.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, err: reqwest::Error) -> SolverError {
        if err.is_timeout() {
            SolverError::Timeout(self.timeout)
        } else {
            SolverError::Transport(err)
        }
    }
}

#[async_trait]
impl PortfolioOptimizer for SolverClient {
    fn name(&self) -> &'static str {
        "solver-http"
    }

    #[instrument(skip(self, request), name = "solver_optimize", fields(targets = request.target_etfs.len()))]
    async fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, SolverError> {
        let url = format!("{}{}", self.base_url, OPTIMIZE_PATH);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SolverError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: OptimizeResponse =
            serde_json::from_str(&body).map_err(|e| SolverError::Decode(e.to_string()))?;

        debug!(
            status = %parsed.solver_status,
            allocations = parsed.allocations.len(),
            "Solver responded"
        );

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::types::SolverStatus;
    use crate::strategy::StrategyKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> OptimizeRequest {
        OptimizeRequest {
            current_holdings: Vec::new(),
            target_etfs: Vec::new(),
            extra_cash: dec!(1000),
            optimization_strategy: StrategyKind::RemainderFirst,
        }
    }

    fn client(server: &MockServer) -> SolverClient {
        SolverClient::with_base_url(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_from_config_requires_base_url() {
        assert!(SolverClient::from_config(&OptimizerConfig::default()).is_err());

        let config = OptimizerConfig {
            base_url: Some("http://localhost:8000/".to_string()),
            ..Default::default()
        };
        let client = SolverClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_optimize_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/optimize"))
            .and(body_partial_json(serde_json::json!({
                "extraCash": 1000.0,
                "optimizationStrategy": "remainder-first"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "solverStatus": "optimal",
                "allocations": [
                    {"etfName": "VTI", "finalShares": 4, "deviation": 0.1, "finalValue": 1000.0}
                ],
                "optimizationMetrics": {"unusedBudget": 0}
            })))
            .mount(&server)
            .await;

        let response = client(&server).optimize(&request()).await.unwrap();

        assert_eq!(response.solver_status, SolverStatus::Optimal);
        assert_eq!(response.allocations[0].etf_name, "VTI");
        assert_eq!(response.allocations[0].final_shares, 4);
        assert_eq!(response.optimization_metrics.unused_budget, Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_optimize_passes_through_infeasible() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/optimize"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"solverStatus": "infeasible"})),
            )
            .mount(&server)
            .await;

        let response = client(&server).optimize(&request()).await.unwrap();
        assert_eq!(response.solver_status, SolverStatus::Infeasible);
        assert!(response.allocations.is_empty());
    }

    #[tokio::test]
    async fn test_optimize_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/optimize"))
            .respond_with(ResponseTemplate::new(503).set_body_string("solver busy"))
            .mount(&server)
            .await;

        let err = client(&server).optimize(&request()).await.unwrap_err();
        match err {
            SolverError::HttpStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "solver busy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_optimize_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/optimize"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).optimize(&request()).await.unwrap_err();
        assert!(matches!(err, SolverError::Decode(_)));
    }

    #[tokio::test]
    async fn test_optimize_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/optimize"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(serde_json::json!({"solverStatus": "optimal"})),
            )
            .mount(&server)
            .await;

        let client = SolverClient::with_base_url(&server.uri(), Duration::from_millis(100)).unwrap();
        let err = client.optimize(&request()).await.unwrap_err();
        assert!(matches!(err, SolverError::Timeout(_)));
    }
}
