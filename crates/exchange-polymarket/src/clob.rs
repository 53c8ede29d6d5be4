//! CLOB price-history client.
//!
//! `/prices-history` behaves differently across tokens: some only answer
//! `interval=max`, some need an explicit fidelity. The client walks an ordered
//! list of query variants and keeps the first non-empty history.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use leader_ev_backtest::{HistorySource, RawPricePoint};
use leader_ev_core::PolymarketConfig;
use nonzero_ext::nonzero;
use reqwest::Client;

use crate::gamma::DirectRateLimiter;
use crate::models::PricesHistoryResponse;

/// Default Polymarket CLOB API base URL.
pub const POLYMARKET_CLOB_URL: &str = "https://clob.polymarket.com";

/// Query suffixes tried in order for `/prices-history`.
pub const HISTORY_QUERY_VARIANTS: [&str; 3] =
    ["interval=all", "interval=max", "interval=all&fidelity=60"];

/// Polymarket CLOB price-history client.
pub struct ClobClient {
    http: Client,
    base_url: String,
    rate_limiter: Arc<DirectRateLimiter>,
}

impl Default for ClobClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ClobClient {
    /// Creates a new client with default settings.
    ///
    /// Rate limited to 60 requests per minute by default.
    pub fn new() -> Self {
        Self::with_rate_limit(nonzero!(60u32))
    }

    /// Creates a new client with custom rate limit.
    pub fn with_rate_limit(requests_per_minute: NonZeroU32) -> Self {
        let quota = Quota::per_minute(requests_per_minute);

        Self {
            http: Client::new(),
            base_url: POLYMARKET_CLOB_URL.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Creates a client from the `[polymarket]` config section.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &PolymarketConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build CLOB HTTP client")?;
        let rpm = NonZeroU32::new(config.requests_per_minute).unwrap_or(nonzero!(60u32));

        Ok(Self {
            http,
            base_url: config.clob_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rpm))),
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one query variant of a token's history.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-2xx status or an
    /// undecodable body.
    pub async fn fetch_history_variant(
        &self,
        token_id: &str,
        variant: &str,
    ) -> Result<Vec<RawPricePoint>> {
        self.rate_limiter.until_ready().await;

        let url = format!(
            "{}/prices-history?market={}&{}",
            self.base_url,
            urlencoding::encode(token_id),
            variant
        );
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to fetch price history")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("CLOB API error {}: {}", status, text));
        }

        let body: PricesHistoryResponse = response
            .json()
            .await
            .context("Failed to parse price history")?;

        Ok(body.rows())
    }

    /// Fetches a token's full history, trying each query variant in turn.
    ///
    /// Returns an empty sequence when no variant yields data.
    pub async fn fetch_history(&self, token_id: &str) -> Vec<RawPricePoint> {
        for variant in HISTORY_QUERY_VARIANTS {
            match self.fetch_history_variant(token_id, variant).await {
                Ok(rows) if !rows.is_empty() => {
                    tracing::debug!(token_id, variant, rows = rows.len(), "Fetched price history");
                    return rows;
                }
                Ok(_) => {
                    tracing::debug!(token_id, variant, "Empty price history, trying next variant");
                }
                Err(e) => {
                    tracing::debug!(token_id, variant, error = %e, "Price history request failed");
                }
            }
        }

        tracing::warn!(token_id, "No price history from any query variant");
        Vec::new()
    }
}

#[async_trait]
impl HistorySource for ClobClient {
    async fn fetch_history(&self, token_id: &str) -> Result<Vec<RawPricePoint>> {
        Ok(ClobClient::fetch_history(self, token_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leader_ev_backtest::binary::RawTimestamp;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = ClobClient::new();
        assert_eq!(client.base_url(), POLYMARKET_CLOB_URL);
    }

    #[tokio::test]
    async fn test_fetch_history_first_variant() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/prices-history"))
            .and(query_param("market", "111"))
            .and(query_param("interval", "all"))
            .and(query_param_is_missing("fidelity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "history": [
                    { "t": 1_700_000_000, "p": 0.61 },
                    { "t": 1_700_003_600, "p": 0.64 }
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ClobClient::new().with_base_url(mock_server.uri());
        let rows = client.fetch_history("111").await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].t, Some(RawTimestamp::Unix(1_700_000_000)));
        assert_eq!(rows[1].p, Some(0.64));
    }

    #[tokio::test]
    async fn test_fetch_history_falls_back_to_later_variants() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/prices-history"))
            .and(query_param("interval", "all"))
            .and(query_param_is_missing("fidelity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "history": [] })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/prices-history"))
            .and(query_param("interval", "max"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/prices-history"))
            .and(query_param("interval", "all"))
            .and(query_param("fidelity", "60"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "history": [{ "timestamp": "1700000000", "p": "0.5" }]
            })))
            .mount(&mock_server)
            .await;

        let client = ClobClient::new().with_base_url(mock_server.uri());
        let rows = client.fetch_history("222").await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].p, Some(0.5));
    }

    #[tokio::test]
    async fn test_fetch_history_all_variants_fail_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/prices-history"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = ClobClient::new().with_base_url(mock_server.uri());
        let rows = HistorySource::fetch_history(&client, "missing").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_history_variant_reports_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/prices-history"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&mock_server)
            .await;

        let client = ClobClient::new().with_base_url(mock_server.uri());
        let err = client
            .fetch_history_variant("333", "interval=all")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
