//! Gamma API client for closed-market discovery.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use leader_ev_backtest::{MarketListing, MarketSource};
use leader_ev_core::PolymarketConfig;
use nonzero_ext::nonzero;
use reqwest::Client;
use serde_json::Value;

/// Gamma API base URL.
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Default page size for `/markets`.
pub const DEFAULT_LISTING_LIMIT: u32 = 500;

pub(crate) type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Gamma API client for closed-market discovery.
pub struct GammaClient {
    /// HTTP client
    http: Client,
    /// Base URL for API
    base_url: String,
    /// Page size requested from `/markets`
    listing_limit: u32,
    /// Rate limiter (requests per minute)
    rate_limiter: Arc<DirectRateLimiter>,
}

impl Default for GammaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaClient {
    /// Creates a new client with default settings.
    ///
    /// Rate limited to 30 requests per minute by default.
    pub fn new() -> Self {
        Self::with_rate_limit(nonzero!(30u32))
    }

    /// Creates a new client with custom rate limit.
    pub fn with_rate_limit(requests_per_minute: NonZeroU32) -> Self {
        let quota = Quota::per_minute(requests_per_minute);

        Self {
            http: Client::new(),
            base_url: GAMMA_API_URL.to_string(),
            listing_limit: DEFAULT_LISTING_LIMIT,
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
            .context("Failed to build Gamma HTTP client")?;
        let rpm = NonZeroU32::new(config.requests_per_minute).unwrap_or(nonzero!(30u32));

        Ok(Self {
            http,
            base_url: config.gamma_url.trim_end_matches('/').to_string(),
            listing_limit: config.listing_limit,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rpm))),
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_listing_limit(mut self, limit: u32) -> Self {
        self.listing_limit = limit;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for rate limit and makes a GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gamma API error {}: {}", status, text));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    /// Lists closed markets, most recently ended first.
    ///
    /// Entries that do not decode as a listing object are dropped.
    pub async fn list_closed_markets(
        &self,
        keyword: Option<&str>,
        limit: u32,
    ) -> Result<Vec<MarketListing>> {
        let path = format!(
            "/markets?closed=true&limit={}&order=endDate&ascending=false&search={}",
            limit,
            urlencoding::encode(keyword.unwrap_or(""))
        );

        let raw: Vec<Value> = self.get(&path).await?;
        let total = raw.len();
        let (listings, dropped) = decode_listings(raw);

        if dropped > 0 {
            tracing::info!(
                total,
                dropped,
                keyword = keyword.unwrap_or(""),
                "Dropped undecodable market listings"
            );
        }
        tracing::debug!(
            total,
            decoded = listings.len(),
            keyword = keyword.unwrap_or(""),
            "Fetched closed markets"
        );

        Ok(listings)
    }
}

/// Decodes raw `/markets` entries, returning the listings and the number of
/// entries that were not listing objects.
fn decode_listings(raw: Vec<Value>) -> (Vec<MarketListing>, usize) {
    let total = raw.len();
    let listings: Vec<MarketListing> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    let dropped = total - listings.len();
    (listings, dropped)
}

#[async_trait]
impl MarketSource for GammaClient {
    async fn closed_markets(&self, keyword: Option<&str>) -> Result<Vec<MarketListing>> {
        self.list_closed_markets(keyword, self.listing_limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = GammaClient::new();
        assert_eq!(client.base_url(), GAMMA_API_URL);
    }

    #[test]
    fn test_client_from_config_trims_slash() {
        let config = PolymarketConfig {
            gamma_url: "http://localhost:8080/".to_string(),
            ..PolymarketConfig::default()
        };
        let client = GammaClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_list_closed_markets_query_and_decode() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/markets"))
            .and(query_param("closed", "true"))
            .and(query_param("limit", "500"))
            .and(query_param("order", "endDate"))
            .and(query_param("ascending", "false"))
            .and(query_param("search", "bitcoin price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "question": "Bitcoin above 100k?",
                    "outcomes": "[\"Yes\", \"No\"]",
                    "clobTokenIds": "[\"111\", \"222\"]",
                    "endDate": "2026-10-10T00:00:00Z"
                },
                {
                    "question": "Bitcoin below 50k?",
                    "clobTokenIds": ["333", "444"],
                    "endDate": "2026-10-09T00:00:00Z"
                },
                "not a market"
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = GammaClient::new().with_base_url(mock_server.uri());
        let markets = client.closed_markets(Some("bitcoin price")).await.unwrap();

        assert_eq!(markets.len(), 2);
        assert_eq!(markets[0].title(), "Bitcoin above 100k?");
        assert_eq!(
            markets[0].parse_token_ids(),
            Some(["111".to_string(), "222".to_string()])
        );
        assert_eq!(
            markets[1].parse_token_ids(),
            Some(["333".to_string(), "444".to_string()])
        );
    }

    #[test]
    fn test_decode_listings_counts_dropped_entries() {
        let raw = vec![
            serde_json::json!({ "question": "Fed cut in December?" }),
            serde_json::json!("not a market"),
            serde_json::json!(42),
            serde_json::json!({ "question": ["not", "a", "string"] }),
            serde_json::json!({}),
        ];

        let (listings, dropped) = decode_listings(raw);
        assert_eq!(listings.len(), 2);
        assert_eq!(dropped, 3);
        assert_eq!(listings[0].title(), "Fed cut in December?");
    }

    #[tokio::test]
    async fn test_list_closed_markets_empty_keyword() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/markets"))
            .and(query_param("search", ""))
            .and(query_param("limit", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let client = GammaClient::new()
            .with_base_url(mock_server.uri())
            .with_listing_limit(25);
        let markets = client.closed_markets(None).await.unwrap();
        assert!(markets.is_empty());
    }

    #[tokio::test]
    async fn test_list_closed_markets_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/markets"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&mock_server)
            .await;

        let client = GammaClient::new().with_base_url(mock_server.uri());
        let err = client.list_closed_markets(None, 10).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
