use anyhow::Result;
use async_trait::async_trait;

use crate::binary::series::RawPricePoint;
use crate::market::MarketListing;

/// Market listing service.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Closed markets, most recently ended first, optionally filtered by a
    /// search keyword.
    async fn closed_markets(&self, keyword: Option<&str>) -> Result<Vec<MarketListing>>;
}

/// Price history service.
///
/// An empty result means "no data for this token" and is not an error.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_history(&self, token_id: &str) -> Result<Vec<RawPricePoint>>;
}

#[async_trait]
impl<T: MarketSource + ?Sized> MarketSource for Box<T> {
    async fn closed_markets(&self, keyword: Option<&str>) -> Result<Vec<MarketListing>> {
        (**self).closed_markets(keyword).await
    }
}

#[async_trait]
impl<T: HistorySource + ?Sized> HistorySource for Box<T> {
    async fn fetch_history(&self, token_id: &str) -> Result<Vec<RawPricePoint>> {
        (**self).fetch_history(token_id).await
    }
}
