//! In-memory and file-backed sources for offline replay and tests.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::binary::series::{RawPricePoint, RawTimestamp};
use crate::market::MarketListing;
use crate::source::{HistorySource, MarketSource};

/// Fixed list of market listings.
#[derive(Debug, Clone, Default)]
pub struct StaticMarkets {
    listings: Vec<MarketListing>,
}

impl StaticMarkets {
    #[must_use]
    pub fn new(listings: Vec<MarketListing>) -> Self {
        Self { listings }
    }

    /// Loads listings from a JSON array file (same shape as the listing API).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of
    /// listing objects.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read markets file {}", path.display()))?;
        let listings: Vec<MarketListing> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse markets file {}", path.display()))?;

        Ok(Self::new(listings))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[async_trait]
impl MarketSource for StaticMarkets {
    /// Filters by case-insensitive substring match on the question.
    async fn closed_markets(&self, keyword: Option<&str>) -> Result<Vec<MarketListing>> {
        let Some(keyword) = keyword.map(str::to_lowercase) else {
            return Ok(self.listings.clone());
        };

        Ok(self
            .listings
            .iter()
            .filter(|l| {
                l.question
                    .as_deref()
                    .is_some_and(|q| q.to_lowercase().contains(&keyword))
            })
            .cloned()
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    token_id: String,
    t: String,
    p: Option<f64>,
}

/// Price histories keyed by token id.
#[derive(Debug, Clone, Default)]
pub struct FixtureHistory {
    histories: HashMap<String, Vec<RawPricePoint>>,
}

impl FixtureHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers unix-second `(t, p)` rows for a token, replacing any
    /// previous history.
    #[must_use]
    pub fn with_points(mut self, token_id: impl Into<String>, points: &[(i64, f64)]) -> Self {
        let rows = points.iter().map(|&(t, p)| RawPricePoint::new(t, p)).collect();
        self.histories.insert(token_id.into(), rows);
        self
    }

    /// Registers raw rows for a token.
    #[must_use]
    pub fn with_rows(mut self, token_id: impl Into<String>, rows: Vec<RawPricePoint>) -> Self {
        self.histories.insert(token_id.into(), rows);
        self
    }

    /// Loads histories from a CSV file with a `token_id,t,p` header.
    ///
    /// `t` may be unix seconds or an RFC 3339 instant; a blank `p` becomes a
    /// missing price and is dropped later during normalization.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The CSV file cannot be opened
    /// - A row is missing a column or has a non-numeric price
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open history file {}", path.display()))?;

        let mut histories: HashMap<String, Vec<RawPricePoint>> = HashMap::new();
        for (line, result) in reader.deserialize::<HistoryRow>().enumerate() {
            let row = result.with_context(|| format!("Invalid history row {}", line + 1))?;
            histories.entry(row.token_id).or_default().push(RawPricePoint {
                t: Some(RawTimestamp::Text(row.t)),
                p: row.p,
            });
        }

        Ok(Self { histories })
    }

    #[must_use]
    pub fn token_count(&self) -> usize {
        self.histories.len()
    }
}

#[async_trait]
impl HistorySource for FixtureHistory {
    async fn fetch_history(&self, token_id: &str) -> Result<Vec<RawPricePoint>> {
        Ok(self.histories.get(token_id).cloned().unwrap_or_default())
    }
}
