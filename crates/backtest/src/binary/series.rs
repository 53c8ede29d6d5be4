//! Price series normalization and two-outcome alignment.
//!
//! Histories for the two outcome tokens are sampled independently. Alignment
//! is an exact-timestamp inner join: only instants present in both series
//! survive, nothing is interpolated.
//!
//! # Duplicate timestamps
//!
//! Duplicates inside one series are kept. The join then behaves like a
//! standard equi-join and emits the cross product of the tied rows, so two
//! rows at `t` on one side and three on the other produce six observations
//! at `t`. Within a tie the order is (outcome-1 row order, outcome-2 row order).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::market::parse_datetime;

/// Timestamp as delivered by a history source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Unix seconds.
    Unix(i64),
    /// Fractional unix seconds.
    UnixFloat(f64),
    /// Unix seconds or an RFC 3339 instant, as text.
    Text(String),
}

impl RawTimestamp {
    /// Resolves to a UTC instant truncated to whole seconds.
    #[must_use]
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unix(secs) => DateTime::from_timestamp(*secs, 0),
            Self::UnixFloat(secs) => unix_float(*secs),
            Self::Text(text) => {
                let text = text.trim();
                if let Ok(secs) = text.parse::<i64>() {
                    return DateTime::from_timestamp(secs, 0);
                }
                if let Ok(secs) = text.parse::<f64>() {
                    return unix_float(secs);
                }
                parse_datetime(text).and_then(|dt| DateTime::from_timestamp(dt.timestamp(), 0))
            }
        }
    }
}

fn unix_float(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(secs.floor() as i64, 0)
}

/// One history row before normalization. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPricePoint {
    pub t: Option<RawTimestamp>,
    pub p: Option<f64>,
}

impl RawPricePoint {
    /// Convenience constructor for unix-second rows.
    #[must_use]
    pub fn new(t: i64, p: f64) -> Self {
        Self {
            t: Some(RawTimestamp::Unix(t)),
            p: Some(p),
        }
    }
}

/// One outcome's implied probability at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Time-ascending history of one outcome token.
pub type OutcomeSeries = Vec<PricePoint>;

/// Simultaneous prices of both outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointObservation {
    pub timestamp: DateTime<Utc>,
    pub price_outcome_1: f64,
    pub price_outcome_2: f64,
}

impl JointObservation {
    /// Swaps the two price columns.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            timestamp: self.timestamp,
            price_outcome_1: self.price_outcome_2,
            price_outcome_2: self.price_outcome_1,
        }
    }
}

/// Normalizes raw rows into a time-ascending series.
///
/// Rows with a missing or unparseable timestamp, a missing price, a
/// non-finite price, or a price outside `[0, 1]` are dropped. The sort is
/// stable, so rows sharing a timestamp keep their delivery order.
#[must_use]
pub fn normalize(rows: &[RawPricePoint]) -> OutcomeSeries {
    let mut series: OutcomeSeries = rows
        .iter()
        .filter_map(|row| {
            let timestamp = row.t.as_ref()?.to_utc()?;
            let price = row.p?;
            if !price.is_finite() || !(0.0..=1.0).contains(&price) {
                return None;
            }
            Some(PricePoint { timestamp, price })
        })
        .collect();

    series.sort_by_key(|point| point.timestamp);
    series
}

/// Inner-joins two series on exact timestamp equality.
///
/// The result is sorted ascending by timestamp. An empty result means the
/// market has no usable joint history.
#[must_use]
pub fn align(series_1: &[PricePoint], series_2: &[PricePoint]) -> Vec<JointObservation> {
    let mut left = series_1.to_vec();
    let mut right = series_2.to_vec();
    left.sort_by_key(|p| p.timestamp);
    right.sort_by_key(|p| p.timestamp);

    let mut joined = Vec::new();
    for point in &left {
        let start = right.partition_point(|r| r.timestamp < point.timestamp);
        let end = right.partition_point(|r| r.timestamp <= point.timestamp);

        joined.extend(right[start..end].iter().map(|other| JointObservation {
            timestamp: point.timestamp,
            price_outcome_1: point.price,
            price_outcome_2: other.price,
        }));
    }

    joined
}
