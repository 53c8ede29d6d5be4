//! Market listings and the binary markets derived from them.
//!
//! A `MarketListing` mirrors what the listing service hands back, with every
//! field optional and list fields accepted either as JSON arrays or as
//! JSON-encoded strings (Gamma returns `"[\"123\", \"456\"]"`). A `Market` is
//! the validated two-outcome view the engine works with.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title used when a listing has no usable question.
pub const UNTITLED_MARKET: &str = "Untitled market";

/// A list-valued listing field, either inline or JSON-encoded in a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    List(Vec<Value>),
    Encoded(String),
}

impl ListField {
    /// Returns the items as strings, or `None` if the field is malformed.
    ///
    /// Numeric items are rendered as their decimal text.
    #[must_use]
    pub fn items(&self) -> Option<Vec<String>> {
        match self {
            Self::List(values) => values.iter().map(value_text).collect(),
            Self::Encoded(text) => {
                let values: Vec<Value> = serde_json::from_str(text).ok()?;
                values.iter().map(value_text).collect()
            }
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Raw market record from the listing service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<ListField>,
    #[serde(
        default,
        rename = "clobTokenIds",
        skip_serializing_if = "Option::is_none"
    )]
    pub clob_token_ids: Option<ListField>,
    #[serde(default, rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, rename = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, rename = "end_time", skip_serializing_if = "Option::is_none")]
    pub end_time_raw: Option<String>,
}

impl MarketListing {
    /// Returns exactly two non-empty token ids, or `None`.
    ///
    /// Never fails past this boundary: missing, undecodable or non-binary
    /// token lists all map to `None`.
    #[must_use]
    pub fn parse_token_ids(&self) -> Option<[String; 2]> {
        let ids = self.clob_token_ids.as_ref()?.items()?;
        let [first, second]: [String; 2] = ids.try_into().ok()?;
        let (first, second) = (first.trim().to_string(), second.trim().to_string());

        if first.is_empty() || second.is_empty() {
            return None;
        }

        Some([first, second])
    }

    /// Returns the two outcome labels.
    ///
    /// A listing without an outcomes field is read as a Yes/No market; a
    /// present field that is malformed or not binary yields `None`.
    #[must_use]
    pub fn parse_outcomes(&self) -> Option<[String; 2]> {
        match &self.outcomes {
            None => Some(["Yes".to_string(), "No".to_string()]),
            Some(field) => field.items()?.try_into().ok(),
        }
    }

    /// Parses the end/resolution time, trying `endDate`, `endTime`, then `end_time`.
    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        [&self.end_date, &self.end_time, &self.end_time_raw]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .and_then(|s| parse_datetime(s))
    }

    /// Trimmed question, or the untitled placeholder.
    #[must_use]
    pub fn title(&self) -> String {
        self.question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(UNTITLED_MARKET)
            .to_string()
    }

    /// Converts to a `Market` if the listing is a well-formed binary market.
    #[must_use]
    pub fn to_market(&self) -> Option<Market> {
        let token_ids = self.parse_token_ids()?;
        let outcome_labels = self.parse_outcomes()?;

        Some(Market {
            title: self.title(),
            outcome_labels,
            token_ids,
            end_time: self.end_time(),
        })
    }
}

/// A binary market resolved inside the backtest window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub title: String,
    pub outcome_labels: [String; 2],
    pub token_ids: [String; 2],
    pub end_time: Option<DateTime<Utc>>,
}

impl Market {
    /// Creates a market directly, mainly for fixtures.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        outcome_labels: [&str; 2],
        token_ids: [&str; 2],
    ) -> Self {
        Self {
            title: title.into(),
            outcome_labels: outcome_labels.map(str::to_string),
            token_ids: token_ids.map(str::to_string),
            end_time: None,
        }
    }
}

/// Keeps listings whose end time parses and is at or after `cutoff`.
#[must_use]
pub fn retain_recent(listings: Vec<MarketListing>, cutoff: DateTime<Utc>) -> Vec<MarketListing> {
    listings
        .into_iter()
        .filter(|listing| listing.end_time().is_some_and(|end| end >= cutoff))
        .collect()
}

/// Earliest end time kept by a `lookback_days` window ending at `now`.
///
/// Windows reaching past chrono's range saturate to the earliest instant, so
/// every dated listing is kept.
#[must_use]
pub fn lookback_cutoff(now: DateTime<Utc>, lookback_days: i64) -> DateTime<Utc> {
    Duration::try_days(lookback_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parses a timestamp string as UTC.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]`
/// and bare dates (midnight UTC). Naive values are taken as UTC.
#[must_use]
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
