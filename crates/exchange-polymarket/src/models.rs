//! Wire models for the Gamma and CLOB endpoints.
//!
//! History rows are kept as raw JSON and read leniently: field names and
//! value types vary between CLOB deployments.

use leader_ev_backtest::binary::{RawPricePoint, RawTimestamp};
use serde::Deserialize;
use serde_json::Value;

/// Keys tried, in order, for a history row's timestamp.
pub const TIMESTAMP_KEYS: [&str; 3] = ["t", "timestamp", "time"];

/// CLOB `/prices-history` response.
#[derive(Debug, Default, Deserialize)]
pub struct PricesHistoryResponse {
    #[serde(default)]
    pub history: Option<Vec<Value>>,
}

impl PricesHistoryResponse {
    /// Parsed rows; non-object entries are skipped.
    #[must_use]
    pub fn rows(&self) -> Vec<RawPricePoint> {
        self.history
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(parse_history_row)
            .collect()
    }
}

/// Reads one history row. Returns `None` for non-object entries.
///
/// A missing or mistyped field becomes `None` in the result and is dropped
/// during normalization.
#[must_use]
pub fn parse_history_row(value: &Value) -> Option<RawPricePoint> {
    let row = value.as_object()?;

    let t = TIMESTAMP_KEYS
        .iter()
        .filter_map(|key| row.get(*key))
        .find(|v| !v.is_null())
        .and_then(raw_timestamp);

    let p = row.get("p").and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    Some(RawPricePoint { t, p })
}

fn raw_timestamp(value: &Value) -> Option<RawTimestamp> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(RawTimestamp::Unix)
            .or_else(|| n.as_f64().map(RawTimestamp::UnixFloat)),
        Value::String(s) => Some(RawTimestamp::Text(s.clone())),
        _ => None,
    }
}
