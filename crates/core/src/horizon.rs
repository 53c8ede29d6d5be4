//! Lookback horizons.
//!
//! A horizon is a labelled duration measured backwards from a market's final
//! observation. Durations are stored in seconds so configs stay plain TOML.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Longest accepted lookback window, in days (about a century).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Longest accepted horizon, in seconds.
pub const MAX_LOOKBACK_SECS: i64 = MAX_LOOKBACK_DAYS * SECONDS_PER_DAY;

/// One entry of the ordered label→duration horizon mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonConfig {
    /// Label used in reports and for the accuracy-prior lookup (e.g. "10d").
    pub label: String,
    /// Lookback before the final observation, in seconds.
    pub lookback_secs: i64,
}

impl HorizonConfig {
    /// Creates a horizon from a label and a duration.
    #[must_use]
    pub fn new(label: impl Into<String>, lookback: Duration) -> Self {
        Self {
            label: label.into(),
            lookback_secs: lookback.num_seconds(),
        }
    }

    /// Convenience constructor for whole-day horizons.
    #[must_use]
    pub fn days(label: impl Into<String>, days: i64) -> Self {
        Self {
            label: label.into(),
            lookback_secs: days.saturating_mul(SECONDS_PER_DAY),
        }
    }

    /// Returns the lookback as a `Duration`, or `None` if `lookback_secs` is
    /// outside the range chrono can represent.
    #[must_use]
    pub fn lookback(&self) -> Option<Duration> {
        Duration::try_seconds(self.lookback_secs)
    }

    /// Parses `label=duration` or a bare duration (the text becomes the label).
    ///
    /// ```
    /// use leader_ev_core::HorizonConfig;
    ///
    /// let h = HorizonConfig::parse("week=7d").unwrap();
    /// assert_eq!(h.label, "week");
    /// assert_eq!(h.lookback_secs, 7 * 86_400);
    ///
    /// let h = HorizonConfig::parse("36h").unwrap();
    /// assert_eq!(h.label, "36h");
    /// ```
    ///
    /// # Errors
    /// Returns `ConfigError::HorizonSyntax` when either part is malformed.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim();
        let (label, duration_text) = match text.split_once('=') {
            Some((label, duration)) => (label.trim(), duration.trim()),
            None => (text, text),
        };

        if label.is_empty() {
            return Err(ConfigError::HorizonSyntax(text.to_string()));
        }

        let lookback = parse_lookback(duration_text)?;
        Ok(Self::new(label, lookback))
    }
}

/// Parses a compact duration such as `30m`, `12h`, `10d` or `2w`.
///
/// # Errors
/// Returns `ConfigError::HorizonSyntax` for an empty string, a missing or
/// unknown unit, a non-positive amount, or a duration longer than
/// `MAX_LOOKBACK_DAYS`.
pub fn parse_lookback(text: &str) -> Result<Duration, ConfigError> {
    let syntax = || ConfigError::HorizonSyntax(text.to_string());

    let text = text.trim();
    let unit = text.chars().last().ok_or_else(syntax)?;
    let amount: i64 = text[..text.len() - unit.len_utf8()]
        .trim()
        .parse()
        .map_err(|_| syntax())?;

    if amount <= 0 {
        return Err(syntax());
    }

    let unit_secs = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => SECONDS_PER_DAY,
        'w' => 7 * SECONDS_PER_DAY,
        _ => return Err(syntax()),
    };

    amount
        .checked_mul(unit_secs)
        .filter(|secs| *secs <= MAX_LOOKBACK_SECS)
        .and_then(Duration::try_seconds)
        .ok_or_else(syntax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lookback_units() {
        assert_eq!(parse_lookback("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_lookback("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_lookback("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_lookback("10d").unwrap(), Duration::days(10));
        assert_eq!(parse_lookback("2W").unwrap(), Duration::weeks(2));
    }

    #[test]
    fn parse_lookback_rejects_garbage() {
        assert!(parse_lookback("").is_err());
        assert!(parse_lookback("d").is_err());
        assert!(parse_lookback("10").is_err());
        assert!(parse_lookback("10y").is_err());
        assert!(parse_lookback("0d").is_err());
        assert!(parse_lookback("-3d").is_err());
    }

    #[test]
    fn parse_with_label() {
        let h = HorizonConfig::parse("short = 36h").unwrap();
        assert_eq!(h.label, "short");
        assert_eq!(h.lookback(), Some(Duration::hours(36)));
    }

    #[test]
    fn parse_bare_duration_uses_text_as_label() {
        let h = HorizonConfig::parse("5d").unwrap();
        assert_eq!(h.label, "5d");
        assert_eq!(h.lookback(), Some(Duration::days(5)));
    }

    #[test]
    fn parse_rejects_empty_label() {
        assert!(matches!(
            HorizonConfig::parse("=5d"),
            Err(ConfigError::HorizonSyntax(_))
        ));
    }

    #[test]
    fn days_constructor() {
        let h = HorizonConfig::days("10d", 10);
        assert_eq!(h.lookback_secs, 864_000);
    }

    // ============================================================
    // Out-of-range durations
    // ============================================================

    #[test]
    fn parse_lookback_rejects_overflowing_amounts() {
        assert!(matches!(
            parse_lookback("99999999999999999d"),
            Err(ConfigError::HorizonSyntax(_))
        ));
        assert!(parse_lookback("9223372036854775807s").is_err());
        assert!(parse_lookback("9999999999999w").is_err());
        assert!(matches!(
            HorizonConfig::parse("x=99999999999999999d"),
            Err(ConfigError::HorizonSyntax(_))
        ));
    }

    #[test]
    fn parse_lookback_bounds_at_max_days() {
        assert_eq!(
            parse_lookback(&format!("{MAX_LOOKBACK_DAYS}d")).unwrap(),
            Duration::days(MAX_LOOKBACK_DAYS)
        );
        assert!(parse_lookback(&format!("{}d", MAX_LOOKBACK_DAYS + 1)).is_err());
    }

    #[test]
    fn huge_values_do_not_panic() {
        let h = HorizonConfig::days("far", i64::MAX / 2);
        assert_eq!(h.lookback_secs, i64::MAX);
        assert!(h.lookback().is_none());

        let h = HorizonConfig {
            label: "far".to_string(),
            lookback_secs: 100_000_000_000_000,
        };
        assert!(h.lookback().is_some());
    }
}
