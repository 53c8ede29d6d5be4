use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::horizon::{HorizonConfig, MAX_LOOKBACK_DAYS, MAX_LOOKBACK_SECS};

/// Prior used for horizon labels missing from the accuracy table.
pub const DEFAULT_ACCURACY_PRIOR: f64 = 0.91;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backtest: BacktestConfig,
    pub polymarket: PolymarketConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Validates every section that has constraints.
    ///
    /// # Errors
    /// Returns the first `ConfigError` found in the backtest section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backtest.validate()
    }
}

/// Which question the backtest answers for each snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Fee-adjusted expected value of betting the leader or the underdog.
    #[default]
    Ev,
    /// Whether the leader at the snapshot was still the leader at the end.
    Accuracy,
}

impl FromStr for EvaluationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ev" => Ok(Self::Ev),
            "accuracy" | "acc" => Ok(Self::Accuracy),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ev => write!(f, "ev"),
            Self::Accuracy => write!(f, "accuracy"),
        }
    }
}

/// Parameters of one backtest run.
///
/// Passed by value into the engine; nothing here is global.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Cap on markets evaluated per run.
    pub max_markets: usize,
    /// Proportional fee applied to the payout term.
    pub fee: f64,
    /// Only markets that ended within this many days are considered.
    pub lookback_days: i64,
    /// Weight of the historical prior in log-odds space (`lam`).
    pub blend_weight: f64,
    /// Prior used when a horizon label has no entry in `historical_accuracy`.
    pub default_accuracy: f64,
    /// Ordered label→duration mapping.
    pub horizons: Vec<HorizonConfig>,
    /// Historical leader accuracy by horizon label.
    pub historical_accuracy: BTreeMap<String, f64>,
    pub mode: EvaluationMode,
    /// Optional search keyword forwarded to the market listing service.
    pub keyword: Option<String>,
    /// Markets evaluated in flight.
    pub concurrency: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let mut historical_accuracy = BTreeMap::new();
        historical_accuracy.insert("10d".to_string(), 0.91);
        historical_accuracy.insert("5d".to_string(), 0.95);

        Self {
            max_markets: 100,
            fee: 0.02,
            lookback_days: 30,
            blend_weight: 0.5,
            default_accuracy: DEFAULT_ACCURACY_PRIOR,
            horizons: vec![HorizonConfig::days("10d", 10), HorizonConfig::days("5d", 5)],
            historical_accuracy,
            mode: EvaluationMode::Ev,
            keyword: None,
            concurrency: 1,
        }
    }
}

impl BacktestConfig {
    /// Sets the market cap.
    #[must_use]
    pub fn with_max_markets(mut self, max_markets: usize) -> Self {
        self.max_markets = max_markets;
        self
    }

    /// Sets the proportional fee.
    #[must_use]
    pub fn with_fee(mut self, fee: f64) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the recency window in days.
    #[must_use]
    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    /// Sets the prior weight.
    #[must_use]
    pub fn with_blend_weight(mut self, weight: f64) -> Self {
        self.blend_weight = weight;
        self
    }

    /// Replaces the horizon mapping.
    #[must_use]
    pub fn with_horizons(mut self, horizons: Vec<HorizonConfig>) -> Self {
        self.horizons = horizons;
        self
    }

    /// Sets (or overrides) the prior for one label.
    #[must_use]
    pub fn with_accuracy(mut self, label: impl Into<String>, prior: f64) -> Self {
        self.historical_accuracy.insert(label.into(), prior);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Checks ranges, horizon uniqueness and prior bounds.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.fee) {
            return Err(ConfigError::InvalidFee(self.fee));
        }
        if !(0.0..=1.0).contains(&self.blend_weight) {
            return Err(ConfigError::InvalidBlendWeight(self.blend_weight));
        }
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::InvalidLookback(self.lookback_days));
        }
        if self.max_markets == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_markets",
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "concurrency",
            });
        }
        if self.horizons.is_empty() {
            return Err(ConfigError::NoHorizons);
        }

        let mut seen = HashSet::new();
        for horizon in &self.horizons {
            if !seen.insert(horizon.label.as_str()) {
                return Err(ConfigError::DuplicateHorizon(horizon.label.clone()));
            }
            if horizon.lookback_secs <= 0 {
                return Err(ConfigError::NonPositiveHorizon {
                    label: horizon.label.clone(),
                    secs: horizon.lookback_secs,
                });
            }
            if horizon.lookback_secs > MAX_LOOKBACK_SECS {
                return Err(ConfigError::HorizonTooLong {
                    label: horizon.label.clone(),
                    secs: horizon.lookback_secs,
                });
            }
        }

        let priors = self
            .historical_accuracy
            .iter()
            .map(|(label, value)| (label.as_str(), *value))
            .chain(std::iter::once(("<default>", self.default_accuracy)));
        for (label, value) in priors {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::InvalidPrior {
                    label: label.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolymarketConfig {
    pub gamma_url: String,
    pub clob_url: String,
    /// Page size requested from the listing endpoint.
    pub listing_limit: u32,
    pub requests_per_minute: u32,
    pub request_timeout_secs: u64,
}

impl Default for PolymarketConfig {
    fn default() -> Self {
        Self {
            gamma_url: "https://gamma-api.polymarket.com".to_string(),
            clob_url: "https://clob.polymarket.com".to_string(),
            listing_limit: 500,
            requests_per_minute: 60,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
