//! Error types for configuration loading and validation.

use thiserror::Error;

/// Errors raised while building or validating a backtest configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Fee rate outside `[0, 1)`.
    #[error("invalid fee rate {0}: must be in [0, 1)")]
    InvalidFee(f64),

    /// Blend weight outside `[0, 1]`.
    #[error("invalid blend weight {0}: must be in [0, 1]")]
    InvalidBlendWeight(f64),

    /// A historical-accuracy prior outside the open interval `(0, 1)`.
    #[error("invalid accuracy prior for '{label}': {value} is not in (0, 1)")]
    InvalidPrior {
        /// Horizon label the prior belongs to.
        label: String,
        /// The rejected value.
        value: f64,
    },

    /// Lookback window in days outside `1..=MAX_LOOKBACK_DAYS`.
    #[error("invalid lookback window: {0} days")]
    InvalidLookback(i64),

    /// At least one market must be processed and one in flight.
    #[error("{field} must be at least 1")]
    ZeroLimit {
        /// Name of the offending setting.
        field: &'static str,
    },

    /// No horizons configured.
    #[error("at least one horizon must be configured")]
    NoHorizons,

    /// A horizon label appears more than once.
    #[error("duplicate horizon label '{0}'")]
    DuplicateHorizon(String),

    /// A horizon with a zero or negative lookback.
    #[error("horizon '{label}' has non-positive lookback ({secs}s)")]
    NonPositiveHorizon {
        /// Horizon label.
        label: String,
        /// Lookback in seconds.
        secs: i64,
    },

    /// A horizon longer than `MAX_LOOKBACK_SECS`.
    #[error("horizon '{label}' is too long ({secs}s)")]
    HorizonTooLong {
        /// Horizon label.
        label: String,
        /// Lookback in seconds.
        secs: i64,
    },

    /// Horizon text could not be parsed (e.g. `10d`, `5d=120h`).
    #[error("cannot parse horizon '{0}': expected <label>=<n><s|m|h|d|w> or <n><s|m|h|d|w>")]
    HorizonSyntax(String),

    /// Unknown evaluation mode name.
    #[error("unknown evaluation mode '{0}': expected 'ev' or 'accuracy'")]
    UnknownMode(String),

    /// Figment failed to merge or extract the configuration.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}
