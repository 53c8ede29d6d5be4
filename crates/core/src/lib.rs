//! Configuration and shared types for the prediction-market leader backtest.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod horizon;

pub use config::{
    AppConfig, BacktestConfig, EvaluationMode, LoggingConfig, PolymarketConfig,
    DEFAULT_ACCURACY_PRIOR,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH, ENV_PREFIX};
pub use error::ConfigError;
pub use horizon::{parse_lookback, HorizonConfig, MAX_LOOKBACK_DAYS, MAX_LOOKBACK_SECS};
