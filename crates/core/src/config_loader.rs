use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::config::AppConfig;
use crate::error::ConfigError;

/// Default location of the TOML config file.
pub const DEFAULT_CONFIG_PATH: &str = "config/leader-ev.toml";

/// Prefix for environment overrides, e.g. `LEADER_EV_BACKTEST__FEE=0.01`.
pub const ENV_PREFIX: &str = "LEADER_EV_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by merging defaults, the TOML file at `path` (if it
    /// exists) and `LEADER_EV_*` environment variables, then validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, a value has the wrong
    /// type, or the merged configuration fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
        Self::extract(Self::base(path.as_ref()).merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads configuration with a profile overlay.
    ///
    /// The overlay lives next to the base file: `config/leader-ev.toml` with
    /// profile `fast` reads `config/leader-ev.fast.toml` on top.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be parsed or validation fails.
    pub fn load_with_profile(
        path: impl AsRef<Path>,
        profile: &str,
    ) -> Result<AppConfig, ConfigError> {
        let path = path.as_ref();
        let figment = Self::base(path)
            .merge(Toml::file(profile_path(path, profile)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::extract(figment)
    }

    fn base(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path))
    }

    fn extract(figment: Figment) -> Result<AppConfig, ConfigError> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;

        tracing::debug!(
            horizons = config.backtest.horizons.len(),
            max_markets = config.backtest.max_markets,
            mode = %config.backtest.mode,
            "Configuration loaded"
        );

        Ok(config)
    }
}

/// Returns `<dir>/<stem>.<profile>.toml` for a base config path.
#[must_use]
pub fn profile_path(path: &Path, profile: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    path.with_file_name(format!("{stem}.{profile}.toml"))
}
