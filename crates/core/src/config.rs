use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::VariationModel;
use crate::pos::DEFAULT_TAX_RATE_PCT;

/// Files probed, in order, when no explicit config path is given.
pub const CONFIG_SEARCH_PATHS: [&str; 2] = ["freshprice.toml", "config/freshprice.toml"];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://freshprice.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            health_check_port: 8080,
            graceful_shutdown_secs: 15,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Seconds between scheduled repricing passes.
    pub refresh_interval_secs: u64,
    pub tax_rate_pct: Decimal,
    pub simulate_variation: bool,
    /// Dataset priced at startup. Without one the dashboard starts idle.
    pub dataset_path: Option<PathBuf>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            tax_rate_pct: DEFAULT_TAX_RATE_PCT,
            simulate_variation: true,
            dataset_path: None,
        }
    }
}

impl PricingConfig {
    pub fn variation(&self) -> VariationModel {
        if self.simulate_variation {
            VariationModel::default()
        } else {
            VariationModel::None
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

/// Programmatic values that win over every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub dataset_path: Option<PathBuf>,
    pub simulate_variation: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl AppConfig {
    /// Resolves configuration as defaults < file < `FRESHPRICE_*` env < overrides,
    /// then validates the result.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match locate_config_file(options.config_path.as_deref()) {
            Some(path) => Self::from_file(&path)?,
            None if options.require_file => {
                let expected = options
                    .config_path
                    .unwrap_or_else(|| PathBuf::from(CONFIG_SEARCH_PATHS[0]));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => Self::default(),
        };

        config.overlay_env()?;
        config.overlay(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        let expanded = expand_env_refs(&raw)?;
        toml::from_str(&expanded)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    fn overlay_env(&mut self) -> Result<(), ConfigError> {
        env_value(&["FRESHPRICE_DATABASE_URL"], &mut self.database.url)?;
        env_value(&["FRESHPRICE_DATABASE_MAX_CONNECTIONS"], &mut self.database.max_connections)?;
        env_value(&["FRESHPRICE_DATABASE_TIMEOUT_SECS"], &mut self.database.timeout_secs)?;

        env_value(&["FRESHPRICE_SERVER_BIND_ADDRESS"], &mut self.server.bind_address)?;
        env_value(&["FRESHPRICE_SERVER_HEALTH_CHECK_PORT"], &mut self.server.health_check_port)?;
        env_value(
            &["FRESHPRICE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            &mut self.server.graceful_shutdown_secs,
        )?;

        env_value(
            &["FRESHPRICE_PRICING_REFRESH_INTERVAL_SECS"],
            &mut self.pricing.refresh_interval_secs,
        )?;
        env_value(&["FRESHPRICE_PRICING_TAX_RATE_PCT"], &mut self.pricing.tax_rate_pct)?;
        env_value(
            &["FRESHPRICE_PRICING_SIMULATE_VARIATION"],
            &mut self.pricing.simulate_variation,
        )?;
        if let Some((_, value)) = first_env(&["FRESHPRICE_PRICING_DATASET_PATH"]) {
            self.pricing.dataset_path = Some(PathBuf::from(value));
        }

        env_value(&["FRESHPRICE_LOGGING_LEVEL", "FRESHPRICE_LOG_LEVEL"], &mut self.logging.level)?;
        env_value(&["FRESHPRICE_LOGGING_FORMAT", "FRESHPRICE_LOG_FORMAT"], &mut self.logging.format)
    }

    fn overlay(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides { database_url, log_level, dataset_path, simulate_variation } =
            overrides;

        if let Some(url) = database_url {
            self.database.url = url;
        }
        if let Some(level) = log_level {
            self.logging.level = level;
        }
        if dataset_path.is_some() {
            self.pricing.dataset_path = dataset_path;
        }
        if let Some(simulate) = simulate_variation {
            self.pricing.simulate_variation = simulate;
        }
    }

    /// Reports the first failing rule, naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.trim().to_ascii_lowercase();
        let checks = [
            (
                is_sqlite_url(&self.database.url),
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)",
            ),
            (
                self.database.max_connections > 0,
                "database.max_connections must be greater than zero",
            ),
            (
                (1..=300).contains(&self.database.timeout_secs),
                "database.timeout_secs must be in range 1..=300",
            ),
            (
                self.server.health_check_port > 0,
                "server.health_check_port must be greater than zero",
            ),
            (
                self.server.graceful_shutdown_secs > 0,
                "server.graceful_shutdown_secs must be greater than zero",
            ),
            (
                (1..=3600).contains(&self.pricing.refresh_interval_secs),
                "pricing.refresh_interval_secs must be in range 1..=3600",
            ),
            (
                !self.pricing.tax_rate_pct.is_sign_negative()
                    && self.pricing.tax_rate_pct <= Decimal::ONE_HUNDRED,
                "pricing.tax_rate_pct must be between 0 and 100",
            ),
            (
                matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error"),
                "logging.level must be one of trace|debug|info|warn|error",
            ),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(ConfigError::Validation((*message).to_string())),
            None => Ok(()),
        }
    }
}

/// The explicit path when it exists, otherwise the first of
/// [`CONFIG_SEARCH_PATHS`] present in the working directory.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => CONFIG_SEARCH_PATHS.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

fn is_sqlite_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:"
}

/// Substitutes every `${VAR}` with the variable's value.
fn expand_env_refs(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn first_env(keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    })
}

fn env_value<T: FromStr>(keys: &[&'static str], slot: &mut T) -> Result<(), ConfigError> {
    let Some((key, value)) = first_env(keys) else {
        return Ok(());
    };
    *slot = value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.clone(),
    })?;
    Ok(())
}
