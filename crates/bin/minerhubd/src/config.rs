//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads the file named by `MINERHUB_CONFIG`, or `minerhub.toml` in the
//! working directory. Every section has a sensible default so the file is
//! optional; without it the daemon runs with nothing to optimize.
//! Environment variables take precedence over file values.
//!
//! Besides daemon settings the file carries the installation itself:
//! `[[adapters]]`, `[[energy_sources]]`, `[[miners]]`, `[[policies]]` and
//! `[[units]]`, in the same shape the domain types serialize to.

use std::time::Duration;

use minerhub_app::optimization_service::DEFAULT_ADAPTER_TIMEOUT;
use minerhub_app::scheduler::DEFAULT_INTERVAL;
use minerhub_domain::adapter::AdapterConfig;
use minerhub_domain::energy::EnergySource;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::miner::Miner;
use minerhub_domain::optimization_unit::EnergyOptimizationUnit;
use minerhub_domain::policy::OptimizationPolicy;
use serde::Deserialize;

/// File read when `MINERHUB_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "minerhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cycle timing.
    pub scheduler: SchedulerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Daylight hours of the installation site.
    pub location: LocationConfig,
    pub adapters: Vec<AdapterConfig>,
    pub energy_sources: Vec<EnergySource>,
    pub miners: Vec<Miner>,
    pub policies: Vec<OptimizationPolicy>,
    pub units: Vec<EnergyOptimizationUnit>,
}

/// Optimization cycle timing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two cycles.
    pub interval_secs: u64,
    /// Upper bound for a single adapter call, in seconds.
    pub adapter_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Fixed daylight hours, in UTC.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub sunrise_hour: u32,
    pub sunset_hour: u32,
    /// Length of dawn and dusk.
    pub twilight_minutes: u32,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("MINERHUB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse the file at `path`, falling back to defaults when it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or entity shapes.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Apply overrides read through `var`. Unparsable numbers are ignored.
    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = var("MINERHUB_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.scheduler.interval_secs = secs;
        }
        if let Some(secs) = var("MINERHUB_ADAPTER_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.scheduler.adapter_timeout_secs = secs;
        }
        if let Some(filter) = var("MINERHUB_LOG") {
            self.logging.filter = filter;
        }
        if let Some(filter) = var("RUST_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Check settings and every configured entity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending item.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scheduler.interval_secs must be non-zero".to_string(),
            ));
        }
        if self.scheduler.adapter_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "scheduler.adapter_timeout_secs must be non-zero".to_string(),
            ));
        }
        let location = &self.location;
        if location.sunrise_hour >= location.sunset_hour || location.sunset_hour > 24 {
            return Err(ConfigError::Validation(format!(
                "location hours must satisfy sunrise < sunset <= 24, got {}..{}",
                location.sunrise_hour, location.sunset_hour
            )));
        }

        check("adapter", &self.adapters, |a| &a.name, AdapterConfig::validate)?;
        check(
            "energy source",
            &self.energy_sources,
            |s| &s.name,
            EnergySource::validate,
        )?;
        check("miner", &self.miners, |m| &m.name, Miner::validate)?;
        check(
            "policy",
            &self.policies,
            |p| &p.name,
            OptimizationPolicy::validate,
        )?;
        check(
            "unit",
            &self.units,
            |u| &u.name,
            EnergyOptimizationUnit::validate,
        )
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_secs)
    }

    #[must_use]
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.scheduler.adapter_timeout_secs)
    }
}

fn check<T>(
    what: &str,
    items: &[T],
    name: impl Fn(&T) -> &String,
    validate: impl Fn(&T) -> Result<(), MinerHubError>,
) -> Result<(), ConfigError> {
    for item in items {
        validate(item)
            .map_err(|err| ConfigError::Validation(format!("{what} {:?}: {err}", name(item))))?;
    }
    Ok(())
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL.as_secs(),
            adapter_timeout_secs: DEFAULT_ADAPTER_TIMEOUT.as_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "minerhubd=info,minerhub_app=info,minerhub_adapter_virtual=info".to_string(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            sunrise_hour: 6,
            sunset_hour: 20,
            twilight_minutes: 30,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
