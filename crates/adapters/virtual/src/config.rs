//! Per-type settings of the simulated adapters, deserialized from the
//! free-form `config` object of an [`AdapterConfig`].
//!
//! Every field is optional; a missing `config` yields the defaults.

use minerhub_domain::adapter::AdapterConfig;
use minerhub_domain::energy::EnergySource;
use minerhub_domain::error::{AdapterError, MinerHubError};
use minerhub_domain::miner::{Miner, MinerStatus};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::devices::SolarProfile;

/// Settings that can be read from an adapter configuration.
pub(crate) trait AdapterSettings: DeserializeOwned + Default {
    /// Range checks serde cannot express; the error is the reason shown to the user.
    fn validate(&self) -> Result<(), String>;
}

/// Deserialize and validate the settings of `config`.
pub(crate) fn parse<T: AdapterSettings>(config: &AdapterConfig) -> Result<T, MinerHubError> {
    let settings = if config.config.is_null() {
        T::default()
    } else {
        serde_json::from_value::<T>(config.config.clone())
            .map_err(|err| invalid(config, err.to_string()))?
    };
    settings
        .validate()
        .map_err(|reason| invalid(config, reason))?;
    Ok(settings)
}

fn invalid(config: &AdapterConfig, reason: String) -> MinerHubError {
    AdapterError::InvalidConfig {
        name: config.name.clone(),
        reason,
    }
    .into()
}

fn non_negative(key: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{key} must be a non-negative number"))
    }
}

fn daylight(sunrise_hour: u32, sunset_hour: u32) -> Result<(), String> {
    if sunset_hour > 24 {
        return Err("sunset_hour must be between 0 and 24".to_string());
    }
    if sunset_hour <= sunrise_hour {
        return Err("sunset_hour must be after sunrise_hour".to_string());
    }
    Ok(())
}

fn positive_count(key: &str, value: u32) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{key} must be at least 1"));
    }
    Ok(())
}

fn profile(
    peak_power: Option<f64>,
    sunrise_hour: u32,
    sunset_hour: u32,
    source: &EnergySource,
) -> SolarProfile {
    SolarProfile {
        peak_power: peak_power
            .or(source.nominal_power_max)
            .unwrap_or(SolarProfile::default().peak_power),
        sunrise_hour,
        sunset_hour,
    }
}

/// `dummy_solar` energy monitor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct SolarMonitorSettings {
    /// Defaults to the energy source's `nominal_power_max`.
    pub peak_power: Option<f64>,
    pub sunrise_hour: u32,
    pub sunset_hour: u32,
    pub load_power: f64,
    /// Battery state of charge at start, in percent.
    pub initial_soc: f64,
    pub battery_max_power: f64,
}

impl Default for SolarMonitorSettings {
    fn default() -> Self {
        let profile = SolarProfile::default();
        Self {
            peak_power: None,
            sunrise_hour: profile.sunrise_hour,
            sunset_hour: profile.sunset_hour,
            load_power: 400.0,
            initial_soc: 60.0,
            battery_max_power: 3000.0,
        }
    }
}

impl SolarMonitorSettings {
    pub(crate) fn profile(&self, source: &EnergySource) -> SolarProfile {
        profile(self.peak_power, self.sunrise_hour, self.sunset_hour, source)
    }
}

impl AdapterSettings for SolarMonitorSettings {
    fn validate(&self) -> Result<(), String> {
        if let Some(peak) = self.peak_power {
            non_negative("peak_power", peak)?;
        }
        daylight(self.sunrise_hour, self.sunset_hour)?;
        non_negative("load_power", self.load_power)?;
        non_negative("battery_max_power", self.battery_max_power)?;
        non_negative("initial_soc", self.initial_soc)?;
        if self.initial_soc > 100.0 {
            return Err("initial_soc must not exceed 100".to_string());
        }
        Ok(())
    }
}

/// `dummy` miner controller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct MinerSettings {
    /// Defaults to the miner's `power_consumption_max`.
    pub power_max: Option<f64>,
    /// TH/s; defaults to the miner's `hash_rate_max`.
    pub hash_rate_max: Option<f64>,
    pub initial_status: MinerStatus,
}

impl Default for MinerSettings {
    fn default() -> Self {
        Self {
            power_max: None,
            hash_rate_max: None,
            initial_status: MinerStatus::Off,
        }
    }
}

impl MinerSettings {
    pub(crate) fn power_max(&self, miner: &Miner) -> f64 {
        self.power_max
            .or(miner.power_consumption_max)
            .unwrap_or(3200.0)
    }

    pub(crate) fn hash_rate_max(&self, miner: &Miner) -> f64 {
        self.hash_rate_max
            .or(miner.hash_rate_max.as_ref().map(|h| h.value))
            .unwrap_or(90.0)
    }
}

impl AdapterSettings for MinerSettings {
    fn validate(&self) -> Result<(), String> {
        if let Some(power) = self.power_max {
            non_negative("power_max", power)?;
        }
        if let Some(rate) = self.hash_rate_max {
            non_negative("hash_rate_max", rate)?;
        }
        Ok(())
    }
}

/// `dummy_solar` forecast provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct ForecastSettings {
    /// Defaults to the energy source's `nominal_power_max`.
    pub peak_power: Option<f64>,
    pub sunrise_hour: u32,
    pub sunset_hour: u32,
    /// Share of the clear-sky curve actually forecast, in percent.
    pub efficiency_percent: f64,
    pub hours: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        let profile = SolarProfile::default();
        Self {
            peak_power: None,
            sunrise_hour: profile.sunrise_hour,
            sunset_hour: profile.sunset_hour,
            efficiency_percent: 80.0,
            hours: 24,
        }
    }
}

impl ForecastSettings {
    pub(crate) fn profile(&self, source: &EnergySource) -> SolarProfile {
        profile(self.peak_power, self.sunrise_hour, self.sunset_hour, source)
    }
}

impl AdapterSettings for ForecastSettings {
    fn validate(&self) -> Result<(), String> {
        if let Some(peak) = self.peak_power {
            non_negative("peak_power", peak)?;
        }
        daylight(self.sunrise_hour, self.sunset_hour)?;
        non_negative("efficiency_percent", self.efficiency_percent)?;
        if self.efficiency_percent > 100.0 {
            return Err("efficiency_percent must not exceed 100".to_string());
        }
        positive_count("hours", self.hours)
    }
}

/// `dummy` home forecast provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct HomeLoadSettings {
    pub load_power: f64,
    pub hours: u32,
}

impl Default for HomeLoadSettings {
    fn default() -> Self {
        Self {
            load_power: 500.0,
            hours: 3,
        }
    }
}

impl AdapterSettings for HomeLoadSettings {
    fn validate(&self) -> Result<(), String> {
        non_negative("load_power", self.load_power)?;
        positive_count("hours", self.hours)
    }
}

/// `dummy` performance tracker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct TrackerSettings {
    /// TH/s reported per tracked miner.
    pub hash_rate: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self { hash_rate: 100.0 }
    }
}

impl AdapterSettings for TrackerSettings {
    fn validate(&self) -> Result<(), String> {
        non_negative("hash_rate", self.hash_rate)
    }
}
