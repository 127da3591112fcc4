//! Failure taxonomy of an optimization cycle.
//!
//! Errors are caught at the smallest enclosing scope: a [`UnitError`] aborts
//! one unit for this cycle, a [`DeviceError`] aborts one miner, and
//! [`OptionalData`] gaps are only logged.

use minerhub_domain::id::MinerId;

/// Required input a unit cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Unit,
    Policy,
    EnergySource,
    EnergyMonitor,
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unit => "optimization unit",
            Self::Policy => "policy",
            Self::EnergySource => "energy source",
            Self::EnergyMonitor => "energy monitor",
        };
        f.write_str(name)
    }
}

/// Aborts one unit for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("{0} unavailable")]
    ConfigurationUnavailable(Requirement),

    #[error("energy state unavailable{}", reason_suffix(.reason.as_deref()))]
    DataUnavailable { reason: Option<String> },

    #[error("storage error: {0}")]
    Storage(String),
}

fn reason_suffix(reason: Option<&str>) -> String {
    reason
        .map(|reason| format!(": {reason}"))
        .unwrap_or_default()
}

impl UnitError {
    /// Body of the notification sent to the unit's notifiers.
    #[must_use]
    pub fn notification(&self) -> String {
        match self {
            Self::ConfigurationUnavailable(Requirement::Unit) => {
                "Optimization unit unavailable.".to_string()
            }
            Self::ConfigurationUnavailable(Requirement::Policy) => {
                "Policy unavailable.".to_string()
            }
            Self::ConfigurationUnavailable(Requirement::EnergySource) => {
                "Energy source unavailable.".to_string()
            }
            Self::ConfigurationUnavailable(Requirement::EnergyMonitor) => {
                "Energy monitor unavailable.".to_string()
            }
            Self::DataUnavailable { reason: None } => {
                "Failed to retrieve energy state.".to_string()
            }
            Self::DataUnavailable {
                reason: Some(reason),
            } => format!("Energy state error: {reason}"),
            Self::Storage(reason) => format!("Runtime error: {reason}"),
        }
    }
}

/// Aborts one miner for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("miner {0} not found")]
    MinerNotFound(MinerId),

    #[error("miner controller unavailable")]
    ControllerUnavailable,

    #[error("status read failed: {0}")]
    Status(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl DeviceError {
    /// Body of the notification sent to the unit's notifiers.
    #[must_use]
    pub fn notification(&self, unit_name: &str) -> String {
        match self {
            Self::MinerNotFound(id) => {
                format!("Miner {id} not found in optimization unit '{unit_name}'.")
            }
            Self::ControllerUnavailable => "Miner controller unavailable.".to_string(),
            Self::Status(_) | Self::Storage(_) => format!("Runtime error: {self}"),
        }
    }
}

/// Optional input a unit proceeds without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalData {
    SolarForecast,
    HomeLoadForecast,
    PerformanceTracker,
}

impl std::fmt::Display for OptionalData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SolarForecast => "solar forecast",
            Self::HomeLoadForecast => "home load forecast",
            Self::PerformanceTracker => "performance tracker hash rate",
        };
        f.write_str(name)
    }
}
