//! Energy — sources feeding the miners and live snapshots of the energy system.

use serde::{Deserialize, Serialize};

use crate::error::{MinerHubError, ValidationError};
use crate::id::{AdapterId, EnergySourceId};
use crate::time::Timestamp;

/// Instantaneous power in watts.
pub type Watts = f64;
/// Energy in watt-hours.
pub type WattHours = f64;
/// Percentage in the `0.0..=100.0` range.
pub type Percentage = f64;

/// Kind of generation behind an [`EnergySource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySourceType {
    #[default]
    Solar,
    Wind,
    Grid,
    HydroElectric,
    Other,
}

/// Static description of an attached battery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub nominal_capacity: WattHours,
}

/// Static description of a grid connection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub contracted_power: Watts,
}

/// An energy source a unit draws on, and which adapters observe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySource {
    pub id: EnergySourceId,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: EnergySourceType,
    pub nominal_power_max: Option<Watts>,
    pub storage: Option<Battery>,
    pub grid: Option<Grid>,
    /// External generator or similar, for future use.
    pub external_source: Option<Watts>,
    pub energy_monitor_id: Option<AdapterId>,
    pub forecast_provider_id: Option<AdapterId>,
}

impl EnergySource {
    /// Create a builder for constructing an [`EnergySource`].
    #[must_use]
    pub fn builder() -> EnergySourceBuilder {
        EnergySourceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), MinerHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`EnergySource`].
#[derive(Debug, Default)]
pub struct EnergySourceBuilder {
    id: Option<EnergySourceId>,
    name: Option<String>,
    source_type: EnergySourceType,
    nominal_power_max: Option<Watts>,
    storage: Option<Battery>,
    grid: Option<Grid>,
    external_source: Option<Watts>,
    energy_monitor_id: Option<AdapterId>,
    forecast_provider_id: Option<AdapterId>,
}

impl EnergySourceBuilder {
    #[must_use]
    pub fn id(mut self, id: EnergySourceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn source_type(mut self, source_type: EnergySourceType) -> Self {
        self.source_type = source_type;
        self
    }

    #[must_use]
    pub fn nominal_power_max(mut self, watts: Watts) -> Self {
        self.nominal_power_max = Some(watts);
        self
    }

    #[must_use]
    pub fn storage(mut self, battery: Battery) -> Self {
        self.storage = Some(battery);
        self
    }

    #[must_use]
    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    #[must_use]
    pub fn external_source(mut self, watts: Watts) -> Self {
        self.external_source = Some(watts);
        self
    }

    #[must_use]
    pub fn energy_monitor(mut self, id: AdapterId) -> Self {
        self.energy_monitor_id = Some(id);
        self
    }

    #[must_use]
    pub fn forecast_provider(mut self, id: AdapterId) -> Self {
        self.forecast_provider_id = Some(id);
        self
    }

    /// Consume the builder, validate, and return an [`EnergySource`].
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<EnergySource, MinerHubError> {
        let source = EnergySource {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            source_type: self.source_type,
            nominal_power_max: self.nominal_power_max,
            storage: self.storage,
            grid: self.grid,
            external_source: self.external_source,
            energy_monitor_id: self.energy_monitor_id,
            forecast_provider_id: self.forecast_provider_id,
        };
        source.validate()?;
        Ok(source)
    }
}

/// Household load at one instant, excluding the miners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadState {
    pub current_power: Watts,
    pub timestamp: Timestamp,
}

/// Battery reading at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryState {
    pub state_of_charge: Percentage,
    pub remaining_capacity: WattHours,
    /// Positive while charging, negative while discharging.
    pub current_power: Watts,
    pub timestamp: Timestamp,
}

impl BatteryState {
    #[must_use]
    pub fn charging_power(&self) -> Watts {
        self.current_power.max(0.0)
    }

    #[must_use]
    pub fn discharging_power(&self) -> Watts {
        (-self.current_power).max(0.0)
    }
}

/// Grid exchange at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridState {
    /// Positive while importing, negative while exporting.
    pub current_power: Watts,
    pub timestamp: Timestamp,
}

impl GridState {
    #[must_use]
    pub fn importing_power(&self) -> Watts {
        self.current_power.max(0.0)
    }

    #[must_use]
    pub fn exporting_power(&self) -> Watts {
        (-self.current_power).max(0.0)
    }
}

/// Everything the energy monitor reports in one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyStateSnapshot {
    pub production: Watts,
    pub consumption: LoadState,
    pub battery: Option<BatteryState>,
    pub grid: Option<GridState>,
    pub external_source: Option<Watts>,
    pub timestamp: Timestamp,
}

impl EnergyStateSnapshot {
    /// Production left over after the household load (never negative).
    #[must_use]
    pub fn surplus(&self) -> Watts {
        (self.production - self.consumption.current_power).max(0.0)
    }
}
