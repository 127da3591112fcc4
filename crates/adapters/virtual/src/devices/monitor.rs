//! Simulated solar installation with optional battery and grid connection.

use std::sync::Mutex;

use async_trait::async_trait;
use minerhub_app::ports::EnergyMonitorPort;
use minerhub_domain::energy::{
    BatteryState, EnergyStateSnapshot, GridState, LoadState, Percentage, WattHours, Watts,
};
use minerhub_domain::error::MinerHubError;
use minerhub_domain::time::{Timestamp, now, seconds_between};
use tracing::debug;

use super::{SolarProfile, lock};

/// The battery stops discharging below this state of charge.
const MIN_DISCHARGE_SOC: Percentage = 20.0;

/// Battery bank charged from surplus and drained on deficit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedBattery {
    pub capacity: WattHours,
    pub state_of_charge: Percentage,
    pub max_power: Watts,
}

#[derive(Debug)]
struct BatteryCell {
    battery: SimulatedBattery,
    last_reading: Option<Timestamp>,
}

impl BatteryCell {
    /// Integrate `power` over the time since the previous reading.
    fn step(&mut self, net: Watts, at: Timestamp) -> BatteryState {
        let hours = self
            .last_reading
            .map_or(0.0, |last| seconds_between(last, at).max(0.0) / 3600.0);
        self.last_reading = Some(at);

        let battery = &mut self.battery;
        let power = if net > 0.0 && battery.state_of_charge < 100.0 {
            net.min(battery.max_power)
        } else if net < 0.0 && battery.state_of_charge > MIN_DISCHARGE_SOC {
            -(-net).min(battery.max_power)
        } else {
            0.0
        };
        if battery.capacity > 0.0 {
            battery.state_of_charge = (battery.state_of_charge
                + power * hours / battery.capacity * 100.0)
                .clamp(0.0, 100.0);
        }
        BatteryState {
            state_of_charge: battery.state_of_charge,
            remaining_capacity: battery.capacity * battery.state_of_charge / 100.0,
            current_power: power,
            timestamp: at,
        }
    }
}

/// Energy monitor for a simulated solar installation.
///
/// Surplus goes to the battery first, up to its power limit; whatever the
/// battery cannot absorb or supply is exchanged with the grid.
#[derive(Debug)]
pub struct DummySolarEnergyMonitor {
    name: String,
    profile: SolarProfile,
    load_power: Watts,
    on_grid: bool,
    external_source: Option<Watts>,
    battery: Option<Mutex<BatteryCell>>,
}

impl DummySolarEnergyMonitor {
    #[must_use]
    pub fn new(name: impl Into<String>, profile: SolarProfile, load_power: Watts) -> Self {
        Self {
            name: name.into(),
            profile,
            load_power,
            on_grid: false,
            external_source: None,
            battery: None,
        }
    }

    #[must_use]
    pub fn with_battery(mut self, battery: SimulatedBattery) -> Self {
        self.battery = Some(Mutex::new(BatteryCell {
            battery,
            last_reading: None,
        }));
        self
    }

    /// Report grid exchange; off-grid installations report no grid state.
    #[must_use]
    pub fn on_grid(mut self) -> Self {
        self.on_grid = true;
        self
    }

    #[must_use]
    pub fn with_external_source(mut self, watts: Watts) -> Self {
        self.external_source = Some(watts);
        self
    }

    /// Simulated readings at `at`.
    ///
    /// Readings must be taken in time order: the battery's charge moves by
    /// its power over the interval since the previous call.
    pub fn snapshot_at(&self, at: Timestamp) -> EnergyStateSnapshot {
        let production = self.profile.power_at(at);
        let net = production - self.load_power;
        let battery = self.battery.as_ref().map(|cell| lock(cell).step(net, at));
        let battery_power = battery.as_ref().map_or(0.0, |b| b.current_power);
        let grid = self.on_grid.then_some(GridState {
            current_power: battery_power - net,
            timestamp: at,
        });

        debug!(
            monitor = %self.name,
            production,
            load = self.load_power,
            battery_power,
            soc = battery.as_ref().map(|b| b.state_of_charge),
            "simulated energy state"
        );

        EnergyStateSnapshot {
            production,
            consumption: LoadState {
                current_power: self.load_power,
                timestamp: at,
            },
            battery,
            grid,
            external_source: self.external_source,
            timestamp: at,
        }
    }
}

#[async_trait]
impl EnergyMonitorPort for DummySolarEnergyMonitor {
    async fn current_energy_state(&self) -> Result<Option<EnergyStateSnapshot>, MinerHubError> {
        Ok(Some(self.snapshot_at(now())))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
