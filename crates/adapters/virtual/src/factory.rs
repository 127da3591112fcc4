//! [`AdapterFactory`] building the simulated adapters from configuration.
//!
//! Settings read per adapter type (all optional):
//!
//! | Kind | Type | Settings |
//! |------|------|----------|
//! | energy monitor | `dummy_solar` | `peak_power`, `sunrise_hour`, `sunset_hour`, `load_power`, `initial_soc`, `battery_max_power` |
//! | miner controller | `dummy` | `power_max`, `hash_rate_max`, `initial_status` |
//! | notifier | `log` | |
//! | forecast provider | `dummy_solar` | `peak_power`, `sunrise_hour`, `sunset_hour`, `efficiency_percent`, `hours` |
//! | home forecast provider | `dummy` | `load_power`, `hours` |
//! | performance tracker | `dummy` | `hash_rate` |
//!
//! Each row is a settings struct of the `config` module. The peak power defaults
//! to the energy source's `nominal_power_max`; the controller maxima default
//! to the first miner it is built for.

use std::sync::Arc;

use minerhub_app::ports::{
    AdapterFactory, EnergyMonitorPort, ExternalServicePort, ForecastProviderPort,
    HomeForecastProviderPort, MinerControlPort, NotificationPort, PerformanceTrackerPort,
};
use minerhub_domain::adapter::{AdapterConfig, AdapterKind};
use minerhub_domain::energy::EnergySource;
use minerhub_domain::error::{AdapterError, MinerHubError};
use minerhub_domain::miner::{HashRate, Miner};

use crate::config::{
    ForecastSettings, HomeLoadSettings, MinerSettings, SolarMonitorSettings, TrackerSettings,
    parse,
};
use crate::devices::{
    DummyHomeForecastProvider, DummyMinerController, DummyPerformanceTracker,
    DummySolarEnergyMonitor, DummySolarForecastProvider, LogNotifier, SimulatedBattery,
};

const DUMMY: &str = "dummy";
const DUMMY_SOLAR: &str = "dummy_solar";
const LOG: &str = "log";

/// Builds the virtual adapters. External services are not simulated.
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualAdapterFactory;

impl AdapterFactory for VirtualAdapterFactory {
    fn energy_monitor(
        &self,
        config: &AdapterConfig,
        source: &EnergySource,
        _service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn EnergyMonitorPort>, MinerHubError> {
        match config.adapter_type.as_str() {
            DUMMY_SOLAR => Ok(Arc::new(solar_monitor(config, source)?)),
            _ => Err(unsupported(AdapterKind::EnergyMonitor, config)),
        }
    }

    fn miner_controller(
        &self,
        config: &AdapterConfig,
        miner: &Miner,
        _service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn MinerControlPort>, MinerHubError> {
        match config.adapter_type.as_str() {
            DUMMY => Ok(Arc::new(miner_controller(config, miner)?)),
            _ => Err(unsupported(AdapterKind::MinerController, config)),
        }
    }

    fn notifier(
        &self,
        config: &AdapterConfig,
        _service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn NotificationPort>, MinerHubError> {
        match config.adapter_type.as_str() {
            LOG => Ok(Arc::new(LogNotifier::new(&config.name))),
            _ => Err(unsupported(AdapterKind::Notifier, config)),
        }
    }

    fn forecast_provider(
        &self,
        config: &AdapterConfig,
        source: &EnergySource,
        _service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn ForecastProviderPort>, MinerHubError> {
        match config.adapter_type.as_str() {
            DUMMY_SOLAR => Ok(Arc::new(solar_forecast(config, source)?)),
            _ => Err(unsupported(AdapterKind::ForecastProvider, config)),
        }
    }

    fn home_forecast_provider(
        &self,
        config: &AdapterConfig,
        _service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn HomeForecastProviderPort>, MinerHubError> {
        match config.adapter_type.as_str() {
            DUMMY => {
                let settings: HomeLoadSettings = parse(config)?;
                Ok(Arc::new(DummyHomeForecastProvider::new(
                    &config.name,
                    settings.load_power,
                    settings.hours,
                )))
            }
            _ => Err(unsupported(AdapterKind::HomeForecastProvider, config)),
        }
    }

    fn performance_tracker(
        &self,
        config: &AdapterConfig,
        _service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn PerformanceTrackerPort>, MinerHubError> {
        match config.adapter_type.as_str() {
            DUMMY => {
                let settings: TrackerSettings = parse(config)?;
                Ok(Arc::new(DummyPerformanceTracker::new(
                    &config.name,
                    HashRate::terahashes(settings.hash_rate),
                )))
            }
            _ => Err(unsupported(AdapterKind::PerformanceTracker, config)),
        }
    }

    fn external_service(
        &self,
        config: &AdapterConfig,
    ) -> Result<Arc<dyn ExternalServicePort>, MinerHubError> {
        Err(unsupported(AdapterKind::ExternalService, config))
    }
}

fn unsupported(kind: AdapterKind, config: &AdapterConfig) -> MinerHubError {
    AdapterError::Unsupported {
        kind,
        adapter_type: config.adapter_type.clone(),
    }
    .into()
}

fn solar_monitor(
    config: &AdapterConfig,
    source: &EnergySource,
) -> Result<DummySolarEnergyMonitor, MinerHubError> {
    let settings: SolarMonitorSettings = parse(config)?;
    let mut monitor =
        DummySolarEnergyMonitor::new(&config.name, settings.profile(source), settings.load_power);
    if let Some(storage) = source.storage {
        monitor = monitor.with_battery(SimulatedBattery {
            capacity: storage.nominal_capacity,
            state_of_charge: settings.initial_soc,
            max_power: settings.battery_max_power,
        });
    }
    if source.grid.is_some() {
        monitor = monitor.on_grid();
    }
    if let Some(watts) = source.external_source {
        monitor = monitor.with_external_source(watts);
    }
    Ok(monitor)
}

fn miner_controller(
    config: &AdapterConfig,
    miner: &Miner,
) -> Result<DummyMinerController, MinerHubError> {
    let settings: MinerSettings = parse(config)?;
    Ok(DummyMinerController::new(
        &config.name,
        settings.power_max(miner),
        HashRate::terahashes(settings.hash_rate_max(miner)),
    )
    .with_initial_status(settings.initial_status))
}

fn solar_forecast(
    config: &AdapterConfig,
    source: &EnergySource,
) -> Result<DummySolarForecastProvider, MinerHubError> {
    let settings: ForecastSettings = parse(config)?;
    Ok(DummySolarForecastProvider::new(
        &config.name,
        settings.profile(source),
        settings.efficiency_percent / 100.0,
        settings.hours,
    ))
}
