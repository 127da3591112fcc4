//! # minerhub-adapter-virtual
//!
//! Virtual/demo adapters that simulate an installation so the daemon can run
//! without hardware. Every simulation is deterministic for a given time of
//! day; hours are UTC.
//!
//! ## Provided adapters
//!
//! | Port | `adapter_type` | Behaviour |
//! |------|----------------|-----------|
//! | Energy monitor | `dummy_solar` | Sine-shaped production between sunrise and sunset, constant household load, battery charged from surplus |
//! | Miner controller | `dummy` | `start` → `starting` → `on` on the next status read; `stop` → `stopping` → `off` |
//! | Notifier | `log` | Writes the notification to the log and accepts it |
//! | Forecast provider | `dummy_solar` | Hourly intervals following the same production curve |
//! | Home forecast provider | `dummy` | Flat household load for the next hours |
//! | Performance tracker | `dummy` | Fixed hash rate per tracked miner |
//!
//! [`ConfiguredSun`] provides sun events from fixed sunrise and sunset hours.
//!
//! ## Dependency rule
//!
//! Depends on `minerhub-app` (port traits) and `minerhub-domain` only.

mod config;
mod devices;
mod factory;
mod sun;

pub use devices::{
    DummyHomeForecastProvider, DummyMinerController, DummyPerformanceTracker,
    DummySolarEnergyMonitor, DummySolarForecastProvider, LogNotifier, SimulatedBattery,
    SolarProfile,
};
pub use factory::VirtualAdapterFactory;
pub use sun::ConfiguredSun;
