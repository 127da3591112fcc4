//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! Repository ports use `impl Future` returns and are consumed through generic
//! parameters. Adapter ports are object-safe (`async_trait`) because live
//! adapter instances are chosen at runtime from configuration and cached as
//! `Arc<dyn …>`.

pub mod adapters;
pub mod factory;
pub mod storage;
pub mod sun;

pub use adapters::{
    EnergyMonitorPort, ExternalServicePort, ForecastProviderPort, HomeForecastProviderPort,
    MinerControlPort, NotificationPort, PerformanceTrackerPort,
};
pub use factory::AdapterFactory;
pub use storage::{
    AdapterConfigRepository, EnergySourceRepository, MinerRepository, OptimizationUnitRepository,
    PolicyRepository,
};
pub use sun::SunProvider;
