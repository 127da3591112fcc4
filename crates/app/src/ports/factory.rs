//! Adapter factory port — builds live adapters from configuration entities.

use std::sync::Arc;

use minerhub_domain::adapter::AdapterConfig;
use minerhub_domain::energy::EnergySource;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::miner::Miner;

use super::adapters::{
    EnergyMonitorPort, ExternalServicePort, ForecastProviderPort, HomeForecastProviderPort,
    MinerControlPort, NotificationPort, PerformanceTrackerPort,
};

/// Creates adapter instances, one method per adapter kind.
///
/// The adapter service resolves the optional external service first and
/// passes it in; the factory never looks anything up on its own.
///
/// # Errors
///
/// Every method returns [`MinerHubError::Adapter`] when the configuration's
/// `adapter_type` is unsupported or its settings are invalid.
pub trait AdapterFactory: Send + Sync {
    fn energy_monitor(
        &self,
        config: &AdapterConfig,
        source: &EnergySource,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn EnergyMonitorPort>, MinerHubError>;

    fn miner_controller(
        &self,
        config: &AdapterConfig,
        miner: &Miner,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn MinerControlPort>, MinerHubError>;

    fn notifier(
        &self,
        config: &AdapterConfig,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn NotificationPort>, MinerHubError>;

    fn forecast_provider(
        &self,
        config: &AdapterConfig,
        source: &EnergySource,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn ForecastProviderPort>, MinerHubError>;

    fn home_forecast_provider(
        &self,
        config: &AdapterConfig,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn HomeForecastProviderPort>, MinerHubError>;

    fn performance_tracker(
        &self,
        config: &AdapterConfig,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn PerformanceTrackerPort>, MinerHubError>;

    fn external_service(
        &self,
        config: &AdapterConfig,
    ) -> Result<Arc<dyn ExternalServicePort>, MinerHubError>;
}
