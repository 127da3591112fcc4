//! Adapter ports — live connections to sensors, miners, forecasts and notifiers.
//!
//! Every read may come back empty (`Ok(None)`) when the device or service
//! has nothing to report; `Err` is reserved for failures talking to it.

use std::any::Any;

use async_trait::async_trait;
use minerhub_domain::energy::{EnergyStateSnapshot, Watts};
use minerhub_domain::error::MinerHubError;
use minerhub_domain::forecast::{ConsumptionForecast, Forecast};
use minerhub_domain::id::MinerId;
use minerhub_domain::miner::{HashRate, MinerStatus};

/// Reads the current state of an energy system.
#[async_trait]
pub trait EnergyMonitorPort: Send + Sync {
    /// Current production, load, battery and grid readings.
    async fn current_energy_state(&self) -> Result<Option<EnergyStateSnapshot>, MinerHubError>;

    /// Adapter name for logging.
    fn name(&self) -> &str;
}

/// Provides a solar production forecast.
#[async_trait]
pub trait ForecastProviderPort: Send + Sync {
    async fn forecast(&self) -> Result<Option<Forecast>, MinerHubError>;

    fn name(&self) -> &str;
}

/// Provides a household consumption forecast.
#[async_trait]
pub trait HomeForecastProviderPort: Send + Sync {
    async fn home_consumption_forecast(
        &self,
    ) -> Result<Option<ConsumptionForecast>, MinerHubError>;

    fn name(&self) -> &str;
}

/// Reports the hash rate actually observed by a pool or tracker.
#[async_trait]
pub trait PerformanceTrackerPort: Send + Sync {
    async fn current_hashrate(
        &self,
        miner_ids: &[MinerId],
    ) -> Result<Option<HashRate>, MinerHubError>;

    fn name(&self) -> &str;
}

/// Controls one or more miners behind a single controller.
#[async_trait]
pub trait MinerControlPort: Send + Sync {
    async fn status(&self, miner_id: MinerId) -> Result<MinerStatus, MinerHubError>;

    async fn power(&self, miner_id: MinerId) -> Result<Option<Watts>, MinerHubError>;

    async fn hash_rate(&self, miner_id: MinerId) -> Result<Option<HashRate>, MinerHubError>;

    /// Ask the miner to start. `Ok(false)` means the controller refused.
    async fn start(&self, miner_id: MinerId) -> Result<bool, MinerHubError>;

    /// Ask the miner to stop. `Ok(false)` means the controller refused.
    async fn stop(&self, miner_id: MinerId) -> Result<bool, MinerHubError>;

    fn name(&self) -> &str;
}

/// Delivers a notification to a user channel.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Returns whether the channel accepted the message.
    async fn send(&self, title: &str, message: &str) -> Result<bool, MinerHubError>;

    fn name(&self) -> &str;
}

/// A shared connection (broker, home automation API, …) several adapters ride on.
///
/// Adapters downcast through [`as_any`](Self::as_any) to the concrete client
/// they know how to use.
pub trait ExternalServicePort: Send + Sync {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}
