//! Adapter configuration — which concrete implementation backs a port.
//!
//! Every live adapter (energy monitor, miner controller, notifier, …) is
//! created from an [`AdapterConfig`] entity. The entity id doubles as the
//! cache key for the live instance, so editing a configuration requires an
//! explicit cache invalidation to take effect.

use serde::{Deserialize, Serialize};

use crate::error::{MinerHubError, ValidationError};
use crate::id::AdapterId;

/// The port an adapter configuration is meant to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    EnergyMonitor,
    MinerController,
    Notifier,
    ForecastProvider,
    HomeForecastProvider,
    PerformanceTracker,
    ExternalService,
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EnergyMonitor => "energy monitor",
            Self::MinerController => "miner controller",
            Self::Notifier => "notifier",
            Self::ForecastProvider => "forecast provider",
            Self::HomeForecastProvider => "home forecast provider",
            Self::PerformanceTracker => "performance tracker",
            Self::ExternalService => "external service",
        };
        f.write_str(name)
    }
}

/// Configuration entity for one adapter instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub id: AdapterId,
    pub name: String,
    pub kind: AdapterKind,
    /// Implementation selector understood by the adapter factory, e.g. `"dummy_solar"`.
    pub adapter_type: String,
    /// Implementation-specific settings.
    #[serde(default)]
    pub config: serde_json::Value,
    /// Shared connection (e.g. a Home Assistant client) this adapter rides on.
    #[serde(default)]
    pub external_service_id: Option<AdapterId>,
}

impl AdapterConfig {
    /// Create a configuration with an empty settings object.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: AdapterKind,
        adapter_type: impl Into<String>,
    ) -> Self {
        Self {
            id: AdapterId::new(),
            name: name.into(),
            kind,
            adapter_type: adapter_type.into(),
            config: serde_json::Value::Null,
            external_service_id: None,
        }
    }

    /// Replace the implementation-specific settings.
    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    /// Attach a shared external service.
    #[must_use]
    pub fn with_external_service(mut self, id: AdapterId) -> Self {
        self.external_service_id = Some(id);
        self
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
