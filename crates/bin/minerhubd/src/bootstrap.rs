//! Wiring — seeds the in-memory repositories from configuration and builds
//! the optimization service on top of the virtual adapters.

use std::sync::Arc;

use minerhub_adapter_memory::{
    MemoryAdapterConfigRepository, MemoryEnergySourceRepository, MemoryMinerRepository,
    MemoryOptimizationUnitRepository, MemoryPolicyRepository,
};
use minerhub_adapter_virtual::{ConfiguredSun, VirtualAdapterFactory};
use minerhub_app::adapter_service::AdapterService;
use minerhub_app::optimization_service::{OptimizationService, OptimizationSettings, Repositories};
use minerhub_app::ports::{
    AdapterConfigRepository, EnergySourceRepository, MinerRepository, OptimizationUnitRepository,
    PolicyRepository,
};
use minerhub_app::rule_engine::{CustomRuleEngine, validate_conditions};
use minerhub_domain::error::MinerHubError;
use minerhub_domain::policy::OptimizationPolicy;

use crate::config::Config;

/// The orchestrator as the daemon runs it.
pub type Optimizer = OptimizationService<
    MemoryOptimizationUnitRepository,
    MemoryPolicyRepository,
    MemoryMinerRepository,
    MemoryEnergySourceRepository,
    MemoryAdapterConfigRepository,
    VirtualAdapterFactory,
    CustomRuleEngine,
>;

/// Build the optimizer for `config`.
///
/// # Errors
///
/// Returns the first error raised while storing a configured entity.
pub async fn build(config: &Config) -> Result<Arc<Optimizer>, MinerHubError> {
    let adapter_configs = MemoryAdapterConfigRepository::new();
    for adapter in &config.adapters {
        adapter_configs.create(adapter.clone()).await?;
    }

    let energy_sources = MemoryEnergySourceRepository::new();
    for source in &config.energy_sources {
        energy_sources.create(source.clone()).await?;
    }

    let miners = MemoryMinerRepository::new();
    for miner in &config.miners {
        miners.create(miner.clone()).await?;
    }

    let policies = MemoryPolicyRepository::new();
    for policy in &config.policies {
        warn_on_unknown_fields(policy);
        policies.create(policy.clone()).await?;
    }

    let units = MemoryOptimizationUnitRepository::new();
    for unit in &config.units {
        units.create(unit.clone()).await?;
    }

    tracing::info!(
        adapters = config.adapters.len(),
        energy_sources = config.energy_sources.len(),
        miners = config.miners.len(),
        policies = config.policies.len(),
        units = config.units.len(),
        enabled_units = config.units.iter().filter(|u| u.enabled).count(),
        "configuration loaded"
    );

    let location = &config.location;
    let sun = ConfiguredSun::new(
        location.sunrise_hour,
        location.sunset_hour,
        location.twilight_minutes,
    );
    let adapters = AdapterService::new(adapter_configs, VirtualAdapterFactory);

    Ok(Arc::new(OptimizationService::new(
        Repositories {
            units,
            policies,
            miners,
            energy_sources,
        },
        Arc::new(adapters),
        Arc::new(sun),
        CustomRuleEngine::new(),
        OptimizationSettings {
            adapter_timeout: config.adapter_timeout(),
        },
    )))
}

/// Drop every live adapter and external service so their connections close
/// before the process exits.
pub async fn release(optimizer: &Optimizer) {
    let adapters = optimizer.adapters();
    tracing::debug!(
        adapters = adapters.cached_adapters().await,
        services = adapters.cached_services().await,
        "releasing live adapters"
    );
    adapters.clear_all_adapters().await;
    adapters.clear_all_services().await;
}

/// Rules addressing paths outside the decisional context load fine but can
/// never match, so they only get a warning.
fn warn_on_unknown_fields(policy: &OptimizationPolicy) {
    for rule in policy.start_rules.iter().chain(&policy.stop_rules) {
        let report = validate_conditions(&rule.conditions);
        for error in &report.field_errors {
            tracing::warn!(
                policy = %policy.name,
                rule = %rule.name,
                %error,
                "rule field is not in the decisional context"
            );
        }
    }
}
