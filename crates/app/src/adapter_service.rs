//! Adapter service — resolves and caches live adapter instances.
//!
//! Each adapter kind has its own [`AdapterCache`] keyed by the id of the
//! [`AdapterConfig`] the instance was built from. External services live in
//! a separate cache so that several adapters riding on the same connection
//! share one instance.
//!
//! Resolution never fails loudly: a missing configuration, a kind mismatch,
//! an unavailable external service or a factory error is logged and turned
//! into `None`, leaving the caller to degrade the affected unit or miner.

pub mod cache;

pub use cache::AdapterCache;

use std::sync::Arc;

use minerhub_domain::adapter::{AdapterConfig, AdapterKind};
use minerhub_domain::energy::EnergySource;
use minerhub_domain::error::{AdapterError, MinerHubError, NotFoundError};
use minerhub_domain::id::AdapterId;
use minerhub_domain::miner::Miner;

use crate::ports::{
    AdapterConfigRepository, AdapterFactory, EnergyMonitorPort, ExternalServicePort,
    ForecastProviderPort, HomeForecastProviderPort, MinerControlPort, NotificationPort,
    PerformanceTrackerPort,
};

/// Resolves adapters from configuration entities and keeps them alive.
pub struct AdapterService<CR, F> {
    configs: CR,
    factory: F,
    energy_monitors: AdapterCache<dyn EnergyMonitorPort>,
    miner_controllers: AdapterCache<dyn MinerControlPort>,
    notifiers: AdapterCache<dyn NotificationPort>,
    forecast_providers: AdapterCache<dyn ForecastProviderPort>,
    home_forecast_providers: AdapterCache<dyn HomeForecastProviderPort>,
    performance_trackers: AdapterCache<dyn PerformanceTrackerPort>,
    external_services: AdapterCache<dyn ExternalServicePort>,
}

impl<CR, F> AdapterService<CR, F>
where
    CR: AdapterConfigRepository,
    F: AdapterFactory,
{
    /// Create a service reading configurations from `configs` and building
    /// instances with `factory`.
    pub fn new(configs: CR, factory: F) -> Self {
        Self {
            configs,
            factory,
            energy_monitors: AdapterCache::new(),
            miner_controllers: AdapterCache::new(),
            notifiers: AdapterCache::new(),
            forecast_providers: AdapterCache::new(),
            home_forecast_providers: AdapterCache::new(),
            performance_trackers: AdapterCache::new(),
            external_services: AdapterCache::new(),
        }
    }

    /// Energy monitor configured on `source`.
    pub async fn get_energy_monitor(
        &self,
        source: &EnergySource,
    ) -> Option<Arc<dyn EnergyMonitorPort>> {
        let id = source.energy_monitor_id?;
        let result = self
            .energy_monitors
            .get_or_try_insert_with(id, || async move {
                let config = self.load_config(id, AdapterKind::EnergyMonitor).await?;
                let service = self.resolve_service(&config).await?;
                self.factory.energy_monitor(&config, source, service)
            })
            .await;
        available(result, AdapterKind::EnergyMonitor, id)
    }

    /// Controller configured on `miner`.
    pub async fn get_miner_controller(&self, miner: &Miner) -> Option<Arc<dyn MinerControlPort>> {
        let id = miner.controller_id?;
        let result = self
            .miner_controllers
            .get_or_try_insert_with(id, || async move {
                let config = self.load_config(id, AdapterKind::MinerController).await?;
                let service = self.resolve_service(&config).await?;
                self.factory.miner_controller(&config, miner, service)
            })
            .await;
        available(result, AdapterKind::MinerController, id)
    }

    /// Notifier built from configuration `id`.
    pub async fn get_notifier(&self, id: AdapterId) -> Option<Arc<dyn NotificationPort>> {
        let result = self
            .notifiers
            .get_or_try_insert_with(id, || async move {
                let config = self.load_config(id, AdapterKind::Notifier).await?;
                let service = self.resolve_service(&config).await?;
                self.factory.notifier(&config, service)
            })
            .await;
        available(result, AdapterKind::Notifier, id)
    }

    /// Every notifier in `ids` that can be resolved, in order.
    pub async fn get_notifiers(&self, ids: &[AdapterId]) -> Vec<Arc<dyn NotificationPort>> {
        let mut notifiers = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(notifier) = self.get_notifier(*id).await {
                notifiers.push(notifier);
            }
        }
        notifiers
    }

    /// Solar forecast provider configured on `source`.
    pub async fn get_forecast_provider(
        &self,
        source: &EnergySource,
    ) -> Option<Arc<dyn ForecastProviderPort>> {
        let id = source.forecast_provider_id?;
        let result = self
            .forecast_providers
            .get_or_try_insert_with(id, || async move {
                let config = self.load_config(id, AdapterKind::ForecastProvider).await?;
                let service = self.resolve_service(&config).await?;
                self.factory.forecast_provider(&config, source, service)
            })
            .await;
        available(result, AdapterKind::ForecastProvider, id)
    }

    /// Household consumption forecast provider built from configuration `id`.
    pub async fn get_home_forecast_provider(
        &self,
        id: AdapterId,
    ) -> Option<Arc<dyn HomeForecastProviderPort>> {
        let result = self
            .home_forecast_providers
            .get_or_try_insert_with(id, || async move {
                let config = self
                    .load_config(id, AdapterKind::HomeForecastProvider)
                    .await?;
                let service = self.resolve_service(&config).await?;
                self.factory.home_forecast_provider(&config, service)
            })
            .await;
        available(result, AdapterKind::HomeForecastProvider, id)
    }

    /// Mining performance tracker built from configuration `id`.
    pub async fn get_performance_tracker(
        &self,
        id: AdapterId,
    ) -> Option<Arc<dyn PerformanceTrackerPort>> {
        let result = self
            .performance_trackers
            .get_or_try_insert_with(id, || async move {
                let config = self
                    .load_config(id, AdapterKind::PerformanceTracker)
                    .await?;
                let service = self.resolve_service(&config).await?;
                self.factory.performance_tracker(&config, service)
            })
            .await;
        available(result, AdapterKind::PerformanceTracker, id)
    }

    /// Shared external service built from configuration `id`.
    pub async fn get_external_service(
        &self,
        id: AdapterId,
    ) -> Option<Arc<dyn ExternalServicePort>> {
        let result = self.external_service(id).await;
        available(result, AdapterKind::ExternalService, id)
    }

    /// Drop the live instance built from configuration `id`, whatever its kind.
    ///
    /// The next resolution builds a fresh instance. Returns whether anything
    /// was cached.
    pub async fn remove_adapter(&self, id: AdapterId) -> bool {
        let removed = [
            self.energy_monitors.remove(id).await.is_some(),
            self.miner_controllers.remove(id).await.is_some(),
            self.notifiers.remove(id).await.is_some(),
            self.forecast_providers.remove(id).await.is_some(),
            self.home_forecast_providers.remove(id).await.is_some(),
            self.performance_trackers.remove(id).await.is_some(),
        ]
        .contains(&true);
        if removed {
            tracing::info!(adapter_id = %id, "adapter removed from cache");
        }
        removed
    }

    /// Drop every cached adapter instance. External services are kept.
    pub async fn clear_all_adapters(&self) {
        let cleared = self.cached_adapters().await;
        self.energy_monitors.clear().await;
        self.miner_controllers.clear().await;
        self.notifiers.clear().await;
        self.forecast_providers.clear().await;
        self.home_forecast_providers.clear().await;
        self.performance_trackers.clear().await;
        tracing::info!(cleared, "adapter cache cleared");
    }

    /// Number of live adapter instances across all kinds, external services excluded.
    pub async fn cached_adapters(&self) -> usize {
        self.energy_monitors.len().await
            + self.miner_controllers.len().await
            + self.notifiers.len().await
            + self.forecast_providers.len().await
            + self.home_forecast_providers.len().await
            + self.performance_trackers.len().await
    }

    /// Number of live external services.
    pub async fn cached_services(&self) -> usize {
        self.external_services.len().await
    }

    /// Drop the cached external service `id`.
    ///
    /// Adapters already built on top of it keep their own handle until they
    /// are removed too.
    pub async fn remove_service(&self, id: AdapterId) -> bool {
        let removed = self.external_services.remove(id).await.is_some();
        if removed {
            tracing::info!(service_id = %id, "external service removed from cache");
        }
        removed
    }

    /// Drop every cached external service.
    pub async fn clear_all_services(&self) {
        let cleared = self.cached_services().await;
        self.external_services.clear().await;
        tracing::info!(cleared, "external service cache cleared");
    }

    async fn external_service(
        &self,
        id: AdapterId,
    ) -> Result<Arc<dyn ExternalServicePort>, MinerHubError> {
        self.external_services
            .get_or_try_insert_with(id, || async move {
                let config = self.load_config(id, AdapterKind::ExternalService).await?;
                tracing::info!(service = %config.name, "connecting external service");
                self.factory.external_service(&config)
            })
            .await
    }

    async fn resolve_service(
        &self,
        config: &AdapterConfig,
    ) -> Result<Option<Arc<dyn ExternalServicePort>>, MinerHubError> {
        match config.external_service_id {
            Some(id) => self.external_service(id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn load_config(
        &self,
        id: AdapterId,
        expected: AdapterKind,
    ) -> Result<AdapterConfig, MinerHubError> {
        let config = self
            .configs
            .get_by_id(id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "AdapterConfig",
                id: id.to_string(),
            })?;
        if config.kind != expected {
            return Err(AdapterError::KindMismatch {
                id: id.to_string(),
                expected,
                actual: config.kind,
            }
            .into());
        }
        Ok(config)
    }
}

fn available<T: ?Sized>(
    result: Result<Arc<T>, MinerHubError>,
    kind: AdapterKind,
    id: AdapterId,
) -> Option<Arc<T>> {
    match result {
        Ok(instance) => Some(instance),
        Err(err) => {
            tracing::error!(
                %kind,
                adapter_id = %id,
                error = %error_chain(&err),
                "adapter unavailable"
            );
            None
        }
    }
}

/// Render an error with its sources, `outer: inner: …`.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        InMemoryStore, SpyNotifier, StubController, StubFactory, StubMonitor, StubService,
    };
    use minerhub_domain::miner::MinerStatus;

    fn source_with_monitor(id: AdapterId) -> EnergySource {
        EnergySource::builder()
            .name("Roof PV")
            .energy_monitor(id)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_return_identical_instance_when_resolved_twice() {
        let config = AdapterConfig::new("pv", AdapterKind::EnergyMonitor, "stub");
        let mut factory = StubFactory::default();
        factory.add_monitor(config.id, StubMonitor::empty());
        let service = AdapterService::new(InMemoryStore::with([config.clone()]), factory);
        let source = source_with_monitor(config.id);

        let first = service.get_energy_monitor(&source).await.unwrap();
        let second = service.get_energy_monitor(&source).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(service.factory.calls(), 1);
    }

    #[tokio::test]
    async fn should_invoke_factory_again_when_adapter_removed() {
        let config = AdapterConfig::new("pv", AdapterKind::EnergyMonitor, "stub");
        let mut factory = StubFactory::default();
        factory.add_monitor(config.id, StubMonitor::empty());
        let service = AdapterService::new(InMemoryStore::with([config.clone()]), factory);
        let source = source_with_monitor(config.id);

        service.get_energy_monitor(&source).await.unwrap();
        assert!(service.remove_adapter(config.id).await);
        service.get_energy_monitor(&source).await.unwrap();

        assert_eq!(service.factory.calls(), 2);
    }

    #[tokio::test]
    async fn should_invoke_factory_again_when_all_adapters_cleared() {
        let config = AdapterConfig::new("console", AdapterKind::Notifier, "stub");
        let mut factory = StubFactory::default();
        factory.add_notifier(config.id, SpyNotifier::accepting("console"));
        let service = AdapterService::new(InMemoryStore::with([config.clone()]), factory);

        service.get_notifier(config.id).await.unwrap();
        assert_eq!(service.cached_adapters().await, 1);
        service.clear_all_adapters().await;
        assert_eq!(service.cached_adapters().await, 0);
        service.get_notifier(config.id).await.unwrap();

        assert_eq!(service.factory.calls(), 2);
    }

    #[tokio::test]
    async fn should_return_none_when_config_missing() {
        let service = AdapterService::new(InMemoryStore::default(), StubFactory::default());
        let source = source_with_monitor(AdapterId::new());
        assert!(service.get_energy_monitor(&source).await.is_none());
        assert_eq!(service.factory.calls(), 0);
    }

    #[tokio::test]
    async fn should_return_none_when_source_has_no_monitor() {
        let service = AdapterService::new(InMemoryStore::default(), StubFactory::default());
        let source = EnergySource::builder().name("Roof PV").build().unwrap();
        assert!(service.get_energy_monitor(&source).await.is_none());
    }

    #[tokio::test]
    async fn should_return_none_when_config_has_wrong_kind() {
        let config = AdapterConfig::new("console", AdapterKind::Notifier, "stub");
        let mut factory = StubFactory::default();
        factory.add_notifier(config.id, SpyNotifier::accepting("console"));
        let service = AdapterService::new(InMemoryStore::with([config.clone()]), factory);

        let source = source_with_monitor(config.id);
        assert!(service.get_energy_monitor(&source).await.is_none());
        assert_eq!(service.factory.calls(), 0);
    }

    #[tokio::test]
    async fn should_return_none_and_not_cache_when_factory_fails() {
        let config = AdapterConfig::new("pv", AdapterKind::EnergyMonitor, "unknown");
        let service =
            AdapterService::new(InMemoryStore::with([config.clone()]), StubFactory::default());
        let source = source_with_monitor(config.id);

        assert!(service.get_energy_monitor(&source).await.is_none());
        assert!(service.get_energy_monitor(&source).await.is_none());
        assert_eq!(service.factory.calls(), 2);
    }

    #[tokio::test]
    async fn should_share_external_service_between_adapters() {
        let hub = AdapterConfig::new("hub", AdapterKind::ExternalService, "stub");
        let first = AdapterConfig::new("rig a", AdapterKind::MinerController, "stub")
            .with_external_service(hub.id);
        let second = AdapterConfig::new("rig b", AdapterKind::MinerController, "stub")
            .with_external_service(hub.id);
        let mut factory = StubFactory::default();
        factory.add_service(hub.id, StubService::new("hub"));
        factory.add_controller(first.id, StubController::new(MinerStatus::Off));
        factory.add_controller(second.id, StubController::new(MinerStatus::Off));
        let service = AdapterService::new(
            InMemoryStore::with([hub.clone(), first.clone(), second.clone()]),
            factory,
        );

        for controller_id in [first.id, second.id] {
            let miner = Miner::builder()
                .name("S19")
                .controller(controller_id)
                .build()
                .unwrap();
            assert!(service.get_miner_controller(&miner).await.is_some());
        }

        // one external service + two controllers
        assert_eq!(service.factory.calls(), 3);
        assert_eq!(service.factory.services_passed(), vec!["hub", "hub"]);
        assert_eq!(service.cached_services().await, 1);
        assert_eq!(service.cached_adapters().await, 2);
    }

    #[tokio::test]
    async fn should_return_none_when_external_service_unavailable() {
        let controller = AdapterConfig::new("rig", AdapterKind::MinerController, "stub")
            .with_external_service(AdapterId::new());
        let mut factory = StubFactory::default();
        factory.add_controller(controller.id, StubController::new(MinerStatus::Off));
        let service = AdapterService::new(InMemoryStore::with([controller.clone()]), factory);
        let miner = Miner::builder()
            .name("S19")
            .controller(controller.id)
            .build()
            .unwrap();

        assert!(service.get_miner_controller(&miner).await.is_none());
        assert_eq!(service.factory.calls(), 0);
    }

    #[tokio::test]
    async fn should_rebuild_external_service_when_removed() {
        let hub = AdapterConfig::new("hub", AdapterKind::ExternalService, "stub");
        let mut factory = StubFactory::default();
        factory.add_service(hub.id, StubService::new("hub"));
        let service = AdapterService::new(InMemoryStore::with([hub.clone()]), factory);

        service.get_external_service(hub.id).await.unwrap();
        assert!(service.remove_service(hub.id).await);
        assert!(!service.remove_service(hub.id).await);
        service.get_external_service(hub.id).await.unwrap();
        service.clear_all_services().await;
        service.get_external_service(hub.id).await.unwrap();

        assert_eq!(service.factory.calls(), 3);
    }

    #[tokio::test]
    async fn should_skip_unresolvable_notifiers() {
        let console = AdapterConfig::new("console", AdapterKind::Notifier, "stub");
        let mut factory = StubFactory::default();
        factory.add_notifier(console.id, SpyNotifier::accepting("console"));
        let service = AdapterService::new(InMemoryStore::with([console.clone()]), factory);

        let notifiers = service
            .get_notifiers(&[AdapterId::new(), console.id])
            .await;

        assert_eq!(notifiers.len(), 1);
        assert_eq!(notifiers[0].name(), "console");
    }

    #[tokio::test]
    async fn should_resolve_same_instance_under_concurrent_callers() {
        let config = AdapterConfig::new("pv", AdapterKind::EnergyMonitor, "stub");
        let mut factory = StubFactory::default();
        factory.add_monitor(config.id, StubMonitor::empty());
        let service = Arc::new(AdapterService::new(
            InMemoryStore::with([config.clone()]),
            factory,
        ));
        let source = source_with_monitor(config.id);

        let (a, b) = tokio::join!(
            service.get_energy_monitor(&source),
            service.get_energy_monitor(&source)
        );

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(service.factory.calls(), 1);
    }

    #[test]
    fn should_render_error_with_sources() {
        let err: MinerHubError = AdapterError::Io("connection refused".to_string()).into();
        assert_eq!(
            error_chain(&err),
            "adapter error: adapter IO failed: connection refused"
        );
    }
}
