//! In-memory test doubles shared by the service tests.

use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use minerhub_domain::adapter::{AdapterConfig, AdapterKind};
use minerhub_domain::energy::{EnergySource, EnergyStateSnapshot, LoadState, Watts};
use minerhub_domain::error::{AdapterError, MinerHubError};
use minerhub_domain::forecast::{ConsumptionForecast, Forecast, Sun};
use minerhub_domain::id::{AdapterId, EnergySourceId, MinerId, PolicyId, UnitId};
use minerhub_domain::miner::{HashRate, Miner, MinerStatus};
use minerhub_domain::optimization_unit::EnergyOptimizationUnit;
use minerhub_domain::policy::OptimizationPolicy;
use minerhub_domain::time::{Timestamp, now};

use crate::ports::{
    AdapterConfigRepository, AdapterFactory, EnergyMonitorPort, EnergySourceRepository,
    ExternalServicePort, ForecastProviderPort, HomeForecastProviderPort, MinerControlPort,
    MinerRepository, NotificationPort, OptimizationUnitRepository, PerformanceTrackerPort,
    PolicyRepository, SunProvider,
};

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

pub trait Keyed: Clone + Send + Sync + 'static {
    type Key: Copy + Eq + Hash + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

macro_rules! keyed {
    ($ty:ty, $key:ty) => {
        impl Keyed for $ty {
            type Key = $key;

            fn key(&self) -> Self::Key {
                self.id
            }
        }
    };
}

keyed!(EnergyOptimizationUnit, UnitId);
keyed!(OptimizationPolicy, PolicyId);
keyed!(Miner, MinerId);
keyed!(EnergySource, EnergySourceId);
keyed!(AdapterConfig, AdapterId);

pub struct InMemoryStore<K, V> {
    items: Mutex<HashMap<K, V>>,
    fail_reads: bool,
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            fail_reads: false,
        }
    }
}

impl<K, V> InMemoryStore<K, V>
where
    V: Keyed<Key = K>,
    K: Copy + Eq + Hash,
{
    pub fn with(items: impl IntoIterator<Item = V>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().map(|v| (v.key(), v)).collect()),
            fail_reads: false,
        }
    }

    /// A store whose every read fails with a storage error.
    pub fn broken() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn get(&self, key: K) -> Option<V> {
        self.items.lock().unwrap().get(&key).cloned()
    }

    fn insert(&self, value: V) -> V {
        self.items.lock().unwrap().insert(value.key(), value.clone());
        value
    }

    fn read(&self, key: K) -> Result<Option<V>, MinerHubError> {
        if self.fail_reads {
            return Err(MinerHubError::Storage(Box::new(std::io::Error::other(
                "store offline",
            ))));
        }
        Ok(self.get(key))
    }

    fn all(&self) -> Vec<V> {
        self.items.lock().unwrap().values().cloned().collect()
    }
}

impl OptimizationUnitRepository for InMemoryStore<UnitId, EnergyOptimizationUnit> {
    async fn create(
        &self,
        unit: EnergyOptimizationUnit,
    ) -> Result<EnergyOptimizationUnit, MinerHubError> {
        Ok(self.insert(unit))
    }

    async fn get_by_id(&self, id: UnitId) -> Result<Option<EnergyOptimizationUnit>, MinerHubError> {
        self.read(id)
    }

    async fn get_all(&self) -> Result<Vec<EnergyOptimizationUnit>, MinerHubError> {
        Ok(self.all())
    }

    async fn get_enabled(&self) -> Result<Vec<EnergyOptimizationUnit>, MinerHubError> {
        let mut units: Vec<_> = self.all().into_iter().filter(|u| u.enabled).collect();
        units.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(units)
    }

    async fn update(
        &self,
        unit: EnergyOptimizationUnit,
    ) -> Result<EnergyOptimizationUnit, MinerHubError> {
        Ok(self.insert(unit))
    }
}

impl PolicyRepository for InMemoryStore<PolicyId, OptimizationPolicy> {
    async fn create(
        &self,
        policy: OptimizationPolicy,
    ) -> Result<OptimizationPolicy, MinerHubError> {
        Ok(self.insert(policy))
    }

    async fn get_by_id(&self, id: PolicyId) -> Result<Option<OptimizationPolicy>, MinerHubError> {
        self.read(id)
    }

    async fn get_all(&self) -> Result<Vec<OptimizationPolicy>, MinerHubError> {
        Ok(self.all())
    }

    async fn update(
        &self,
        policy: OptimizationPolicy,
    ) -> Result<OptimizationPolicy, MinerHubError> {
        Ok(self.insert(policy))
    }
}

impl MinerRepository for InMemoryStore<MinerId, Miner> {
    async fn create(&self, miner: Miner) -> Result<Miner, MinerHubError> {
        Ok(self.insert(miner))
    }

    async fn get_by_id(&self, id: MinerId) -> Result<Option<Miner>, MinerHubError> {
        self.read(id)
    }

    async fn get_all(&self) -> Result<Vec<Miner>, MinerHubError> {
        Ok(self.all())
    }

    async fn update(&self, miner: Miner) -> Result<Miner, MinerHubError> {
        Ok(self.insert(miner))
    }
}

impl EnergySourceRepository for InMemoryStore<EnergySourceId, EnergySource> {
    async fn create(&self, source: EnergySource) -> Result<EnergySource, MinerHubError> {
        Ok(self.insert(source))
    }

    async fn get_by_id(&self, id: EnergySourceId) -> Result<Option<EnergySource>, MinerHubError> {
        self.read(id)
    }

    async fn get_all(&self) -> Result<Vec<EnergySource>, MinerHubError> {
        Ok(self.all())
    }
}

impl AdapterConfigRepository for InMemoryStore<AdapterId, AdapterConfig> {
    async fn create(&self, config: AdapterConfig) -> Result<AdapterConfig, MinerHubError> {
        Ok(self.insert(config))
    }

    async fn get_by_id(&self, id: AdapterId) -> Result<Option<AdapterConfig>, MinerHubError> {
        self.read(id)
    }

    async fn get_all(&self) -> Result<Vec<AdapterConfig>, MinerHubError> {
        Ok(self.all())
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Energy monitor answering with a fixed reading, nothing, an error, or a delay.
pub struct StubMonitor {
    reading: Result<Option<EnergyStateSnapshot>, AdapterError>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubMonitor {
    fn with(reading: Result<Option<EnergyStateSnapshot>, AdapterError>) -> Arc<Self> {
        Arc::new(Self {
            reading,
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::with(Ok(None))
    }

    pub fn reading(snapshot: EnergyStateSnapshot) -> Arc<Self> {
        Self::with(Ok(Some(snapshot)))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::with(Err(AdapterError::Io(message.to_string())))
    }

    pub fn slow(snapshot: EnergyStateSnapshot, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reading: Ok(Some(snapshot)),
            delay: Some(delay),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnergyMonitorPort for StubMonitor {
    async fn current_energy_state(&self) -> Result<Option<EnergyStateSnapshot>, MinerHubError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.reading.clone().map_err(Into::into)
    }

    fn name(&self) -> &str {
        "stub monitor"
    }
}

/// Snapshot with the given production and battery charge.
pub fn snapshot(production: Watts, state_of_charge: f64) -> EnergyStateSnapshot {
    let ts = now();
    EnergyStateSnapshot {
        production,
        consumption: LoadState {
            current_power: 300.0,
            timestamp: ts,
        },
        battery: Some(minerhub_domain::energy::BatteryState {
            state_of_charge,
            remaining_capacity: 5000.0,
            current_power: 0.0,
            timestamp: ts,
        }),
        grid: None,
        external_source: None,
        timestamp: ts,
    }
}

/// Miner controller keeping one status per miner and recording commands.
pub struct StubController {
    default_status: MinerStatus,
    statuses: Mutex<HashMap<MinerId, MinerStatus>>,
    command_result: Mutex<Result<bool, AdapterError>>,
    status_fails: bool,
    hangs: bool,
    panics: bool,
    commands: Mutex<Vec<(MinerId, &'static str)>>,
}

impl StubController {
    fn build(status: MinerStatus, status_fails: bool, hangs: bool, panics: bool) -> Arc<Self> {
        Arc::new(Self {
            default_status: status,
            statuses: Mutex::new(HashMap::new()),
            command_result: Mutex::new(Ok(true)),
            status_fails,
            hangs,
            panics,
            commands: Mutex::new(Vec::new()),
        })
    }

    pub fn new(status: MinerStatus) -> Arc<Self> {
        Self::build(status, false, false, false)
    }

    pub fn failing_status() -> Arc<Self> {
        Self::build(MinerStatus::Unknown, true, false, false)
    }

    pub fn hanging() -> Arc<Self> {
        Self::build(MinerStatus::Unknown, false, true, false)
    }

    pub fn panicking() -> Arc<Self> {
        Self::build(MinerStatus::Unknown, false, false, true)
    }

    pub fn set_status(&self, miner_id: MinerId, status: MinerStatus) {
        self.statuses.lock().unwrap().insert(miner_id, status);
    }

    pub fn answer_commands_with(&self, result: Result<bool, AdapterError>) {
        *self.command_result.lock().unwrap() = result;
    }

    pub fn commands(&self) -> Vec<(MinerId, &'static str)> {
        self.commands.lock().unwrap().clone()
    }

    fn command(&self, miner_id: MinerId, verb: &'static str) -> Result<bool, MinerHubError> {
        self.commands.lock().unwrap().push((miner_id, verb));
        self.command_result.lock().unwrap().clone().map_err(Into::into)
    }
}

#[async_trait]
impl MinerControlPort for StubController {
    async fn status(&self, miner_id: MinerId) -> Result<MinerStatus, MinerHubError> {
        if self.hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.panics {
            panic!("controller exploded");
        }
        if self.status_fails {
            return Err(AdapterError::Io("controller unreachable".to_string()).into());
        }
        let statuses = self.statuses.lock().unwrap();
        Ok(statuses.get(&miner_id).copied().unwrap_or(self.default_status))
    }

    async fn power(&self, _miner_id: MinerId) -> Result<Option<Watts>, MinerHubError> {
        Ok(Some(3250.0))
    }

    async fn hash_rate(&self, _miner_id: MinerId) -> Result<Option<HashRate>, MinerHubError> {
        Ok(Some(HashRate::terahashes(95.0)))
    }

    async fn start(&self, miner_id: MinerId) -> Result<bool, MinerHubError> {
        self.command(miner_id, "start")
    }

    async fn stop(&self, miner_id: MinerId) -> Result<bool, MinerHubError> {
        self.command(miner_id, "stop")
    }

    fn name(&self) -> &str {
        "stub controller"
    }
}

/// Notifier recording every message it is asked to send.
pub struct SpyNotifier {
    name: String,
    accepts: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl SpyNotifier {
    pub fn accepting(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            accepts: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn refusing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            accepts: false,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent().into_iter().map(|(title, _)| title).collect()
    }
}

#[async_trait]
impl NotificationPort for SpyNotifier {
    async fn send(&self, title: &str, message: &str) -> Result<bool, MinerHubError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        Ok(self.accepts)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Solar forecast provider that always fails.
pub struct BrokenForecast;

#[async_trait]
impl ForecastProviderPort for BrokenForecast {
    async fn forecast(&self) -> Result<Option<Forecast>, MinerHubError> {
        Err(AdapterError::Io("forecast service down".to_string()).into())
    }

    fn name(&self) -> &str {
        "broken forecast"
    }
}

/// Home-load forecast provider predicting a flat load.
pub struct FlatHomeForecast(pub Watts);

#[async_trait]
impl HomeForecastProviderPort for FlatHomeForecast {
    async fn home_consumption_forecast(
        &self,
    ) -> Result<Option<ConsumptionForecast>, MinerHubError> {
        let start = now() - TimeDelta::hours(1);
        Ok(Some(ConsumptionForecast {
            predicted_watts: [(start, self.0)].into_iter().collect(),
            generated_at: Some(start),
        }))
    }

    fn name(&self) -> &str {
        "flat home forecast"
    }
}

/// Performance tracker reporting a fixed hash rate and recording the miners it was asked about.
pub struct FixedTracker {
    hash_rate: HashRate,
    asked: Mutex<Vec<MinerId>>,
}

impl FixedTracker {
    pub fn new(terahashes: f64) -> Arc<Self> {
        Arc::new(Self {
            hash_rate: HashRate::terahashes(terahashes),
            asked: Mutex::new(Vec::new()),
        })
    }

    pub fn asked(&self) -> Vec<MinerId> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl PerformanceTrackerPort for FixedTracker {
    async fn current_hashrate(
        &self,
        miner_ids: &[MinerId],
    ) -> Result<Option<HashRate>, MinerHubError> {
        self.asked.lock().unwrap().extend_from_slice(miner_ids);
        Ok(Some(self.hash_rate.clone()))
    }

    fn name(&self) -> &str {
        "fixed tracker"
    }
}

/// External service with only a name.
pub struct StubService(String);

impl StubService {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self(name.to_string()))
    }
}

impl ExternalServicePort for StubService {
    fn name(&self) -> &str {
        &self.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Factory & sun
// ---------------------------------------------------------------------------

/// Factory handing out pre-registered instances and counting invocations.
#[derive(Default)]
pub struct StubFactory {
    monitors: HashMap<AdapterId, Arc<dyn EnergyMonitorPort>>,
    controllers: HashMap<AdapterId, Arc<dyn MinerControlPort>>,
    notifiers: HashMap<AdapterId, Arc<dyn NotificationPort>>,
    forecasts: HashMap<AdapterId, Arc<dyn ForecastProviderPort>>,
    home_forecasts: HashMap<AdapterId, Arc<dyn HomeForecastProviderPort>>,
    trackers: HashMap<AdapterId, Arc<dyn PerformanceTrackerPort>>,
    services: HashMap<AdapterId, Arc<dyn ExternalServicePort>>,
    calls: AtomicUsize,
    services_passed: Mutex<Vec<String>>,
}

impl StubFactory {
    pub fn add_monitor<T: EnergyMonitorPort + 'static>(&mut self, id: AdapterId, monitor: Arc<T>) {
        self.monitors.insert(id, monitor);
    }

    pub fn add_controller<T: MinerControlPort + 'static>(
        &mut self,
        id: AdapterId,
        controller: Arc<T>,
    ) {
        self.controllers.insert(id, controller);
    }

    pub fn add_notifier<T: NotificationPort + 'static>(&mut self, id: AdapterId, notifier: Arc<T>) {
        self.notifiers.insert(id, notifier);
    }

    pub fn add_forecast<T: ForecastProviderPort + 'static>(
        &mut self,
        id: AdapterId,
        provider: Arc<T>,
    ) {
        self.forecasts.insert(id, provider);
    }

    pub fn add_home_forecast<T: HomeForecastProviderPort + 'static>(
        &mut self,
        id: AdapterId,
        provider: Arc<T>,
    ) {
        self.home_forecasts.insert(id, provider);
    }

    pub fn add_tracker<T: PerformanceTrackerPort + 'static>(
        &mut self,
        id: AdapterId,
        tracker: Arc<T>,
    ) {
        self.trackers.insert(id, tracker);
    }

    pub fn add_service<T: ExternalServicePort + 'static>(
        &mut self,
        id: AdapterId,
        service: Arc<T>,
    ) {
        self.services.insert(id, service);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn services_passed(&self) -> Vec<String> {
        self.services_passed.lock().unwrap().clone()
    }

    fn lookup<T: ?Sized>(
        &self,
        registry: &HashMap<AdapterId, Arc<T>>,
        config: &AdapterConfig,
        service: Option<&Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<T>, MinerHubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(service) = service {
            self.services_passed
                .lock()
                .unwrap()
                .push(service.name().to_string());
        }
        registry.get(&config.id).cloned().ok_or_else(|| {
            AdapterError::Unsupported {
                kind: config.kind,
                adapter_type: config.adapter_type.clone(),
            }
            .into()
        })
    }
}

impl AdapterFactory for StubFactory {
    fn energy_monitor(
        &self,
        config: &AdapterConfig,
        _source: &EnergySource,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn EnergyMonitorPort>, MinerHubError> {
        self.lookup(&self.monitors, config, service.as_ref())
    }

    fn miner_controller(
        &self,
        config: &AdapterConfig,
        _miner: &Miner,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn MinerControlPort>, MinerHubError> {
        self.lookup(&self.controllers, config, service.as_ref())
    }

    fn notifier(
        &self,
        config: &AdapterConfig,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn NotificationPort>, MinerHubError> {
        self.lookup(&self.notifiers, config, service.as_ref())
    }

    fn forecast_provider(
        &self,
        config: &AdapterConfig,
        _source: &EnergySource,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn ForecastProviderPort>, MinerHubError> {
        self.lookup(&self.forecasts, config, service.as_ref())
    }

    fn home_forecast_provider(
        &self,
        config: &AdapterConfig,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn HomeForecastProviderPort>, MinerHubError> {
        self.lookup(&self.home_forecasts, config, service.as_ref())
    }

    fn performance_tracker(
        &self,
        config: &AdapterConfig,
        service: Option<Arc<dyn ExternalServicePort>>,
    ) -> Result<Arc<dyn PerformanceTrackerPort>, MinerHubError> {
        self.lookup(&self.trackers, config, service.as_ref())
    }

    fn external_service(
        &self,
        config: &AdapterConfig,
    ) -> Result<Arc<dyn ExternalServicePort>, MinerHubError> {
        self.lookup(&self.services, config, None)
    }
}

/// Sun rising six hours before and setting six hours after `at`.
pub struct NoonSun;

impl SunProvider for NoonSun {
    fn sun(&self, at: Timestamp) -> Sun {
        Sun {
            dawn: at - TimeDelta::hours(7),
            sunrise: at - TimeDelta::hours(6),
            noon: at,
            sunset: at + TimeDelta::hours(6),
            dusk: at + TimeDelta::hours(7),
            azimuth: None,
            elevation: None,
        }
    }
}

/// Adapter configuration of `kind` with a fresh id.
pub fn adapter(name: &str, kind: AdapterKind) -> AdapterConfig {
    AdapterConfig::new(name, kind, "stub")
}
