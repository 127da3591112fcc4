//! Storage port — repository traits for the configuration entities.
//!
//! Implementations must support concurrent reads and per-entity updates
//! without locking unrelated entities: the orchestrator updates miners of
//! different units in parallel.

use std::future::Future;

use minerhub_domain::adapter::AdapterConfig;
use minerhub_domain::energy::EnergySource;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::id::{AdapterId, EnergySourceId, MinerId, PolicyId, UnitId};
use minerhub_domain::miner::Miner;
use minerhub_domain::optimization_unit::EnergyOptimizationUnit;
use minerhub_domain::policy::OptimizationPolicy;

/// Repository for [`EnergyOptimizationUnit`]s.
pub trait OptimizationUnitRepository: Send + Sync {
    /// Store a new unit.
    fn create(
        &self,
        unit: EnergyOptimizationUnit,
    ) -> impl Future<Output = Result<EnergyOptimizationUnit, MinerHubError>> + Send;

    /// Get a unit by id.
    fn get_by_id(
        &self,
        id: UnitId,
    ) -> impl Future<Output = Result<Option<EnergyOptimizationUnit>, MinerHubError>> + Send;

    /// Get all units.
    fn get_all(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyOptimizationUnit>, MinerHubError>> + Send;

    /// Get all enabled units.
    fn get_enabled(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyOptimizationUnit>, MinerHubError>> + Send;

    /// Replace an existing unit.
    fn update(
        &self,
        unit: EnergyOptimizationUnit,
    ) -> impl Future<Output = Result<EnergyOptimizationUnit, MinerHubError>> + Send;
}

/// Repository for [`OptimizationPolicy`]s.
pub trait PolicyRepository: Send + Sync {
    /// Store a new policy.
    fn create(
        &self,
        policy: OptimizationPolicy,
    ) -> impl Future<Output = Result<OptimizationPolicy, MinerHubError>> + Send;

    /// Get a policy by id.
    fn get_by_id(
        &self,
        id: PolicyId,
    ) -> impl Future<Output = Result<Option<OptimizationPolicy>, MinerHubError>> + Send;

    /// Get all policies.
    fn get_all(
        &self,
    ) -> impl Future<Output = Result<Vec<OptimizationPolicy>, MinerHubError>> + Send;

    /// Replace an existing policy.
    fn update(
        &self,
        policy: OptimizationPolicy,
    ) -> impl Future<Output = Result<OptimizationPolicy, MinerHubError>> + Send;
}

/// Repository for [`Miner`]s.
pub trait MinerRepository: Send + Sync {
    /// Store a new miner.
    fn create(&self, miner: Miner) -> impl Future<Output = Result<Miner, MinerHubError>> + Send;

    /// Get a miner by id.
    fn get_by_id(
        &self,
        id: MinerId,
    ) -> impl Future<Output = Result<Option<Miner>, MinerHubError>> + Send;

    /// Get all miners.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Miner>, MinerHubError>> + Send;

    /// Replace an existing miner.
    fn update(&self, miner: Miner) -> impl Future<Output = Result<Miner, MinerHubError>> + Send;
}

/// Repository for [`EnergySource`]s.
pub trait EnergySourceRepository: Send + Sync {
    /// Store a new energy source.
    fn create(
        &self,
        source: EnergySource,
    ) -> impl Future<Output = Result<EnergySource, MinerHubError>> + Send;

    /// Get an energy source by id.
    fn get_by_id(
        &self,
        id: EnergySourceId,
    ) -> impl Future<Output = Result<Option<EnergySource>, MinerHubError>> + Send;

    /// Get all energy sources.
    fn get_all(&self) -> impl Future<Output = Result<Vec<EnergySource>, MinerHubError>> + Send;
}

/// Repository for [`AdapterConfig`]s.
pub trait AdapterConfigRepository: Send + Sync {
    /// Store a new adapter configuration.
    fn create(
        &self,
        config: AdapterConfig,
    ) -> impl Future<Output = Result<AdapterConfig, MinerHubError>> + Send;

    /// Get an adapter configuration by id.
    fn get_by_id(
        &self,
        id: AdapterId,
    ) -> impl Future<Output = Result<Option<AdapterConfig>, MinerHubError>> + Send;

    /// Get all adapter configurations.
    fn get_all(&self) -> impl Future<Output = Result<Vec<AdapterConfig>, MinerHubError>> + Send;
}
