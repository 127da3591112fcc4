//! # minerhub-adapter-memory
//!
//! In-memory persistence adapter backed by [dashmap](https://docs.rs/dashmap).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `minerhub-app::ports::storage`
//! - Validate entities on `create` and `update`
//! - Lock per entry, so concurrent updates of different entities never wait on each other
//!
//! Listings are returned sorted by name.
//!
//! ## Dependency rule
//! Depends on `minerhub-app` (for port traits) and `minerhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod adapter_config_repo;
mod energy_source_repo;
mod miner_repo;
mod policy_repo;
mod table;
mod unit_repo;

pub use adapter_config_repo::MemoryAdapterConfigRepository;
pub use energy_source_repo::MemoryEnergySourceRepository;
pub use miner_repo::MemoryMinerRepository;
pub use policy_repo::MemoryPolicyRepository;
pub use unit_repo::MemoryOptimizationUnitRepository;
