//! # minerhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - repositories for units, policies, miners, energy sources and adapter configurations
//!   - live adapter ports: energy monitor, miner controller, notifier, forecasts,
//!     performance tracker, external service
//!   - `AdapterFactory` — builds live adapters from configuration entities
//!   - `SunProvider` — sun events for the installation site
//! - Provide the **decision core**:
//!   - `rule_engine` — condition evaluation, prioritized rule matching, rule validation
//!   - `adapter_service` — resolves and caches live adapter instances
//!   - `optimization_service` — runs one cycle across every enabled unit
//!   - `scheduler` — fires cycles at a fixed interval without overlap
//!
//! ## Dependency rule
//! Depends on `minerhub-domain` only (plus `tokio` for tasks, locks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod adapter_service;
pub mod optimization_service;
pub mod ports;
pub mod rule_engine;
pub mod scheduler;

#[cfg(test)]
mod testing;
