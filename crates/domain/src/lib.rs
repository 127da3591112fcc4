//! # minerhub-domain
//!
//! Pure domain model for the minerhub energy-aware mining controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Miners** (controlled devices with an observed status)
//! - Define **Energy** sources and state snapshots (production, load, battery, grid)
//! - Define **Forecasts** (solar production, home load, sun position)
//! - Define **Optimization units** (one policy + energy inputs + target miners)
//! - Define **Adapter configurations** (which concrete adapter backs each port)
//! - Define **Policies** (prioritized start/stop rules over a condition tree)
//!   and the [`DecisionalContext`](policy::DecisionalContext) they evaluate against
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod adapter;
pub mod energy;
pub mod forecast;
pub mod miner;
pub mod optimization_unit;
pub mod policy;
