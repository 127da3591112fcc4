//! Optimization unit — one policy, its energy inputs and the miners it drives.

use serde::{Deserialize, Serialize};

use crate::error::{MinerHubError, ValidationError};
use crate::id::{AdapterId, EnergySourceId, MinerId, PolicyId, UnitId};

/// Configuration grouping a policy with its energy source, optional
/// providers, target miners and notifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyOptimizationUnit {
    pub id: UnitId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub policy_id: Option<PolicyId>,
    #[serde(default)]
    pub target_miner_ids: Vec<MinerId>,
    #[serde(default)]
    pub energy_source_id: Option<EnergySourceId>,
    #[serde(default)]
    pub home_forecast_provider_id: Option<AdapterId>,
    #[serde(default)]
    pub performance_tracker_id: Option<AdapterId>,
    #[serde(default)]
    pub notifier_ids: Vec<AdapterId>,
}

impl EnergyOptimizationUnit {
    /// Create a builder for constructing an [`EnergyOptimizationUnit`].
    #[must_use]
    pub fn builder() -> EnergyOptimizationUnitBuilder {
        EnergyOptimizationUnitBuilder::default()
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

    pub fn add_target_miner(&mut self, miner_id: MinerId) {
        if !self.target_miner_ids.contains(&miner_id) {
            self.target_miner_ids.push(miner_id);
        }
    }

    pub fn remove_target_miner(&mut self, miner_id: MinerId) {
        self.target_miner_ids.retain(|id| *id != miner_id);
    }

    pub fn add_notifier(&mut self, notifier_id: AdapterId) {
        if !self.notifier_ids.contains(&notifier_id) {
            self.notifier_ids.push(notifier_id);
        }
    }

    pub fn remove_notifier(&mut self, notifier_id: AdapterId) {
        self.notifier_ids.retain(|id| *id != notifier_id);
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

/// Step-by-step builder for [`EnergyOptimizationUnit`].
#[derive(Debug, Default)]
pub struct EnergyOptimizationUnitBuilder {
    id: Option<UnitId>,
    name: Option<String>,
    description: Option<String>,
    enabled: bool,
    policy_id: Option<PolicyId>,
    target_miner_ids: Vec<MinerId>,
    energy_source_id: Option<EnergySourceId>,
    home_forecast_provider_id: Option<AdapterId>,
    performance_tracker_id: Option<AdapterId>,
    notifier_ids: Vec<AdapterId>,
}

impl EnergyOptimizationUnitBuilder {
    #[must_use]
    pub fn id(mut self, id: UnitId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn policy(mut self, id: PolicyId) -> Self {
        self.policy_id = Some(id);
        self
    }

    #[must_use]
    pub fn target_miner(mut self, id: MinerId) -> Self {
        self.target_miner_ids.push(id);
        self
    }

    #[must_use]
    pub fn energy_source(mut self, id: EnergySourceId) -> Self {
        self.energy_source_id = Some(id);
        self
    }

    #[must_use]
    pub fn home_forecast_provider(mut self, id: AdapterId) -> Self {
        self.home_forecast_provider_id = Some(id);
        self
    }

    #[must_use]
    pub fn performance_tracker(mut self, id: AdapterId) -> Self {
        self.performance_tracker_id = Some(id);
        self
    }

    #[must_use]
    pub fn notifier(mut self, id: AdapterId) -> Self {
        self.notifier_ids.push(id);
        self
    }

    /// Consume the builder, validate, and return an [`EnergyOptimizationUnit`].
    ///
    /// Duplicate miner and notifier ids are collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<EnergyOptimizationUnit, MinerHubError> {
        let mut unit = EnergyOptimizationUnit {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            enabled: self.enabled,
            policy_id: self.policy_id,
            target_miner_ids: Vec::new(),
            energy_source_id: self.energy_source_id,
            home_forecast_provider_id: self.home_forecast_provider_id,
            performance_tracker_id: self.performance_tracker_id,
            notifier_ids: Vec::new(),
        };
        for id in self.target_miner_ids {
            unit.add_target_miner(id);
        }
        for id in self.notifier_ids {
            unit.add_notifier(id);
        }
        unit.validate()?;
        Ok(unit)
    }
}
