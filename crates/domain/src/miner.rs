//! Miner — a controllable mining device and its observed state.

use serde::{Deserialize, Serialize};

use crate::energy::Watts;
use crate::error::{MinerHubError, ValidationError};
use crate::id::{AdapterId, MinerId};

/// Observed lifecycle status of a miner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinerStatus {
    #[default]
    Unknown,
    Off,
    Starting,
    On,
    Stopping,
    Error,
}

impl MinerStatus {
    /// Whether a start command makes sense from this status.
    #[must_use]
    pub fn can_start(self) -> bool {
        matches!(self, Self::Off | Self::Error | Self::Unknown)
    }
}

impl std::fmt::Display for MinerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Off => "off",
            Self::Starting => "starting",
            Self::On => "on",
            Self::Stopping => "stopping",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A hash rate measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashRate {
    pub value: f64,
    #[serde(default = "HashRate::default_unit")]
    pub unit: String,
}

impl HashRate {
    /// Create a measurement in `TH/s`.
    #[must_use]
    pub fn terahashes(value: f64) -> Self {
        Self {
            value,
            unit: Self::default_unit(),
        }
    }

    fn default_unit() -> String {
        "TH/s".to_string()
    }
}

impl std::fmt::Display for HashRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// A controllable mining device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Miner {
    pub id: MinerId,
    pub name: String,
    #[serde(default)]
    pub status: MinerStatus,
    #[serde(default)]
    pub hash_rate: Option<HashRate>,
    #[serde(default)]
    pub power_consumption: Option<Watts>,
    #[serde(default)]
    pub hash_rate_max: Option<HashRate>,
    #[serde(default)]
    pub power_consumption_max: Option<Watts>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub controller_id: Option<AdapterId>,
}

fn default_active() -> bool {
    true
}

impl Miner {
    /// Create a builder for constructing a [`Miner`].
    #[must_use]
    pub fn builder() -> MinerBuilder {
        MinerBuilder::default()
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

    /// Record that a start was requested. No-op unless the miner is stopped.
    pub fn turn_on(&mut self) {
        if self.status.can_start() {
            self.status = MinerStatus::Starting;
        }
    }

    /// Record that a stop was requested. No-op unless the miner is running or errored.
    pub fn turn_off(&mut self) {
        if matches!(self.status, MinerStatus::On | MinerStatus::Error) {
            self.status = MinerStatus::Stopping;
        }
    }

    /// Apply a live reading from the controller. Absent readings leave the
    /// previous values in place.
    pub fn update_status(
        &mut self,
        status: MinerStatus,
        hash_rate: Option<HashRate>,
        power_consumption: Option<Watts>,
    ) {
        self.status = status;
        if hash_rate.is_some() {
            self.hash_rate = hash_rate;
        }
        if power_consumption.is_some() {
            self.power_consumption = power_consumption;
        }
    }
}

/// Step-by-step builder for [`Miner`].
#[derive(Debug)]
pub struct MinerBuilder {
    id: Option<MinerId>,
    name: Option<String>,
    status: MinerStatus,
    hash_rate_max: Option<HashRate>,
    power_consumption_max: Option<Watts>,
    active: bool,
    controller_id: Option<AdapterId>,
}

impl Default for MinerBuilder {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            status: MinerStatus::Unknown,
            hash_rate_max: None,
            power_consumption_max: None,
            active: true,
            controller_id: None,
        }
    }
}

impl MinerBuilder {
    #[must_use]
    pub fn id(mut self, id: MinerId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: MinerStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn hash_rate_max(mut self, hash_rate: HashRate) -> Self {
        self.hash_rate_max = Some(hash_rate);
        self
    }

    #[must_use]
    pub fn power_consumption_max(mut self, watts: Watts) -> Self {
        self.power_consumption_max = Some(watts);
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[must_use]
    pub fn controller(mut self, id: AdapterId) -> Self {
        self.controller_id = Some(id);
        self
    }

    /// Consume the builder, validate, and return a [`Miner`].
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Miner, MinerHubError> {
        let miner = Miner {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            status: self.status,
            hash_rate: None,
            power_consumption: None,
            hash_rate_max: self.hash_rate_max,
            power_consumption_max: self.power_consumption_max,
            active: self.active,
            controller_id: self.controller_id,
        };
        miner.validate()?;
        Ok(miner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miner(status: MinerStatus) -> Miner {
        Miner::builder().name("S19").status(status).build().unwrap()
    }

    #[test]
    fn should_build_miner_with_defaults() {
        let m = Miner::builder().name("S19").build().unwrap();
        assert_eq!(m.status, MinerStatus::Unknown);
        assert!(m.active);
        assert!(m.controller_id.is_none());
        assert!(m.hash_rate.is_none());
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Miner::builder().build();
        assert!(matches!(
            result,
            Err(MinerHubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_move_to_starting_when_turned_on_from_stopped_states() {
        for status in [MinerStatus::Off, MinerStatus::Error, MinerStatus::Unknown] {
            let mut m = miner(status);
            m.turn_on();
            assert_eq!(m.status, MinerStatus::Starting, "from {status}");
        }
    }

    #[test]
    fn should_ignore_turn_on_when_already_running() {
        let mut m = miner(MinerStatus::On);
        m.turn_on();
        assert_eq!(m.status, MinerStatus::On);
    }

    #[test]
    fn should_move_to_stopping_when_turned_off_from_on_or_error() {
        for status in [MinerStatus::On, MinerStatus::Error] {
            let mut m = miner(status);
            m.turn_off();
            assert_eq!(m.status, MinerStatus::Stopping);
        }
        let mut off = miner(MinerStatus::Off);
        off.turn_off();
        assert_eq!(off.status, MinerStatus::Off);
    }

    #[test]
    fn should_keep_previous_readings_when_update_has_none() {
        let mut m = miner(MinerStatus::Off);
        m.update_status(MinerStatus::On, Some(HashRate::terahashes(95.0)), Some(3250.0));
        m.update_status(MinerStatus::On, None, None);
        assert_eq!(m.hash_rate, Some(HashRate::terahashes(95.0)));
        assert_eq!(m.power_consumption, Some(3250.0));
    }

    #[test]
    fn should_serialize_status_lowercase() {
        let json = serde_json::to_value(MinerStatus::Starting).unwrap();
        assert_eq!(json, "starting");
    }

    #[test]
    fn should_default_hash_rate_unit_when_deserializing() {
        let rate: HashRate = serde_json::from_value(serde_json::json!({"value": 110.0})).unwrap();
        assert_eq!(rate.unit, "TH/s");
        assert_eq!(rate.to_string(), "110 TH/s");
    }
}
