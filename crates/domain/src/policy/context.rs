//! Decisional context — the read-only snapshot a policy evaluates against.
//!
//! Rules address the context through dotted paths over its JSON form
//! ([`DecisionalContext::to_value`]). Besides the serialized fields, the
//! JSON form carries values derived relative to the context timestamp:
//!
//! | Path | Meaning |
//! |------|---------|
//! | `energy_state.surplus` | production minus household load, floored at 0 |
//! | `energy_state.battery.charging_power` / `discharging_power` | split of the signed battery power |
//! | `energy_state.grid.importing_power` / `exporting_power` | split of the signed grid power |
//! | `forecast.next_hour_power` | average power of the interval one hour ahead |
//! | `forecast.avg_next_4_hours_power` | mean power over the next four hours |
//! | `forecast.next_hour_energy` | energy between one and two hours ahead |
//! | `home_load_forecast.current_power` | predicted household load now |
//! | `sun.is_daylight` | between sunrise and sunset |
//! | `sun.seconds_until_sunset` / `seconds_since_sunrise` | signed offsets |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::energy::{EnergySource, EnergyStateSnapshot};
use crate::error::{MinerHubError, ValidationError};
use crate::forecast::{ConsumptionForecast, Forecast, Sun};
use crate::miner::{HashRate, Miner};
use crate::time::{Timestamp, seconds_between};

/// Inputs gathered once per unit per cycle, extended with one miner before
/// each policy evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionalContext {
    pub energy_source: EnergySource,
    pub energy_state: EnergyStateSnapshot,
    pub forecast: Option<Forecast>,
    pub home_load_forecast: Option<ConsumptionForecast>,
    pub tracker_current_hashrate: Option<HashRate>,
    pub sun: Option<Sun>,
    pub miner: Option<Miner>,
    pub timestamp: Timestamp,
}

impl DecisionalContext {
    /// Create a builder for constructing a [`DecisionalContext`].
    #[must_use]
    pub fn builder() -> DecisionalContextBuilder {
        DecisionalContextBuilder::default()
    }

    /// Copy of this context bound to `miner`.
    #[must_use]
    pub fn with_miner(&self, miner: Miner) -> Self {
        Self {
            miner: Some(miner),
            ..self.clone()
        }
    }

    /// JSON form used for field-path resolution, including derived values.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if a component fails to serialize.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut root = serde_json::to_value(self)?;
        let now = self.timestamp;

        insert_at(
            &mut root,
            &["energy_state"],
            [("surplus", self.energy_state.surplus().into())],
        );
        if let Some(battery) = &self.energy_state.battery {
            insert_at(
                &mut root,
                &["energy_state", "battery"],
                [
                    ("charging_power", battery.charging_power().into()),
                    ("discharging_power", battery.discharging_power().into()),
                ],
            );
        }
        if let Some(grid) = &self.energy_state.grid {
            insert_at(
                &mut root,
                &["energy_state", "grid"],
                [
                    ("importing_power", grid.importing_power().into()),
                    ("exporting_power", grid.exporting_power().into()),
                ],
            );
        }
        if let Some(forecast) = &self.forecast {
            insert_at(
                &mut root,
                &["forecast"],
                [
                    ("next_hour_power", forecast.next_hour_power(now).into()),
                    (
                        "avg_next_4_hours_power",
                        forecast.avg_next_4_hours_power(now).into(),
                    ),
                    ("next_hour_energy", forecast.next_hour_energy(now).into()),
                ],
            );
        }
        if let Some(home) = &self.home_load_forecast {
            insert_at(
                &mut root,
                &["home_load_forecast"],
                [("current_power", home.power_at(now).into())],
            );
        }
        if let Some(sun) = &self.sun {
            insert_at(
                &mut root,
                &["sun"],
                [
                    ("is_daylight", sun.is_daylight(now).into()),
                    (
                        "seconds_until_sunset",
                        seconds_between(now, sun.sunset).into(),
                    ),
                    (
                        "seconds_since_sunrise",
                        seconds_between(sun.sunrise, now).into(),
                    ),
                ],
            );
        }
        Ok(root)
    }
}

fn insert_at<const N: usize>(root: &mut Value, path: &[&str], entries: [(&str, Value); N]) {
    let target = path
        .iter()
        .try_fold(root, |node, key| node.get_mut(*key))
        .and_then(Value::as_object_mut);
    if let Some(object) = target {
        for (key, value) in entries {
            object.insert(key.to_string(), value);
        }
    }
}

/// Step-by-step builder for [`DecisionalContext`].
#[derive(Debug, Default)]
pub struct DecisionalContextBuilder {
    energy_source: Option<EnergySource>,
    energy_state: Option<EnergyStateSnapshot>,
    forecast: Option<Forecast>,
    home_load_forecast: Option<ConsumptionForecast>,
    tracker_current_hashrate: Option<HashRate>,
    sun: Option<Sun>,
    miner: Option<Miner>,
    timestamp: Option<Timestamp>,
}

impl DecisionalContextBuilder {
    #[must_use]
    pub fn energy_source(mut self, source: EnergySource) -> Self {
        self.energy_source = Some(source);
        self
    }

    #[must_use]
    pub fn energy_state(mut self, state: EnergyStateSnapshot) -> Self {
        self.energy_state = Some(state);
        self
    }

    #[must_use]
    pub fn forecast(mut self, forecast: Option<Forecast>) -> Self {
        self.forecast = forecast;
        self
    }

    #[must_use]
    pub fn home_load_forecast(mut self, forecast: Option<ConsumptionForecast>) -> Self {
        self.home_load_forecast = forecast;
        self
    }

    #[must_use]
    pub fn tracker_current_hashrate(mut self, hash_rate: Option<HashRate>) -> Self {
        self.tracker_current_hashrate = hash_rate;
        self
    }

    #[must_use]
    pub fn sun(mut self, sun: Sun) -> Self {
        self.sun = Some(sun);
        self
    }

    #[must_use]
    pub fn miner(mut self, miner: Miner) -> Self {
        self.miner = Some(miner);
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Consume the builder and return a [`DecisionalContext`].
    ///
    /// The timestamp defaults to the energy snapshot's timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] if the energy source or the
    /// energy state is missing.
    pub fn build(self) -> Result<DecisionalContext, MinerHubError> {
        let energy_source = self
            .energy_source
            .ok_or(ValidationError::MissingField("energy_source"))?;
        let energy_state = self
            .energy_state
            .ok_or(ValidationError::MissingField("energy_state"))?;
        Ok(DecisionalContext {
            timestamp: self.timestamp.unwrap_or(energy_state.timestamp),
            energy_source,
            energy_state,
            forecast: self.forecast,
            home_load_forecast: self.home_load_forecast,
            tracker_current_hashrate: self.tracker_current_hashrate,
            sun: self.sun,
            miner: self.miner,
        })
    }
}
