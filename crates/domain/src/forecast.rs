//! Forecasts — predicted solar production, predicted home load, and sun position.
//!
//! All time-relative queries take the reference instant explicitly so they
//! stay deterministic; the decisional context passes its own timestamp.

use std::collections::BTreeMap;

use chrono::{Duration, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::energy::{WattHours, Watts};
use crate::time::{Timestamp, seconds_between};

/// Predicted instantaneous power at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPowerPoint {
    pub timestamp: Timestamp,
    pub power: Watts,
}

/// A forecast window with its predicted energy and power samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInterval {
    pub start: Timestamp,
    pub end: Timestamp,
    #[serde(default)]
    pub energy: Option<WattHours>,
    #[serde(default)]
    pub energy_remaining: Option<WattHours>,
    #[serde(default)]
    pub power_points: Vec<ForecastPowerPoint>,
}

impl ForecastInterval {
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Mean of the power samples, `0.0` without samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_power(&self) -> Watts {
        if self.power_points.is_empty() {
            return 0.0;
        }
        let total: Watts = self.power_points.iter().map(|p| p.power).sum();
        total / self.power_points.len() as f64
    }

    fn contains(&self, at: Timestamp) -> bool {
        self.start <= at && at < self.end
    }

    fn overlaps(&self, start: Timestamp, end: Timestamp) -> bool {
        self.start < end && self.end > start
    }

    /// Share of this interval's energy falling inside `[start, end)`.
    fn energy_overlap(&self, start: Timestamp, end: Timestamp) -> WattHours {
        let overlap_start = self.start.max(start);
        let overlap_end = self.end.min(end);
        let total = seconds_between(self.start, self.end);
        if overlap_start >= overlap_end || total <= 0.0 {
            return 0.0;
        }
        let ratio = seconds_between(overlap_start, overlap_end) / total;
        self.energy.unwrap_or(0.0) * ratio
    }
}

/// Solar production forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub timestamp: Timestamp,
    #[serde(default)]
    pub intervals: Vec<ForecastInterval>,
}

impl Forecast {
    /// Create a forecast; intervals and their samples are stored in time order.
    #[must_use]
    pub fn new(timestamp: Timestamp, mut intervals: Vec<ForecastInterval>) -> Self {
        intervals.sort_by_key(|i| i.start);
        for interval in &mut intervals {
            interval.power_points.sort_by_key(|p| p.timestamp);
        }
        Self {
            timestamp,
            intervals,
        }
    }

    /// Average power of the interval covering `now + 1h`, if it has samples.
    #[must_use]
    pub fn next_hour_power(&self, now: Timestamp) -> Option<Watts> {
        let target = now + Duration::hours(1);
        self.intervals
            .iter()
            .filter(|i| i.contains(target) && !i.power_points.is_empty())
            .min_by_key(|i| i.start)
            .map(ForecastInterval::avg_power)
    }

    /// Mean of the average powers of every interval overlapping the next four hours.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_next_4_hours_power(&self, now: Timestamp) -> Watts {
        let horizon = now + Duration::hours(4);
        let powers: Vec<Watts> = self
            .intervals
            .iter()
            .filter(|i| i.overlaps(now, horizon))
            .map(ForecastInterval::avg_power)
            .collect();
        if powers.is_empty() {
            return 0.0;
        }
        round3(powers.iter().sum::<Watts>() / powers.len() as f64)
    }

    /// Energy predicted between `now + 1h` and `now + 2h`.
    #[must_use]
    pub fn next_hour_energy(&self, now: Timestamp) -> WattHours {
        let start = now + Duration::hours(1);
        self.energy_between(start, start + Duration::hours(1))
            .unwrap_or(0.0)
    }

    /// Power at `at`, linearly interpolated between the surrounding samples.
    ///
    /// Returns `None` when `at` is not bracketed by samples.
    #[must_use]
    pub fn power_at(&self, at: Timestamp) -> Option<Watts> {
        let mut points: Vec<&ForecastPowerPoint> = self
            .intervals
            .iter()
            .flat_map(|i| i.power_points.iter())
            .collect();
        points.sort_by_key(|p| p.timestamp);

        let mut before = None;
        for point in points {
            if point.timestamp == at {
                return Some(point.power);
            }
            if point.timestamp < at {
                before = Some(point);
                continue;
            }
            let first = before?;
            let span = seconds_between(first.timestamp, point.timestamp);
            if span == 0.0 {
                return Some(first.power);
            }
            let ratio = seconds_between(first.timestamp, at) / span;
            return Some(round3(first.power + (point.power - first.power) * ratio));
        }
        None
    }

    /// Energy predicted over `[start, end)`, pro-rated for partial overlaps.
    ///
    /// Returns `None` when nothing positive is forecast in the window.
    #[must_use]
    pub fn energy_between(&self, start: Timestamp, end: Timestamp) -> Option<WattHours> {
        let total: WattHours = self
            .intervals
            .iter()
            .map(|i| i.energy_overlap(start, end))
            .sum();
        (total > 0.0).then(|| round3(total))
    }
}

/// Predicted household load, excluding the miners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionForecast {
    pub predicted_watts: BTreeMap<Timestamp, Watts>,
    pub generated_at: Option<Timestamp>,
}

impl ConsumptionForecast {
    /// Latest prediction at or before `at`.
    #[must_use]
    pub fn power_at(&self, at: Timestamp) -> Option<Watts> {
        self.predicted_watts
            .range(..=at)
            .next_back()
            .map(|(_, watts)| *watts)
    }
}

/// Sun events for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sun {
    pub dawn: Timestamp,
    pub sunrise: Timestamp,
    pub noon: Timestamp,
    pub sunset: Timestamp,
    pub dusk: Timestamp,
    #[serde(default)]
    pub azimuth: Option<f64>,
    #[serde(default)]
    pub elevation: Option<f64>,
}

impl Sun {
    #[must_use]
    pub fn is_daylight(&self, at: Timestamp) -> bool {
        self.sunrise <= at && at < self.sunset
    }

    #[must_use]
    pub fn daylight(&self) -> TimeDelta {
        self.sunset - self.sunrise
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
