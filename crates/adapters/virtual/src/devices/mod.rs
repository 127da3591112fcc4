//! Simulated adapter implementations.
//!
//! Solar production in both the monitor and the forecast follows one
//! [`SolarProfile`], so forecasts and live readings agree with each other.

mod controller;
mod forecast;
mod home_load;
mod monitor;
mod notifier;
mod tracker;

pub use controller::DummyMinerController;
pub use forecast::DummySolarForecastProvider;
pub use home_load::DummyHomeForecastProvider;
pub use monitor::{DummySolarEnergyMonitor, SimulatedBattery};
pub use notifier::LogNotifier;
pub use tracker::DummyPerformanceTracker;

use std::f64::consts::PI;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{TimeDelta, Timelike};
use minerhub_domain::energy::Watts;
use minerhub_domain::time::Timestamp;

/// Bell-shaped daily production curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarProfile {
    pub peak_power: Watts,
    pub sunrise_hour: u32,
    pub sunset_hour: u32,
}

impl Default for SolarProfile {
    fn default() -> Self {
        Self {
            peak_power: 5000.0,
            sunrise_hour: 6,
            sunset_hour: 20,
        }
    }
}

impl SolarProfile {
    /// Production at `at`: zero outside daylight, `peak_power` halfway
    /// between sunrise and sunset.
    #[must_use]
    pub fn power_at(&self, at: Timestamp) -> Watts {
        let rise = self.sunrise_hour * 3600;
        let set = self.sunset_hour * 3600;
        let seconds = at.num_seconds_from_midnight();
        if set <= rise || seconds < rise || seconds >= set {
            return 0.0;
        }
        let progress = f64::from(seconds - rise) / f64::from(set - rise);
        self.peak_power * (progress * PI).sin()
    }
}

pub(crate) fn start_of_day(at: Timestamp) -> Timestamp {
    at - TimeDelta::seconds(i64::from(at.num_seconds_from_midnight()))
        - TimeDelta::nanoseconds(i64::from(at.nanosecond()))
}

pub(crate) fn start_of_hour(at: Timestamp) -> Timestamp {
    at - TimeDelta::seconds(i64::from(at.num_seconds_from_midnight() % 3600))
        - TimeDelta::nanoseconds(i64::from(at.nanosecond()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) fn at_hour(hour: u32, minute: u32) -> Timestamp {
    use chrono::{TimeZone, Utc};
    Utc.with_ymd_and_hms(2026, 6, 21, hour, minute, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> SolarProfile {
        SolarProfile {
            peak_power: 4000.0,
            sunrise_hour: 6,
            sunset_hour: 18,
        }
    }

    #[test]
    fn should_produce_nothing_when_sun_is_down() {
        assert!(profile().power_at(at_hour(5, 59)).abs() < f64::EPSILON);
        assert!(profile().power_at(at_hour(18, 0)).abs() < f64::EPSILON);
        assert!(profile().power_at(at_hour(23, 30)).abs() < f64::EPSILON);
    }

    #[test]
    fn should_peak_halfway_through_daylight() {
        assert!((profile().power_at(at_hour(12, 0)) - 4000.0).abs() < 1e-6);
        let morning = profile().power_at(at_hour(9, 0));
        let afternoon = profile().power_at(at_hour(15, 0));
        assert!((morning - afternoon).abs() < 1e-6);
        assert!(morning > 0.0 && morning < 4000.0);
    }

    #[test]
    fn should_produce_nothing_when_sunset_is_not_after_sunrise() {
        let inverted = SolarProfile {
            sunrise_hour: 18,
            sunset_hour: 6,
            ..profile()
        };
        assert!(inverted.power_at(at_hour(12, 0)).abs() < f64::EPSILON);
    }

    #[test]
    fn should_truncate_to_hour_and_day() {
        let ts = at_hour(14, 37);
        assert_eq!(start_of_hour(ts), at_hour(14, 0));
        assert_eq!(start_of_day(ts), at_hour(0, 0));
    }
}
