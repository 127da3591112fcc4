//! Sun events from fixed daylight hours.

use chrono::TimeDelta;
use minerhub_app::ports::SunProvider;
use minerhub_domain::forecast::Sun;
use minerhub_domain::time::Timestamp;

use crate::devices::start_of_day;

/// [`SunProvider`] returning the same sunrise and sunset every day.
///
/// Dawn and dusk sit `twilight_minutes` outside sunrise and sunset; solar
/// noon is halfway between them. Position data is not simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfiguredSun {
    sunrise_hour: u32,
    sunset_hour: u32,
    twilight_minutes: u32,
}

impl Default for ConfiguredSun {
    fn default() -> Self {
        Self::new(6, 20, 30)
    }
}

impl ConfiguredSun {
    /// Hours are UTC and expected to satisfy `sunrise_hour < sunset_hour <= 24`.
    #[must_use]
    pub fn new(sunrise_hour: u32, sunset_hour: u32, twilight_minutes: u32) -> Self {
        Self {
            sunrise_hour,
            sunset_hour,
            twilight_minutes,
        }
    }
}

impl SunProvider for ConfiguredSun {
    fn sun(&self, at: Timestamp) -> Sun {
        let midnight = start_of_day(at);
        let twilight = TimeDelta::minutes(i64::from(self.twilight_minutes));
        let sunrise = midnight + TimeDelta::hours(i64::from(self.sunrise_hour));
        let sunset = midnight + TimeDelta::hours(i64::from(self.sunset_hour));
        Sun {
            dawn: sunrise - twilight,
            sunrise,
            noon: sunrise + (sunset - sunrise) / 2,
            sunset,
            dusk: sunset + twilight,
            azimuth: None,
            elevation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::at_hour;

    #[test]
    fn should_place_events_on_the_day_of_the_request() {
        let sun = ConfiguredSun::new(6, 20, 30).sun(at_hour(15, 42));
        assert_eq!(sun.sunrise, at_hour(6, 0));
        assert_eq!(sun.sunset, at_hour(20, 0));
        assert_eq!(sun.noon, at_hour(13, 0));
        assert_eq!(sun.dawn, at_hour(5, 30));
        assert_eq!(sun.dusk, at_hour(20, 30));
    }

    #[test]
    fn should_report_daylight_between_sunrise_and_sunset() {
        let provider = ConfiguredSun::default();
        assert!(provider.sun(at_hour(12, 0)).is_daylight(at_hour(12, 0)));
        assert!(!provider.sun(at_hour(22, 0)).is_daylight(at_hour(22, 0)));
        assert_eq!(provider.sun(at_hour(0, 0)).daylight(), TimeDelta::hours(14));
    }
}
