//! Simulated solar forecast.

use async_trait::async_trait;
use chrono::TimeDelta;
use minerhub_app::ports::ForecastProviderPort;
use minerhub_domain::energy::Watts;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::forecast::{Forecast, ForecastInterval, ForecastPowerPoint};
use minerhub_domain::time::{Timestamp, now};
use tracing::debug;

use super::{SolarProfile, start_of_hour};

/// Hourly forecast derived from a [`SolarProfile`] scaled by an efficiency factor.
///
/// Each interval carries samples at its start, middle and end; its energy
/// is the trapezoidal integral of those samples.
#[derive(Debug)]
pub struct DummySolarForecastProvider {
    name: String,
    profile: SolarProfile,
    efficiency: f64,
    hours: u32,
}

impl DummySolarForecastProvider {
    /// `efficiency` is a fraction in `0.0..=1.0`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        profile: SolarProfile,
        efficiency: f64,
        hours: u32,
    ) -> Self {
        Self {
            name: name.into(),
            profile,
            efficiency,
            hours,
        }
    }

    fn power_at(&self, at: Timestamp) -> Watts {
        self.profile.power_at(at) * self.efficiency
    }

    /// Forecast starting at the hour containing `at`.
    #[must_use]
    pub fn forecast_at(&self, at: Timestamp) -> Forecast {
        let first = start_of_hour(at);
        let intervals = (0..self.hours)
            .map(|hour| {
                let start = first + TimeDelta::hours(i64::from(hour));
                let middle = start + TimeDelta::minutes(30);
                let end = start + TimeDelta::hours(1);
                let (p_start, p_middle, p_end) =
                    (self.power_at(start), self.power_at(middle), self.power_at(end));
                ForecastInterval {
                    start,
                    end,
                    energy: Some((p_start + 2.0 * p_middle + p_end) / 4.0),
                    energy_remaining: None,
                    power_points: vec![
                        ForecastPowerPoint {
                            timestamp: start,
                            power: p_start,
                        },
                        ForecastPowerPoint {
                            timestamp: middle,
                            power: p_middle,
                        },
                        ForecastPowerPoint {
                            timestamp: end,
                            power: p_end,
                        },
                    ],
                }
            })
            .collect();
        Forecast::new(at, intervals)
    }
}

#[async_trait]
impl ForecastProviderPort for DummySolarForecastProvider {
    async fn forecast(&self) -> Result<Option<Forecast>, MinerHubError> {
        let forecast = self.forecast_at(now());
        debug!(provider = %self.name, intervals = forecast.intervals.len(), "generated forecast");
        Ok(Some(forecast))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
