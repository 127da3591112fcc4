//! Simulated household consumption forecast.

use async_trait::async_trait;
use chrono::TimeDelta;
use minerhub_app::ports::HomeForecastProviderPort;
use minerhub_domain::energy::Watts;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::forecast::ConsumptionForecast;
use minerhub_domain::time::{Timestamp, now};

/// Predicts a flat household load for the next `hours` hours.
#[derive(Debug)]
pub struct DummyHomeForecastProvider {
    name: String,
    load_power: Watts,
    hours: u32,
}

impl DummyHomeForecastProvider {
    #[must_use]
    pub fn new(name: impl Into<String>, load_power: Watts, hours: u32) -> Self {
        Self {
            name: name.into(),
            load_power,
            hours,
        }
    }

    #[must_use]
    pub fn forecast_at(&self, at: Timestamp) -> ConsumptionForecast {
        ConsumptionForecast {
            predicted_watts: (0..self.hours)
                .map(|hour| (at + TimeDelta::hours(i64::from(hour)), self.load_power))
                .collect(),
            generated_at: Some(at),
        }
    }
}

#[async_trait]
impl HomeForecastProviderPort for DummyHomeForecastProvider {
    async fn home_consumption_forecast(
        &self,
    ) -> Result<Option<ConsumptionForecast>, MinerHubError> {
        Ok(Some(self.forecast_at(now())))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
