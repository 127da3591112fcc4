//! Virtual miner controller — accepts `start` / `stop` and completes the
//! transition on the next status read.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use minerhub_app::ports::MinerControlPort;
use minerhub_domain::energy::Watts;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::id::MinerId;
use minerhub_domain::miner::{HashRate, MinerStatus};
use tracing::debug;

use super::lock;

/// Power drawn while a miner boots.
const STARTUP_POWER: Watts = 150.0;

/// A simulated controller driving any number of miners.
///
/// Miners it has never seen report `initial_status`.
#[derive(Debug)]
pub struct DummyMinerController {
    name: String,
    initial_status: MinerStatus,
    power_max: Watts,
    hash_rate_max: HashRate,
    statuses: Mutex<HashMap<MinerId, MinerStatus>>,
}

impl DummyMinerController {
    #[must_use]
    pub fn new(name: impl Into<String>, power_max: Watts, hash_rate_max: HashRate) -> Self {
        Self {
            name: name.into(),
            initial_status: MinerStatus::Off,
            power_max,
            hash_rate_max,
            statuses: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_initial_status(mut self, status: MinerStatus) -> Self {
        self.initial_status = status;
        self
    }

    fn current(&self, miner_id: MinerId) -> MinerStatus {
        lock(&self.statuses)
            .get(&miner_id)
            .copied()
            .unwrap_or(self.initial_status)
    }

    fn transition(
        &self,
        miner_id: MinerId,
        next: impl FnOnce(MinerStatus) -> MinerStatus,
    ) -> MinerStatus {
        let mut statuses = lock(&self.statuses);
        let status = statuses.entry(miner_id).or_insert(self.initial_status);
        *status = next(*status);
        *status
    }
}

#[async_trait]
impl MinerControlPort for DummyMinerController {
    async fn status(&self, miner_id: MinerId) -> Result<MinerStatus, MinerHubError> {
        let status = self.transition(miner_id, |status| match status {
            MinerStatus::Starting => MinerStatus::On,
            MinerStatus::Stopping => MinerStatus::Off,
            other => other,
        });
        debug!(controller = %self.name, %miner_id, %status, "reporting status");
        Ok(status)
    }

    async fn power(&self, miner_id: MinerId) -> Result<Option<Watts>, MinerHubError> {
        let power = match self.current(miner_id) {
            MinerStatus::On => self.power_max,
            MinerStatus::Starting => STARTUP_POWER,
            _ => 0.0,
        };
        Ok(Some(power))
    }

    async fn hash_rate(&self, miner_id: MinerId) -> Result<Option<HashRate>, MinerHubError> {
        let hash_rate = if self.current(miner_id) == MinerStatus::On {
            self.hash_rate_max.clone()
        } else {
            HashRate {
                value: 0.0,
                unit: self.hash_rate_max.unit.clone(),
            }
        };
        Ok(Some(hash_rate))
    }

    async fn start(&self, miner_id: MinerId) -> Result<bool, MinerHubError> {
        let status = self.transition(miner_id, |status| {
            if status == MinerStatus::On {
                status
            } else {
                MinerStatus::Starting
            }
        });
        debug!(controller = %self.name, %miner_id, %status, "received start");
        Ok(true)
    }

    async fn stop(&self, miner_id: MinerId) -> Result<bool, MinerHubError> {
        let status = self.transition(miner_id, |status| {
            if status == MinerStatus::On {
                MinerStatus::Stopping
            } else {
                status
            }
        });
        debug!(controller = %self.name, %miner_id, %status, "received stop");
        Ok(true)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
