//! Simulated pool-side performance tracker.

use async_trait::async_trait;
use minerhub_app::ports::PerformanceTrackerPort;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::id::MinerId;
use minerhub_domain::miner::HashRate;

/// Reports a fixed hash rate for every tracked miner.
#[derive(Debug)]
pub struct DummyPerformanceTracker {
    name: String,
    per_miner: HashRate,
}

impl DummyPerformanceTracker {
    #[must_use]
    pub fn new(name: impl Into<String>, per_miner: HashRate) -> Self {
        Self {
            name: name.into(),
            per_miner,
        }
    }
}

#[async_trait]
impl PerformanceTrackerPort for DummyPerformanceTracker {
    #[allow(clippy::cast_precision_loss)]
    async fn current_hashrate(
        &self,
        miner_ids: &[MinerId],
    ) -> Result<Option<HashRate>, MinerHubError> {
        if miner_ids.is_empty() {
            return Ok(None);
        }
        Ok(Some(HashRate {
            value: self.per_miner.value * miner_ids.len() as f64,
            unit: self.per_miner.unit.clone(),
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
