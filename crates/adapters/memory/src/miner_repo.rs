//! In-memory implementation of [`MinerRepository`].

use std::future::{Future, ready};

use minerhub_app::ports::MinerRepository;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::id::MinerId;
use minerhub_domain::miner::Miner;

use crate::table::Table;

fn name(miner: &Miner) -> &str {
    &miner.name
}

/// In-memory miner repository.
pub struct MemoryMinerRepository {
    miners: Table<MinerId, Miner>,
}

impl Default for MemoryMinerRepository {
    fn default() -> Self {
        Self {
            miners: Table::new("Miner"),
        }
    }
}

impl MemoryMinerRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MinerRepository for MemoryMinerRepository {
    fn create(&self, miner: Miner) -> impl Future<Output = Result<Miner, MinerHubError>> + Send {
        ready(miner.validate().map(|()| {
            self.miners.insert(miner.id, miner.clone());
            miner
        }))
    }

    fn get_by_id(
        &self,
        id: MinerId,
    ) -> impl Future<Output = Result<Option<Miner>, MinerHubError>> + Send {
        ready(Ok(self.miners.get(&id)))
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Miner>, MinerHubError>> + Send {
        ready(Ok(self.miners.all(name)))
    }

    fn update(&self, miner: Miner) -> impl Future<Output = Result<Miner, MinerHubError>> + Send {
        let result = miner
            .validate()
            .and_then(|()| self.miners.replace(miner.id, miner.clone()))
            .map(|()| miner);
        ready(result)
    }
}
