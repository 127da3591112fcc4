//! In-memory implementation of [`EnergySourceRepository`].

use std::future::{Future, ready};

use minerhub_app::ports::EnergySourceRepository;
use minerhub_domain::energy::EnergySource;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::id::EnergySourceId;

use crate::table::Table;

fn name(source: &EnergySource) -> &str {
    &source.name
}

/// In-memory energy source repository.
pub struct MemoryEnergySourceRepository {
    sources: Table<EnergySourceId, EnergySource>,
}

impl Default for MemoryEnergySourceRepository {
    fn default() -> Self {
        Self {
            sources: Table::new("EnergySource"),
        }
    }
}

impl MemoryEnergySourceRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnergySourceRepository for MemoryEnergySourceRepository {
    fn create(
        &self,
        source: EnergySource,
    ) -> impl Future<Output = Result<EnergySource, MinerHubError>> + Send {
        ready(source.validate().map(|()| {
            self.sources.insert(source.id, source.clone());
            source
        }))
    }

    fn get_by_id(
        &self,
        id: EnergySourceId,
    ) -> impl Future<Output = Result<Option<EnergySource>, MinerHubError>> + Send {
        ready(Ok(self.sources.get(&id)))
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<EnergySource>, MinerHubError>> + Send {
        ready(Ok(self.sources.all(name)))
    }
}
