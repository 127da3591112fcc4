//! In-memory implementation of [`AdapterConfigRepository`].

use std::future::{Future, ready};

use minerhub_app::ports::AdapterConfigRepository;
use minerhub_domain::adapter::AdapterConfig;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::id::AdapterId;

use crate::table::Table;

fn name(config: &AdapterConfig) -> &str {
    &config.name
}

/// In-memory adapter configuration repository.
pub struct MemoryAdapterConfigRepository {
    configs: Table<AdapterId, AdapterConfig>,
}

impl Default for MemoryAdapterConfigRepository {
    fn default() -> Self {
        Self {
            configs: Table::new("AdapterConfig"),
        }
    }
}

impl MemoryAdapterConfigRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AdapterConfigRepository for MemoryAdapterConfigRepository {
    fn create(
        &self,
        config: AdapterConfig,
    ) -> impl Future<Output = Result<AdapterConfig, MinerHubError>> + Send {
        ready(config.validate().map(|()| {
            self.configs.insert(config.id, config.clone());
            config
        }))
    }

    fn get_by_id(
        &self,
        id: AdapterId,
    ) -> impl Future<Output = Result<Option<AdapterConfig>, MinerHubError>> + Send {
        ready(Ok(self.configs.get(&id)))
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<AdapterConfig>, MinerHubError>> + Send {
        ready(Ok(self.configs.all(name)))
    }
}
