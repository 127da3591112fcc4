//! In-memory implementation of [`OptimizationUnitRepository`].

use std::future::{Future, ready};

use minerhub_app::ports::OptimizationUnitRepository;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::id::UnitId;
use minerhub_domain::optimization_unit::EnergyOptimizationUnit;

use crate::table::Table;

fn name(unit: &EnergyOptimizationUnit) -> &str {
    &unit.name
}

/// In-memory optimization unit repository.
pub struct MemoryOptimizationUnitRepository {
    units: Table<UnitId, EnergyOptimizationUnit>,
}

impl Default for MemoryOptimizationUnitRepository {
    fn default() -> Self {
        Self {
            units: Table::new("EnergyOptimizationUnit"),
        }
    }
}

impl MemoryOptimizationUnitRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptimizationUnitRepository for MemoryOptimizationUnitRepository {
    fn create(
        &self,
        unit: EnergyOptimizationUnit,
    ) -> impl Future<Output = Result<EnergyOptimizationUnit, MinerHubError>> + Send {
        ready(unit.validate().map(|()| {
            self.units.insert(unit.id, unit.clone());
            unit
        }))
    }

    fn get_by_id(
        &self,
        id: UnitId,
    ) -> impl Future<Output = Result<Option<EnergyOptimizationUnit>, MinerHubError>> + Send {
        ready(Ok(self.units.get(&id)))
    }

    fn get_all(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyOptimizationUnit>, MinerHubError>> + Send {
        ready(Ok(self.units.all(name)))
    }

    fn get_enabled(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyOptimizationUnit>, MinerHubError>> + Send {
        let mut units = self.units.all(name);
        units.retain(|unit| unit.enabled);
        ready(Ok(units))
    }

    fn update(
        &self,
        unit: EnergyOptimizationUnit,
    ) -> impl Future<Output = Result<EnergyOptimizationUnit, MinerHubError>> + Send {
        let result = unit
            .validate()
            .and_then(|()| self.units.replace(unit.id, unit.clone()))
            .map(|()| unit);
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerhub_domain::error::ValidationError;
    use minerhub_domain::id::MinerId;

    fn unit(name: &str, enabled: bool) -> EnergyOptimizationUnit {
        EnergyOptimizationUnit::builder()
            .name(name)
            .enabled(enabled)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_and_get_unit_by_id() {
        let repo = MemoryOptimizationUnitRepository::new();
        let created = repo.create(unit("garage", true)).await.unwrap();
        let found = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn should_return_none_when_unit_is_unknown() {
        let repo = MemoryOptimizationUnitRepository::new();
        assert!(repo.get_by_id(UnitId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_list_only_enabled_units_sorted_by_name() {
        let repo = MemoryOptimizationUnitRepository::new();
        repo.create(unit("shed", true)).await.unwrap();
        repo.create(unit("attic", false)).await.unwrap();
        repo.create(unit("basement", true)).await.unwrap();

        let enabled: Vec<_> = repo
            .get_enabled()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(enabled, vec!["basement", "shed"]);
        assert_eq!(repo.get_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_persist_update() {
        let repo = MemoryOptimizationUnitRepository::new();
        let mut created = repo.create(unit("garage", false)).await.unwrap();
        created.enable();
        created.add_target_miner(MinerId::new());
        repo.update(created.clone()).await.unwrap();

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert!(found.enabled);
        assert_eq!(found.target_miner_ids.len(), 1);
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_unknown_unit() {
        let repo = MemoryOptimizationUnitRepository::new();
        let result = repo.update(unit("ghost", true)).await;
        assert!(matches!(result, Err(MinerHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_reject_invalid_unit_on_create() {
        let repo = MemoryOptimizationUnitRepository::new();
        let mut invalid = unit("garage", true);
        invalid.name.clear();
        let result = repo.create(invalid).await;
        assert!(matches!(
            result,
            Err(MinerHubError::Validation(ValidationError::EmptyName))
        ));
        assert!(repo.get_all().await.unwrap().is_empty());
    }
}
