//! In-memory implementation of [`PolicyRepository`].

use std::future::{Future, ready};

use minerhub_app::ports::PolicyRepository;
use minerhub_domain::error::MinerHubError;
use minerhub_domain::id::PolicyId;
use minerhub_domain::policy::OptimizationPolicy;

use crate::table::Table;

fn name(policy: &OptimizationPolicy) -> &str {
    &policy.name
}

/// In-memory policy repository.
pub struct MemoryPolicyRepository {
    policies: Table<PolicyId, OptimizationPolicy>,
}

impl Default for MemoryPolicyRepository {
    fn default() -> Self {
        Self {
            policies: Table::new("OptimizationPolicy"),
        }
    }
}

impl MemoryPolicyRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolicyRepository for MemoryPolicyRepository {
    fn create(
        &self,
        policy: OptimizationPolicy,
    ) -> impl Future<Output = Result<OptimizationPolicy, MinerHubError>> + Send {
        ready(policy.validate().map(|()| {
            self.policies.insert(policy.id, policy.clone());
            policy
        }))
    }

    fn get_by_id(
        &self,
        id: PolicyId,
    ) -> impl Future<Output = Result<Option<OptimizationPolicy>, MinerHubError>> + Send {
        ready(Ok(self.policies.get(&id)))
    }

    fn get_all(
        &self,
    ) -> impl Future<Output = Result<Vec<OptimizationPolicy>, MinerHubError>> + Send {
        ready(Ok(self.policies.all(name)))
    }

    fn update(
        &self,
        policy: OptimizationPolicy,
    ) -> impl Future<Output = Result<OptimizationPolicy, MinerHubError>> + Send {
        let result = policy
            .validate()
            .and_then(|()| self.policies.replace(policy.id, policy.clone()))
            .map(|()| policy);
        ready(result)
    }
}
