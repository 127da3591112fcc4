//! Policy — prioritized start/stop rules deciding what a miner should do.
//!
//! A policy holds two rule lists. Which list is consulted depends on the
//! miner's current status; in-flight transitions are never pre-empted:
//!
//! | Miner status | Rules consulted | First match | No match |
//! |--------------|-----------------|-------------|----------|
//! | `off`, `error`, `unknown` | `start_rules` | `Start` | `Maintain` |
//! | `on` | `stop_rules` | `Stop` | `Maintain` |
//! | `starting`, `stopping` | none | | `Maintain` |

mod condition;
mod context;
mod decision;
mod engine;
mod rule;

pub use condition::{
    ConditionNode, LogicalGroup, MAX_CONDITION_DEPTH, Operator, RuleCondition,
    validate_field_path,
};
pub use context::{DecisionalContext, DecisionalContextBuilder};
pub use decision::Decision;
pub use engine::RuleEngine;
pub use rule::{AutomationRule, AutomationRuleBuilder};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{MinerHubError, ValidationError};
use crate::id::{MinerId, PolicyId};
use crate::miner::MinerStatus;

/// Named set of start and stop rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationPolicy {
    pub id: PolicyId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_rules: Vec<AutomationRule>,
    #[serde(default)]
    pub stop_rules: Vec<AutomationRule>,
    /// Miners this policy may drive. Empty means every miner of the unit.
    #[serde(default)]
    pub target_miner_ids: Vec<MinerId>,
}

impl OptimizationPolicy {
    /// Create a builder for constructing an [`OptimizationPolicy`].
    #[must_use]
    pub fn builder() -> OptimizationPolicyBuilder {
        OptimizationPolicyBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - a rule id appears twice across both lists ([`ValidationError::DuplicateRuleId`])
    /// - a rule name appears twice ([`ValidationError::DuplicateRuleName`])
    /// - a start rule does not carry `start`, or a stop rule `stop`
    ///   ([`ValidationError::RuleActionMismatch`])
    /// - any rule fails [`AutomationRule::validate`]
    pub fn validate(&self) -> Result<(), MinerHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        let lists = [
            ("start", Decision::Start, &self.start_rules),
            ("stop", Decision::Stop, &self.stop_rules),
        ];
        for (list, expected, rules) in lists {
            for rule in rules {
                if !ids.insert(rule.id) {
                    return Err(ValidationError::DuplicateRuleId(rule.id.to_string()).into());
                }
                if !names.insert(rule.name.as_str()) {
                    return Err(ValidationError::DuplicateRuleName(rule.name.clone()).into());
                }
                if rule.action != expected {
                    return Err(ValidationError::RuleActionMismatch {
                        rule: rule.name.clone(),
                        action: rule.action.to_string(),
                        list,
                    }
                    .into());
                }
                rule.validate()?;
            }
        }
        Ok(())
    }

    /// Whether this policy may drive `miner_id`.
    #[must_use]
    pub fn applies_to(&self, miner_id: MinerId) -> bool {
        self.target_miner_ids.is_empty() || self.target_miner_ids.contains(&miner_id)
    }

    /// Decide what the context's miner should do next.
    ///
    /// The list matching the miner's status is loaded into `engine` on every
    /// call, so any preparation the engine does at load time (such as
    /// compiling patterns) happens once per decision.
    ///
    /// Without a miner in the context the answer is always [`Decision::Maintain`].
    pub fn decide_next_action<E>(&self, context: &DecisionalContext, engine: &mut E) -> Decision
    where
        E: RuleEngine + ?Sized,
    {
        let Some(miner) = &context.miner else {
            return Decision::Maintain;
        };
        let (rules, on_match) = match miner.status {
            status if status.can_start() => (&self.start_rules, Decision::Start),
            MinerStatus::On => (&self.stop_rules, Decision::Stop),
            _ => return Decision::Maintain,
        };
        engine.load_rules(rules.clone());
        if engine.evaluate(context) {
            on_match
        } else {
            Decision::Maintain
        }
    }
}

/// Step-by-step builder for [`OptimizationPolicy`].
#[derive(Debug, Default)]
pub struct OptimizationPolicyBuilder {
    id: Option<PolicyId>,
    name: Option<String>,
    description: Option<String>,
    start_rules: Vec<AutomationRule>,
    stop_rules: Vec<AutomationRule>,
    target_miner_ids: Vec<MinerId>,
}

impl OptimizationPolicyBuilder {
    #[must_use]
    pub fn id(mut self, id: PolicyId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn start_rule(mut self, rule: AutomationRule) -> Self {
        self.start_rules.push(rule);
        self
    }

    #[must_use]
    pub fn stop_rule(mut self, rule: AutomationRule) -> Self {
        self.stop_rules.push(rule);
        self
    }

    #[must_use]
    pub fn target_miner(mut self, id: MinerId) -> Self {
        self.target_miner_ids.push(id);
        self
    }

    /// Consume the builder, validate, and return an [`OptimizationPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] if the policy fails
    /// [`OptimizationPolicy::validate`].
    pub fn build(self) -> Result<OptimizationPolicy, MinerHubError> {
        let policy = OptimizationPolicy {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            start_rules: self.start_rules,
            stop_rules: self.stop_rules,
            target_miner_ids: self.target_miner_ids,
        };
        policy.validate()?;
        Ok(policy)
    }
}
