//! Automation rule — a named, prioritized condition tree bound to an action.

use serde::{Deserialize, Serialize};

use super::condition::ConditionNode;
use super::decision::Decision;
use crate::error::{MinerHubError, ValidationError};
use crate::id::RuleId;

/// A rule inside a policy's start or stop list.
///
/// Higher `priority` is evaluated first; ties keep declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    #[serde(default)]
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub conditions: ConditionNode,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub action: Decision,
}

fn default_enabled() -> bool {
    true
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder() -> AutomationRuleBuilder {
        AutomationRuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - the condition tree is malformed (see [`ConditionNode::validate`])
    pub fn validate(&self) -> Result<(), MinerHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.conditions.validate()?;
        Ok(())
    }
}

/// Step-by-step builder for [`AutomationRule`].
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    description: Option<String>,
    conditions: Option<ConditionNode>,
    priority: i32,
    enabled: Option<bool>,
    action: Option<Decision>,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
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
    pub fn conditions(mut self, conditions: impl Into<ConditionNode>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Decision) -> Self {
        self.action = Some(action);
        self
    }

    /// Consume the builder, validate, and return an [`AutomationRule`].
    ///
    /// # Errors
    ///
    /// Returns [`MinerHubError::Validation`] if conditions or action are
    /// missing, or if the rule fails [`AutomationRule::validate`].
    pub fn build(self) -> Result<AutomationRule, MinerHubError> {
        let conditions = self
            .conditions
            .ok_or(ValidationError::MissingField("conditions"))?;
        let action = self.action.ok_or(ValidationError::MissingField("action"))?;
        let rule = AutomationRule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            conditions,
            priority: self.priority,
            enabled: self.enabled.unwrap_or(true),
            action,
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::condition::{Operator, RuleCondition};

    fn condition() -> RuleCondition {
        RuleCondition::new("energy_state.production", Operator::Gt, 1000)
    }

    #[test]
    fn should_build_enabled_rule_with_zero_priority_by_default() {
        let rule = AutomationRule::builder()
            .name("sunny")
            .conditions(condition())
            .action(Decision::Start)
            .build()
            .unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.priority, 0);
    }

    #[test]
    fn should_return_missing_field_when_action_absent() {
        let result = AutomationRule::builder()
            .name("sunny")
            .conditions(condition())
            .build();
        assert!(matches!(
            result,
            Err(MinerHubError::Validation(ValidationError::MissingField("action")))
        ));
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = AutomationRule::builder()
            .conditions(condition())
            .action(Decision::Start)
            .build();
        assert!(matches!(
            result,
            Err(MinerHubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_malformed_conditions() {
        let result = AutomationRule::builder()
            .name("broken")
            .conditions(ConditionNode::any_of(vec![]))
            .action(Decision::Stop)
            .build();
        assert!(matches!(
            result,
            Err(MinerHubError::Validation(ValidationError::EmptyGroup))
        ));
    }

    #[test]
    fn should_deserialize_with_defaults() {
        let rule: AutomationRule = serde_json::from_value(serde_json::json!({
            "name": "low battery",
            "conditions": {
                "field": "energy_state.battery.state_of_charge",
                "operator": "lt",
                "value": 20
            },
            "action": "stop"
        }))
        .unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.priority, 0);
        assert_eq!(rule.action, Decision::Stop);
    }
}
