//! Rule engine — evaluates prioritized automation rules against a context.
//!
//! [`CustomRuleEngine`] is the in-process implementation of the domain
//! [`RuleEngine`] trait. Each load sorts the rules (higher priority first,
//! declaration order for ties) and compiles their regex patterns into a fresh
//! evaluator. A policy decision loads its rule list every time, so patterns
//! are compiled once per decision, not once per process.

pub mod evaluator;
pub mod validation;

pub use evaluator::{ConditionEvaluator, RuleEvaluationError, resolve};
pub use validation::{RuleValidationReport, validate_conditions, validate_conditions_value};

use std::cmp::Reverse;

use minerhub_domain::policy::{AutomationRule, DecisionalContext, RuleEngine};
use serde_json::Value;

/// In-process rule engine backed by [`ConditionEvaluator`].
#[derive(Debug, Clone, Default)]
pub struct CustomRuleEngine {
    rules: Vec<AutomationRule>,
    evaluator: ConditionEvaluator,
}

impl CustomRuleEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[AutomationRule] {
        &self.rules
    }

    /// The first enabled rule matching `context`, in priority order.
    #[must_use]
    pub fn first_match(&self, context: &DecisionalContext) -> Option<&AutomationRule> {
        match context.to_value() {
            Ok(value) => self.first_match_in(&value),
            Err(err) => {
                let err = RuleEvaluationError::Context(err.to_string());
                tracing::error!(error = %err, "cannot evaluate rules");
                None
            }
        }
    }

    /// Same as [`first_match`](Self::first_match) over an arbitrary JSON context.
    #[must_use]
    pub fn first_match_in(&self, context: &Value) -> Option<&AutomationRule> {
        for rule in self.rules.iter().filter(|rule| rule.enabled) {
            match self.evaluator.evaluate(context, &rule.conditions) {
                Ok(true) => {
                    tracing::debug!(rule = %rule.name, priority = rule.priority, "rule matched");
                    return Some(rule);
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(
                        rule = %rule.name,
                        error = %err,
                        "rule evaluation failed, skipping"
                    );
                }
            }
        }
        None
    }
}

impl RuleEngine for CustomRuleEngine {
    fn load_rules(&mut self, mut rules: Vec<AutomationRule>) {
        rules.sort_by_key(|rule| Reverse(rule.priority));
        let mut evaluator = ConditionEvaluator::new();
        for rule in &rules {
            evaluator.prepare(&rule.conditions);
        }
        tracing::debug!(count = rules.len(), "rules loaded");
        self.rules = rules;
        self.evaluator = evaluator;
    }

    fn evaluate(&self, context: &DecisionalContext) -> bool {
        self.first_match(context).is_some()
    }
}
