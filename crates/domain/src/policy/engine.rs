use super::context::DecisionalContext;
use super::rule::AutomationRule;

/// Evaluates a loaded rule set against a decisional context.
///
/// Implementations evaluate enabled rules by descending priority (stable
/// for ties) and stop at the first match. A rule that fails to evaluate
/// counts as a non-match and must not prevent later rules from running.
pub trait RuleEngine {
    /// Replace the active rule set.
    fn load_rules(&mut self, rules: Vec<AutomationRule>);

    /// Whether any loaded rule matches `context`.
    fn evaluate(&self, context: &DecisionalContext) -> bool;
}
