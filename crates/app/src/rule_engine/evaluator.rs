//! Condition evaluator — applies a condition tree to the JSON form of a context.
//!
//! Evaluation is a pure function of `(context, tree)`. A leaf never fails:
//! a missing or `null` field, a failed numeric coercion, a non-collection
//! membership target, an invalid pattern or an unknown operator all yield
//! `false`. Only a tree nested deeper than [`MAX_CONDITION_DEPTH`] is an
//! error, and the caller treats it as a non-match.
//!
//! Values follow JSON semantics:
//!
//! - `eq`/`ne`/`in` compare numbers by value (`1 == 1.0`) and everything else
//!   structurally, so `true` never equals `1` and `"5"` never equals `5`.
//! - `gt`/`gte`/`lt`/`lte` coerce both sides to a number first: numeric
//!   strings parse, and `true`/`false` count as `1`/`0`.
//! - `contains`, `starts_with`, `ends_with` and `regex` work on text. Strings
//!   are used as-is; other values use their JSON form, so a boolean reads
//!   `"true"`.

use std::borrow::Cow;
use std::collections::HashMap;

use minerhub_domain::policy::{
    ConditionNode, LogicalGroup, MAX_CONDITION_DEPTH, Operator, RuleCondition,
};
use regex::Regex;
use serde_json::Value;

/// Why a whole rule could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleEvaluationError {
    #[error("condition tree is nested deeper than {max} levels")]
    DepthExceeded { max: usize },

    #[error("decisional context could not be serialized: {0}")]
    Context(String),
}

/// Evaluates condition trees, with regex patterns compiled ahead of time.
#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluator {
    patterns: HashMap<String, Regex>,
}

impl ConditionEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every `regex` pattern in `node` so evaluation does not have to.
    ///
    /// Invalid patterns are logged and left out; they never match.
    pub fn prepare(&mut self, node: &ConditionNode) {
        for leaf in node.leaves() {
            if leaf.operator != Operator::Regex {
                continue;
            }
            let pattern = stringify(&leaf.value).into_owned();
            if self.patterns.contains_key(&pattern) {
                continue;
            }
            match compile(&pattern) {
                Ok(regex) => {
                    self.patterns.insert(pattern, regex);
                }
                Err(err) => {
                    tracing::warn!(
                        field = %leaf.field,
                        %pattern,
                        error = %err,
                        "invalid regex pattern"
                    );
                }
            }
        }
    }

    /// Evaluate `node` against `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleEvaluationError::DepthExceeded`] when groups nest deeper
    /// than [`MAX_CONDITION_DEPTH`].
    pub fn evaluate(
        &self,
        context: &Value,
        node: &ConditionNode,
    ) -> Result<bool, RuleEvaluationError> {
        self.evaluate_node(context, node, 0)
    }

    fn evaluate_node(
        &self,
        context: &Value,
        node: &ConditionNode,
        depth: usize,
    ) -> Result<bool, RuleEvaluationError> {
        let group = match node {
            ConditionNode::Condition(condition) => {
                return Ok(self.evaluate_leaf(context, condition));
            }
            ConditionNode::Group(group) => group,
        };
        if depth >= MAX_CONDITION_DEPTH {
            return Err(RuleEvaluationError::DepthExceeded {
                max: MAX_CONDITION_DEPTH,
            });
        }
        match group {
            LogicalGroup::AllOf(children) => {
                if children.is_empty() {
                    return Ok(false);
                }
                for child in children {
                    if !self.evaluate_node(context, child, depth + 1)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicalGroup::AnyOf(children) => {
                for child in children {
                    if self.evaluate_node(context, child, depth + 1)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            LogicalGroup::Not(child) => Ok(!self.evaluate_node(context, child, depth + 1)?),
        }
    }

    fn evaluate_leaf(&self, context: &Value, condition: &RuleCondition) -> bool {
        let Some(actual) = resolve(context, &condition.field) else {
            tracing::debug!(field = %condition.field, "field not found in context");
            return false;
        };
        let expected = &condition.value;
        match &condition.operator {
            Operator::Eq => values_equal(actual, expected),
            Operator::Ne => !values_equal(actual, expected),
            Operator::Gt => compare(actual, expected, |a, b| a > b),
            Operator::Gte => compare(actual, expected, |a, b| a >= b),
            Operator::Lt => compare(actual, expected, |a, b| a < b),
            Operator::Lte => compare(actual, expected, |a, b| a <= b),
            Operator::In => membership(actual, expected).unwrap_or(false),
            Operator::NotIn => membership(actual, expected).is_some_and(|found| !found),
            Operator::Contains => stringify(actual).contains(&*stringify(expected)),
            Operator::StartsWith => stringify(actual).starts_with(&*stringify(expected)),
            Operator::EndsWith => stringify(actual).ends_with(&*stringify(expected)),
            Operator::Regex => self.matches_pattern(actual, expected),
            Operator::Unknown(name) => {
                tracing::warn!(field = %condition.field, operator = %name, "unknown operator");
                false
            }
        }
    }

    fn matches_pattern(&self, actual: &Value, pattern: &Value) -> bool {
        let pattern = stringify(pattern);
        let haystack = stringify(actual);
        if let Some(regex) = self.patterns.get(&*pattern) {
            return regex.is_match(&haystack);
        }
        match compile(&pattern) {
            Ok(regex) => regex.is_match(&haystack),
            Err(err) => {
                tracing::warn!(%pattern, error = %err, "invalid regex pattern");
                false
            }
        }
    }
}

/// Walk a dotted path through objects (by key) and arrays (by index).
///
/// Returns `None` when any segment is missing or the value is `null`.
#[must_use]
pub fn resolve<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(context, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .filter(|value| !value.is_null())
}

/// Patterns match from the start of the value, not anywhere inside it.
fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn compare(actual: &Value, expected: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

/// `Some(found)` when `collection` can hold `item`, `None` otherwise.
fn membership(item: &Value, collection: &Value) -> Option<bool> {
    match (collection, item) {
        (Value::Array(items), _) => Some(items.iter().any(|c| values_equal(item, c))),
        (Value::String(haystack), Value::String(needle)) => {
            Some(haystack.contains(needle.as_str()))
        }
        _ => None,
    }
}

fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}
