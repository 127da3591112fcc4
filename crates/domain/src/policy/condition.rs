//! Condition trees — leaf comparisons combined with `all_of` / `any_of` / `not`.
//!
//! Wire shape:
//!
//! ```json
//! {"all_of": [
//!     {"field": "energy_state.battery.state_of_charge", "operator": "gt", "value": 70},
//!     {"not": {"field": "miner.status", "operator": "eq", "value": "error"}}
//! ]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Deepest nesting of logical groups accepted in a rule.
pub const MAX_CONDITION_DEPTH: usize = 10;

/// Comparison applied between the resolved field and the condition value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
    /// Kept so stored rules with an unrecognized operator still load; never matches.
    Unknown(String),
}

impl Operator {
    /// Every operator the evaluator understands.
    pub const ALL: [Self; 12] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::NotIn,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Regex,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Regex => "regex",
            Self::Unknown(name) => name,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }

    #[must_use]
    pub fn is_membership(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        let lowered = value.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == lowered)
            .unwrap_or(Self::Unknown(value))
    }
}

impl From<&str> for Operator {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf comparison: `<field> <operator> <value>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Dotted path into the decisional context, e.g. `energy_state.production`.
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl RuleCondition {
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Check the field path, operator and value shape.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_field_path(&self.field)?;
        if let Operator::Unknown(name) = &self.operator {
            return Err(ValidationError::UnknownOperator(name.clone()));
        }
        let scalar = |v: &Value| !matches!(v, Value::Object(_) | Value::Array(_));
        let value_ok = match &self.value {
            Value::Array(items) => items.iter().all(scalar),
            other => scalar(other),
        };
        if !value_ok {
            return Err(ValidationError::InvalidConditionValue {
                field: self.field.clone(),
            });
        }
        Ok(())
    }
}

/// Logical combination of child nodes. Exactly one branch per node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalGroup {
    AllOf(Vec<ConditionNode>),
    AnyOf(Vec<ConditionNode>),
    Not(Box<ConditionNode>),
}

/// A node of a condition tree: either a group or a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Group(LogicalGroup),
    Condition(RuleCondition),
}

impl ConditionNode {
    #[must_use]
    pub fn all_of(children: Vec<ConditionNode>) -> Self {
        Self::Group(LogicalGroup::AllOf(children))
    }

    #[must_use]
    pub fn any_of(children: Vec<ConditionNode>) -> Self {
        Self::Group(LogicalGroup::AnyOf(children))
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: ConditionNode) -> Self {
        Self::Group(LogicalGroup::Not(Box::new(child)))
    }

    /// Number of group levels above the deepest leaf (a bare leaf is `0`).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Condition(_) => 0,
            Self::Group(LogicalGroup::AllOf(children) | LogicalGroup::AnyOf(children)) => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
            Self::Group(LogicalGroup::Not(child)) => 1 + child.depth(),
        }
    }

    /// Every leaf of the tree, depth first.
    #[must_use]
    pub fn leaves(&self) -> Vec<&RuleCondition> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a RuleCondition>) {
        match self {
            Self::Condition(condition) => out.push(condition),
            Self::Group(LogicalGroup::AllOf(children) | LogicalGroup::AnyOf(children)) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            Self::Group(LogicalGroup::Not(child)) => child.collect_leaves(out),
        }
    }

    /// Validate the whole tree once, at load time.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found: nesting deeper than
    /// [`MAX_CONDITION_DEPTH`], an empty group, or an invalid leaf.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.depth() > MAX_CONDITION_DEPTH {
            return Err(ValidationError::NestingTooDeep {
                max: MAX_CONDITION_DEPTH,
            });
        }
        self.validate_node()
    }

    fn validate_node(&self) -> Result<(), ValidationError> {
        match self {
            Self::Condition(condition) => condition.validate(),
            Self::Group(LogicalGroup::AllOf(children) | LogicalGroup::AnyOf(children)) => {
                if children.is_empty() {
                    return Err(ValidationError::EmptyGroup);
                }
                children.iter().try_for_each(Self::validate_node)
            }
            Self::Group(LogicalGroup::Not(child)) => child.validate_node(),
        }
    }
}

impl From<RuleCondition> for ConditionNode {
    fn from(value: RuleCondition) -> Self {
        Self::Condition(value)
    }
}

/// Check that `path` is a non-empty dotted path of `[A-Za-z0-9_]` segments.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyFieldPath`] or [`ValidationError::InvalidFieldPath`].
pub fn validate_field_path(path: &str) -> Result<(), ValidationError> {
    if path.trim().is_empty() {
        return Err(ValidationError::EmptyFieldPath);
    }
    let valid = path.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if !valid {
        return Err(ValidationError::InvalidFieldPath(path.to_string()));
    }
    Ok(())
}
