//! Rule validation — a full report on a condition tree instead of the first error.
//!
//! Used to check user-authored rules before they are stored. Syntax errors
//! cover structure, operators and values; field errors cover paths.

use minerhub_domain::policy::{
    ConditionNode, LogicalGroup, MAX_CONDITION_DEPTH, Operator, RuleCondition,
    validate_field_path,
};
use serde::Serialize;
use serde_json::Value;

/// Top-level keys of a decisional context that rules may address.
pub const CONTEXT_ROOTS: [&str; 8] = [
    "energy_source",
    "energy_state",
    "forecast",
    "home_load_forecast",
    "tracker_current_hashrate",
    "sun",
    "miner",
    "timestamp",
];

/// Outcome of [`validate_conditions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleValidationReport {
    pub is_valid: bool,
    pub syntax_errors: Vec<String>,
    pub field_errors: Vec<String>,
}

impl RuleValidationReport {
    fn finish(mut self) -> Self {
        self.is_valid = self.syntax_errors.is_empty() && self.field_errors.is_empty();
        self
    }
}

/// Validate a parsed condition tree.
#[must_use]
pub fn validate_conditions(node: &ConditionNode) -> RuleValidationReport {
    let mut report = RuleValidationReport::default();
    if node.depth() > MAX_CONDITION_DEPTH {
        report.syntax_errors.push(format!(
            "conditions are nested deeper than {MAX_CONDITION_DEPTH} levels"
        ));
    }
    walk(node, "$", &mut report);
    report.finish()
}

/// Validate raw JSON, reporting a structural error if it is not a condition tree.
#[must_use]
pub fn validate_conditions_value(value: &Value) -> RuleValidationReport {
    match serde_json::from_value::<ConditionNode>(value.clone()) {
        Ok(node) => validate_conditions(&node),
        Err(_) => RuleValidationReport {
            syntax_errors: vec![format!("invalid condition structure at $: {value}")],
            ..RuleValidationReport::default()
        }
        .finish(),
    }
}

fn walk(node: &ConditionNode, path: &str, report: &mut RuleValidationReport) {
    match node {
        ConditionNode::Condition(condition) => check_leaf(condition, path, report),
        ConditionNode::Group(LogicalGroup::AllOf(children)) => {
            walk_children("all_of", children, path, report);
        }
        ConditionNode::Group(LogicalGroup::AnyOf(children)) => {
            walk_children("any_of", children, path, report);
        }
        ConditionNode::Group(LogicalGroup::Not(child)) => {
            walk(child, &format!("{path}.not"), report);
        }
    }
}

fn walk_children(
    key: &str,
    children: &[ConditionNode],
    path: &str,
    report: &mut RuleValidationReport,
) {
    if children.is_empty() {
        report
            .syntax_errors
            .push(format!("empty {key} group at {path}"));
    }
    for (i, child) in children.iter().enumerate() {
        walk(child, &format!("{path}.{key}[{i}]"), report);
    }
}

fn check_leaf(condition: &RuleCondition, path: &str, report: &mut RuleValidationReport) {
    let field = &condition.field;
    if let Err(err) = validate_field_path(field) {
        report.field_errors.push(format!("{err} at {path}"));
    } else {
        let root = field.split('.').next().unwrap_or_default();
        if !CONTEXT_ROOTS.contains(&root) {
            report
                .field_errors
                .push(format!("unknown context field {root:?} at {path}"));
        }
    }

    let value = &condition.value;
    match &condition.operator {
        Operator::Unknown(name) => {
            report
                .syntax_errors
                .push(format!("invalid operator {name:?} at {path}"));
            return;
        }
        _ if value.is_null() => {
            report.syntax_errors.push(format!("missing value at {path}"));
            return;
        }
        op if op.is_numeric() && !is_numeric(value) => {
            report
                .syntax_errors
                .push(format!("operator {op} needs a numeric value at {path}"));
        }
        op if op.is_membership() && !matches!(value, Value::Array(_) | Value::String(_)) => {
            report
                .syntax_errors
                .push(format!("operator {op} needs a list or a string at {path}"));
        }
        Operator::Regex => {
            let pattern = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            if let Err(err) = regex::Regex::new(&pattern) {
                report
                    .syntax_errors
                    .push(format!("invalid regex pattern at {path}: {err}"));
            }
        }
        _ => {}
    }
    if value.is_object() {
        report
            .syntax_errors
            .push(format!("value at {path} must be a scalar or a list"));
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}
