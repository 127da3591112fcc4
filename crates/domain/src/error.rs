//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into the base
//! [`MinerHubError`] via `#[from]` (no `String` variants at this level).

use crate::adapter::AdapterKind;

/// Base error for every fallible operation crossing a port boundary.
#[derive(Debug, thiserror::Error)]
pub enum MinerHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("entity not found")]
    NotFound(#[from] NotFoundError),

    #[error("adapter error")]
    Adapter(#[from] AdapterError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("field path must not be empty")]
    EmptyFieldPath,

    #[error("field path {0:?} contains invalid characters")]
    InvalidFieldPath(String),

    #[error("unknown operator {0:?}")]
    UnknownOperator(String),

    #[error("condition value for {field:?} must be a scalar or a list of scalars")]
    InvalidConditionValue { field: String },

    #[error("logical group must contain at least one condition")]
    EmptyGroup,

    #[error("condition tree is nested deeper than {max} levels")]
    NestingTooDeep { max: usize },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("rule id {0} appears more than once in the policy")]
    DuplicateRuleId(String),

    #[error("rule name {0:?} appears more than once in the policy")]
    DuplicateRuleName(String),

    #[error("rule {rule:?} has action {action} but is listed as a {list} rule")]
    RuleActionMismatch {
        rule: String,
        action: String,
        list: &'static str,
    },
}

/// A lookup by id found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure to build or talk to a live adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("unsupported {kind} adapter type {adapter_type:?}")]
    Unsupported {
        kind: AdapterKind,
        adapter_type: String,
    },

    #[error("adapter {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: String,
        expected: AdapterKind,
        actual: AdapterKind,
    },

    #[error("invalid configuration for adapter {name:?}: {reason}")]
    InvalidConfig { name: String, reason: String },

    #[error("{operation} timed out")]
    Timeout { operation: String },

    #[error("adapter IO failed: {0}")]
    Io(String),
}
