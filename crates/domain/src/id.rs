//! Identifiers of the configuration entities, one UUID newtype per entity so
//! a miner id can never be passed where a unit id is expected.
//!
//! Ids serialize as their hyphenated UUID string, which is also the form
//! used in configuration files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_ids {
    ($($(#[doc = $doc:expr])* $name:ident;)+) => {$(
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh random (v4) identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    )+};
}

define_ids! {
    /// Identifies a [`Miner`](crate::miner::Miner).
    MinerId;
    /// Identifies an [`EnergySource`](crate::energy::EnergySource).
    EnergySourceId;
    /// Identifies an [`OptimizationPolicy`](crate::policy::OptimizationPolicy).
    PolicyId;
    /// Identifies an [`AutomationRule`](crate::policy::AutomationRule); unique
    /// across both rule lists of a policy.
    RuleId;
    /// Identifies an [`EnergyOptimizationUnit`](crate::optimization_unit::EnergyOptimizationUnit).
    UnitId;
    /// Identifies an [`AdapterConfig`](crate::adapter::AdapterConfig), and
    /// keys the live adapter built from it in the adapter cache.
    AdapterId;
}
