//! What one optimization cycle did, unit by unit and miner by miner.

use minerhub_domain::id::{MinerId, UnitId};
use minerhub_domain::miner::MinerStatus;
use minerhub_domain::policy::Decision;
use minerhub_domain::time::Timestamp;

use super::error::{DeviceError, UnitError};

/// Outcome of one `run_all_enabled_units` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub units: Vec<UnitReport>,
}

impl CycleReport {
    /// Report of unit `id`, if it ran in this cycle.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitReport> {
        self.units.iter().find(|unit| unit.unit_id == id)
    }

    /// Number of units that went through every miner.
    #[must_use]
    pub fn completed_units(&self) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.status == UnitStatus::Completed)
            .count()
    }

    /// Number of controller commands that were accepted.
    #[must_use]
    pub fn commands_sent(&self) -> usize {
        self.units
            .iter()
            .flat_map(|unit| &unit.miners)
            .filter(|miner| {
                matches!(
                    miner.outcome,
                    MinerOutcome::Decided {
                        command: CommandOutcome::Succeeded,
                        ..
                    }
                )
            })
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub unit_id: UnitId,
    pub unit_name: String,
    pub status: UnitStatus,
    pub miners: Vec<MinerReport>,
}

impl UnitReport {
    /// Report of miner `id`, if it was processed.
    #[must_use]
    pub fn miner(&self, id: MinerId) -> Option<&MinerReport> {
        self.miners.iter().find(|miner| miner.miner_id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Completed,
    /// Nothing to do, e.g. no policy assigned.
    Skipped(String),
    Aborted(UnitError),
    /// The unit task panicked.
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinerReport {
    pub miner_id: MinerId,
    pub outcome: MinerOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MinerOutcome {
    /// The policy was evaluated against the freshly observed status.
    Decided {
        status: MinerStatus,
        decision: Decision,
        command: CommandOutcome,
    },
    Skipped(String),
    Failed(DeviceError),
    Panicked(String),
}

impl MinerOutcome {
    /// The decision taken, if the policy was evaluated.
    #[must_use]
    pub fn decision(&self) -> Option<Decision> {
        match self {
            Self::Decided { decision, .. } => Some(*decision),
            _ => None,
        }
    }
}

/// Result of the controller command issued for a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The decision agreed with the observed status.
    NotNeeded,
    Succeeded,
    /// The controller answered but declined.
    Refused,
    Failed(String),
}
