//! Cycle scheduler — fires one optimization cycle per interval.
//!
//! A cycle that overruns the interval delays the next tick instead of
//! stacking up missed ones, so cycles never overlap.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use minerhub_domain::policy::RuleEngine;
use tokio::time::MissedTickBehavior;

use crate::optimization_service::{CycleReport, OptimizationService};
use crate::ports::{
    AdapterConfigRepository, AdapterFactory, EnergySourceRepository, MinerRepository,
    OptimizationUnitRepository, PolicyRepository,
};

/// Default time between two cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Something that can run one optimization cycle.
pub trait CycleRunner: Send + Sync {
    fn run_cycle(&self) -> impl Future<Output = CycleReport> + Send;
}

impl<U, P, M, S, CR, F, RE> CycleRunner for Arc<OptimizationService<U, P, M, S, CR, F, RE>>
where
    U: OptimizationUnitRepository + 'static,
    P: PolicyRepository + 'static,
    M: MinerRepository + 'static,
    S: EnergySourceRepository + 'static,
    CR: AdapterConfigRepository + 'static,
    F: AdapterFactory + 'static,
    RE: RuleEngine + Clone + Send + Sync + 'static,
{
    fn run_cycle(&self) -> impl Future<Output = CycleReport> + Send {
        self.run_all_enabled_units()
    }
}

/// Run `runner` every `interval` until `shutdown` completes.
///
/// The first cycle starts immediately. A cycle in progress is never
/// interrupted; shutdown is observed between cycles. Returns the number of
/// cycles run.
pub async fn run_every<R, Sd>(runner: &R, interval: Duration, shutdown: Sd) -> u64
where
    R: CycleRunner,
    Sd: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!(interval_secs = interval.as_secs_f64(), "scheduler started");
    let mut cycles = 0;
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                let report = runner.run_cycle().await;
                cycles += 1;
                let elapsed = report.finished_at - report.started_at;
                tracing::debug!(
                    cycle = cycles,
                    elapsed_ms = elapsed.num_milliseconds(),
                    "cycle done"
                );
            }
        }
    }
    tracing::info!(cycles, "scheduler stopped");
    cycles
}
