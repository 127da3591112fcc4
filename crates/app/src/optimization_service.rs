//! Optimization service — one decision cycle across every enabled unit.
//!
//! Each cycle walks every enabled unit through the same steps:
//!
//! ```text
//! load unit → resolve notifiers → resolve policy → resolve energy source
//!   → resolve energy monitor → fetch energy state → fetch forecasts (optional)
//!   → per miner: fetch live status → persist → build context → decide
//!                → execute → persist + notify
//! ```
//!
//! Units run as independent tasks, and so do the miners of a unit. A failed
//! required step aborts only its unit (or miner), notifies the unit's
//! notifiers and leaves every sibling untouched. Optional inputs (solar
//! forecast, home-load forecast, performance tracker) are logged and left
//! empty in the context. Every adapter call is bounded by
//! [`OptimizationSettings::adapter_timeout`].

pub mod error;
pub mod report;

pub use error::{DeviceError, OptionalData, Requirement, UnitError};
pub use report::{
    CommandOutcome, CycleReport, MinerOutcome, MinerReport, UnitReport, UnitStatus,
};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use minerhub_domain::error::{AdapterError, MinerHubError};
use minerhub_domain::id::{MinerId, PolicyId, UnitId};
use minerhub_domain::miner::{Miner, MinerStatus};
use minerhub_domain::optimization_unit::EnergyOptimizationUnit;
use minerhub_domain::policy::{
    AutomationRule, Decision, DecisionalContext, OptimizationPolicy, RuleEngine,
};
use minerhub_domain::time::now;
use tokio::sync::Mutex;

use crate::adapter_service::{AdapterService, error_chain};
use crate::ports::{
    AdapterConfigRepository, AdapterFactory, EnergySourceRepository, MinerControlPort,
    MinerRepository, NotificationPort, OptimizationUnitRepository, PolicyRepository, SunProvider,
};

/// Default bound on a single adapter call.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning knobs of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationSettings {
    /// Upper bound for every adapter call (reads, commands, notifications).
    pub adapter_timeout: Duration,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }
}

/// The configuration repositories the orchestrator reads and updates.
pub struct Repositories<U, P, M, S> {
    pub units: U,
    pub policies: P,
    pub miners: M,
    pub energy_sources: S,
}

/// Runs optimization cycles.
///
/// `rule_engine` is a prototype: every miner evaluation works on its own
/// clone, so concurrent miners never share loaded rules.
pub struct OptimizationService<U, P, M, S, CR, F, RE> {
    repos: Repositories<U, P, M, S>,
    adapters: Arc<AdapterService<CR, F>>,
    sun: Arc<dyn SunProvider>,
    rule_engine: RE,
    settings: OptimizationSettings,
    cycle_lock: Mutex<()>,
}

/// Everything a unit's miners share during one cycle.
struct UnitRun {
    unit: EnergyOptimizationUnit,
    policy: OptimizationPolicy,
    context: DecisionalContext,
    notifiers: Vec<Arc<dyn NotificationPort>>,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Start,
    Stop,
}

impl Command {
    fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
        }
    }

    fn done_title(self) -> &'static str {
        match self {
            Self::Start => "Started",
            Self::Stop => "Stopped",
        }
    }
}

impl<U, P, M, S, CR, F, RE> OptimizationService<U, P, M, S, CR, F, RE>
where
    U: OptimizationUnitRepository + 'static,
    P: PolicyRepository + 'static,
    M: MinerRepository + 'static,
    S: EnergySourceRepository + 'static,
    CR: AdapterConfigRepository + 'static,
    F: AdapterFactory + 'static,
    RE: RuleEngine + Clone + Send + Sync + 'static,
{
    /// Wire the orchestrator with its collaborators.
    pub fn new(
        repos: Repositories<U, P, M, S>,
        adapters: Arc<AdapterService<CR, F>>,
        sun: Arc<dyn SunProvider>,
        rule_engine: RE,
        settings: OptimizationSettings,
    ) -> Self {
        Self {
            repos,
            adapters,
            sun,
            rule_engine,
            settings,
            cycle_lock: Mutex::new(()),
        }
    }

    /// The adapter service, for cache invalidation after configuration changes.
    #[must_use]
    pub fn adapters(&self) -> &Arc<AdapterService<CR, F>> {
        &self.adapters
    }

    /// Run one cycle over every enabled unit.
    ///
    /// Never fails: unit and miner failures are logged, notified and
    /// recorded in the report. Concurrent calls are serialized, so a slow
    /// cycle delays the next one instead of overlapping with it.
    pub async fn run_all_enabled_units(self: &Arc<Self>) -> CycleReport {
        let _cycle = self.cycle_lock.lock().await;
        let started_at = now();

        let units = match self.repos.units.get_enabled().await {
            Ok(units) => units,
            Err(err) => {
                tracing::error!(
                    error = %error_chain(&err),
                    "cannot load enabled optimization units"
                );
                return CycleReport {
                    started_at,
                    finished_at: now(),
                    units: Vec::new(),
                };
            }
        };
        tracing::debug!(units = units.len(), "optimization cycle started");

        let tasks: Vec<_> = units
            .into_iter()
            .map(|unit| {
                let (unit_id, unit_name) = (unit.id, unit.name.clone());
                let this = Arc::clone(self);
                let handle = tokio::spawn(async move { this.run_unit(unit).await });
                (unit_id, unit_name, handle)
            })
            .collect();

        let mut units = Vec::with_capacity(tasks.len());
        for (unit_id, unit_name, handle) in tasks {
            let report = match handle.await {
                Ok(report) => report,
                Err(err) => {
                    tracing::error!(
                        unit = %unit_name,
                        error = %err,
                        "optimization unit task failed"
                    );
                    UnitReport {
                        unit_id,
                        unit_name,
                        status: UnitStatus::Panicked(err.to_string()),
                        miners: Vec::new(),
                    }
                }
            };
            units.push(report);
        }

        let report = CycleReport {
            started_at,
            finished_at: now(),
            units,
        };
        tracing::info!(
            units = report.units.len(),
            completed = report.completed_units(),
            commands = report.commands_sent(),
            "optimization cycle finished"
        );
        report
    }

    /// Assemble the context unit `unit_id` would be evaluated against right
    /// now, without any miner bound to it.
    ///
    /// # Errors
    ///
    /// Returns the [`UnitError`] that would abort the unit in a cycle.
    pub async fn decisional_context(
        &self,
        unit_id: UnitId,
    ) -> Result<DecisionalContext, UnitError> {
        let unit = self
            .repos
            .units
            .get_by_id(unit_id)
            .await
            .map_err(|err| storage_error(&err))?
            .ok_or(UnitError::ConfigurationUnavailable(Requirement::Unit))?;
        self.build_context(&unit).await
    }

    /// Whether any of `rules` matches `context` under this service's engine.
    #[must_use]
    pub fn test_rules(&self, rules: Vec<AutomationRule>, context: &DecisionalContext) -> bool {
        let mut engine = self.rule_engine.clone();
        engine.load_rules(rules);
        engine.evaluate(context)
    }

    #[tracing::instrument(skip_all, fields(unit = %unit.name))]
    async fn run_unit(self: &Arc<Self>, unit: EnergyOptimizationUnit) -> UnitReport {
        let notifiers = self.adapters.get_notifiers(&unit.notifier_ids).await;
        let mut report = UnitReport {
            unit_id: unit.id,
            unit_name: unit.name.clone(),
            status: UnitStatus::Completed,
            miners: Vec::new(),
        };

        let Some(policy_id) = unit.policy_id else {
            tracing::info!("no policy assigned, skipping");
            report.status = UnitStatus::Skipped("no policy assigned".to_string());
            return report;
        };

        let (policy, context) = match self.prepare(&unit, policy_id).await {
            Ok(prepared) => prepared,
            Err(err) => {
                tracing::error!(error = %err, "optimization unit aborted");
                let title = format!("Optimizer Error ({})", unit.name);
                self.notify(&notifiers, &title, &err.notification()).await;
                report.status = UnitStatus::Aborted(err);
                return report;
            }
        };

        if unit.target_miner_ids.is_empty() {
            tracing::info!("no target miners");
            return report;
        }

        let run = Arc::new(UnitRun {
            unit,
            policy,
            context,
            notifiers,
        });
        let tasks: Vec<_> = run
            .unit
            .target_miner_ids
            .iter()
            .map(|&miner_id| {
                let this = Arc::clone(self);
                let run = Arc::clone(&run);
                let handle = tokio::spawn(async move { this.run_miner(&run, miner_id).await });
                (miner_id, handle)
            })
            .collect();

        for (miner_id, handle) in tasks {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(%miner_id, error = %err, "miner task failed");
                    MinerOutcome::Panicked(err.to_string())
                }
            };
            report.miners.push(MinerReport { miner_id, outcome });
        }
        report
    }

    async fn prepare(
        &self,
        unit: &EnergyOptimizationUnit,
        policy_id: PolicyId,
    ) -> Result<(OptimizationPolicy, DecisionalContext), UnitError> {
        let policy = self
            .repos
            .policies
            .get_by_id(policy_id)
            .await
            .map_err(|err| storage_error(&err))?
            .ok_or(UnitError::ConfigurationUnavailable(Requirement::Policy))?;
        let context = self.build_context(unit).await?;
        Ok((policy, context))
    }

    async fn build_context(
        &self,
        unit: &EnergyOptimizationUnit,
    ) -> Result<DecisionalContext, UnitError> {
        let source = match unit.energy_source_id {
            Some(id) => self
                .repos
                .energy_sources
                .get_by_id(id)
                .await
                .map_err(|err| storage_error(&err))?,
            None => None,
        }
        .ok_or(UnitError::ConfigurationUnavailable(
            Requirement::EnergySource,
        ))?;

        let monitor = self
            .adapters
            .get_energy_monitor(&source)
            .await
            .ok_or(UnitError::ConfigurationUnavailable(
                Requirement::EnergyMonitor,
            ))?;
        let energy_state = match self
            .bounded("current energy state", monitor.current_energy_state())
            .await
        {
            Ok(Some(state)) => state,
            Ok(None) => return Err(UnitError::DataUnavailable { reason: None }),
            Err(err) => {
                return Err(UnitError::DataUnavailable {
                    reason: Some(error_chain(&err)),
                });
            }
        };

        let forecast = match self.adapters.get_forecast_provider(&source).await {
            Some(provider) => {
                self.optional(OptionalData::SolarForecast, provider.forecast())
                    .await
            }
            None => None,
        };

        let home_provider = match unit.home_forecast_provider_id {
            Some(id) => self.adapters.get_home_forecast_provider(id).await,
            None => None,
        };
        let home_load_forecast = match home_provider {
            Some(provider) => {
                self.optional(
                    OptionalData::HomeLoadForecast,
                    provider.home_consumption_forecast(),
                )
                .await
            }
            None => None,
        };

        let tracker = match unit.performance_tracker_id {
            Some(id) => self.adapters.get_performance_tracker(id).await,
            None => None,
        };
        let tracker_current_hashrate = match tracker {
            Some(tracker) => {
                self.optional(
                    OptionalData::PerformanceTracker,
                    tracker.current_hashrate(&unit.target_miner_ids),
                )
                .await
            }
            None => None,
        };

        let timestamp = now();
        DecisionalContext::builder()
            .energy_source(source)
            .energy_state(energy_state)
            .forecast(forecast)
            .home_load_forecast(home_load_forecast)
            .tracker_current_hashrate(tracker_current_hashrate)
            .sun(self.sun.sun(timestamp))
            .timestamp(timestamp)
            .build()
            .map_err(|err| UnitError::DataUnavailable {
                reason: Some(error_chain(&err)),
            })
    }

    #[tracing::instrument(skip_all, fields(miner_id = %miner_id))]
    async fn run_miner(&self, run: &UnitRun, miner_id: MinerId) -> MinerOutcome {
        let unit_name = &run.unit.name;
        let miner = match self.load_miner(miner_id).await {
            Ok(miner) => miner,
            Err(err) => {
                tracing::error!(error = %err, "miner unavailable");
                let title = format!("Optimizer Error ({unit_name})");
                self.notify(&run.notifiers, &title, &err.notification(unit_name))
                    .await;
                return MinerOutcome::Failed(err);
            }
        };

        if !miner.active {
            tracing::debug!(miner = %miner.name, "miner inactive, skipping");
            return MinerOutcome::Skipped("miner is inactive".to_string());
        }
        if !run.policy.applies_to(miner_id) {
            tracing::debug!(miner = %miner.name, "miner not targeted by the policy, skipping");
            return MinerOutcome::Skipped("policy does not target this miner".to_string());
        }

        let title = format!("Optimizer Error ({unit_name} / {})", miner.name);
        match self.drive_miner(run, miner).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, "miner processing failed");
                self.notify(&run.notifiers, &title, &err.notification(unit_name))
                    .await;
                MinerOutcome::Failed(err)
            }
        }
    }

    async fn load_miner(&self, miner_id: MinerId) -> Result<Miner, DeviceError> {
        self.repos
            .miners
            .get_by_id(miner_id)
            .await
            .map_err(|err| DeviceError::Storage(error_chain(&err)))?
            .ok_or(DeviceError::MinerNotFound(miner_id))
    }

    async fn drive_miner(
        &self,
        run: &UnitRun,
        mut miner: Miner,
    ) -> Result<MinerOutcome, DeviceError> {
        let controller = self
            .adapters
            .get_miner_controller(&miner)
            .await
            .ok_or(DeviceError::ControllerUnavailable)?;

        let status = self
            .bounded("miner status", controller.status(miner.id))
            .await
            .map_err(|err| DeviceError::Status(error_chain(&err)))?;
        let hash_rate = self
            .reading("miner hash rate", controller.hash_rate(miner.id))
            .await;
        let power = self.reading("miner power", controller.power(miner.id)).await;
        miner.update_status(status, hash_rate, power);
        let miner = self
            .repos
            .miners
            .update(miner)
            .await
            .map_err(|err| DeviceError::Storage(error_chain(&err)))?;

        let context = run.context.with_miner(miner.clone());
        let mut engine = self.rule_engine.clone();
        let decision = run.policy.decide_next_action(&context, &mut engine);
        tracing::info!(miner = %miner.name, %status, %decision, "decision taken");

        let command = self
            .execute(run, &miner, controller.as_ref(), decision)
            .await;
        Ok(MinerOutcome::Decided {
            status,
            decision,
            command,
        })
    }

    async fn execute(
        &self,
        run: &UnitRun,
        miner: &Miner,
        controller: &dyn MinerControlPort,
        decision: Decision,
    ) -> CommandOutcome {
        let command = match decision {
            Decision::Start if miner.status != MinerStatus::On => Command::Start,
            Decision::Stop if miner.status == MinerStatus::On => Command::Stop,
            _ => return CommandOutcome::NotNeeded,
        };

        let call = match command {
            Command::Start => controller.start(miner.id),
            Command::Stop => controller.stop(miner.id),
        };
        let outcome = match self.bounded(command.verb(), call).await {
            Ok(true) => CommandOutcome::Succeeded,
            Ok(false) => CommandOutcome::Refused,
            Err(err) => CommandOutcome::Failed(error_chain(&err)),
        };

        let unit_name = &run.unit.name;
        let (title, message) = if outcome == CommandOutcome::Succeeded {
            tracing::info!(miner = %miner.name, command = command.verb(), "command accepted");
            if let Err(err) = self.record_transition(miner.id, command).await {
                tracing::error!(
                    miner = %miner.name,
                    error = %error_chain(&err),
                    "cannot record miner transition"
                );
            }
            (
                format!("Miner {}: {}", command.done_title(), miner.name),
                format!(
                    "Miner {} was {}. (Optimization Unit: {unit_name})",
                    miner.name,
                    command.past()
                ),
            )
        } else {
            tracing::warn!(
                miner = %miner.name,
                command = command.verb(),
                ?outcome,
                "command not applied"
            );
            (
                format!("Miner {} Failed: {}", command.title(), miner.name),
                format!(
                    "Attempt to {} miner {} failed. (Optimization Unit: {unit_name})",
                    command.verb(),
                    miner.name
                ),
            )
        };
        self.notify(&run.notifiers, &title, &message).await;
        outcome
    }

    /// Persist the expected transition (STARTING / STOPPING) after an
    /// accepted command; the next cycle observes the real status.
    async fn record_transition(
        &self,
        miner_id: MinerId,
        command: Command,
    ) -> Result<(), MinerHubError> {
        let Some(mut miner) = self.repos.miners.get_by_id(miner_id).await? else {
            return Ok(());
        };
        match command {
            Command::Start => miner.turn_on(),
            Command::Stop => miner.turn_off(),
        }
        self.repos.miners.update(miner).await?;
        Ok(())
    }

    async fn notify(&self, notifiers: &[Arc<dyn NotificationPort>], title: &str, message: &str) {
        for notifier in notifiers {
            match self.bounded("notification", notifier.send(title, message)).await {
                Ok(true) => tracing::debug!(notifier = notifier.name(), title, "notification sent"),
                Ok(false) => {
                    tracing::warn!(notifier = notifier.name(), title, "notification not accepted");
                }
                Err(err) => {
                    tracing::error!(
                        notifier = notifier.name(),
                        title,
                        error = %error_chain(&err),
                        "notification failed"
                    );
                }
            }
        }
    }

    async fn optional<T>(
        &self,
        data: OptionalData,
        call: impl Future<Output = Result<Option<T>, MinerHubError>>,
    ) -> Option<T> {
        match self.bounded(&data.to_string(), call).await {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                tracing::warn!(%data, "no data, continuing without it");
                None
            }
            Err(err) => {
                tracing::warn!(
                    %data,
                    error = %error_chain(&err),
                    "unavailable, continuing without it"
                );
                None
            }
        }
    }

    async fn reading<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<Option<T>, MinerHubError>>,
    ) -> Option<T> {
        match self.bounded(operation, call).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    operation,
                    error = %error_chain(&err),
                    "reading failed, keeping previous value"
                );
                None
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, MinerHubError>>,
    ) -> Result<T, MinerHubError> {
        tokio::time::timeout(self.settings.adapter_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(AdapterError::Timeout {
                    operation: operation.to_string(),
                }
                .into())
            })
    }
}

fn storage_error(err: &MinerHubError) -> UnitError {
    UnitError::Storage(error_chain(err))
}
