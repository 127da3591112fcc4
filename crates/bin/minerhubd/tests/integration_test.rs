//! End-to-end cycles through the in-memory repositories and the virtual
//! adapters, wired the way the daemon wires them.

use std::time::Duration;

use minerhub_app::optimization_service::{CommandOutcome, MinerOutcome, UnitStatus};
use minerhub_app::scheduler::run_every;
use minerhub_domain::adapter::{AdapterConfig, AdapterKind};
use minerhub_domain::energy::EnergySource;
use minerhub_domain::miner::{Miner, MinerStatus};
use minerhub_domain::optimization_unit::EnergyOptimizationUnit;
use minerhub_domain::policy::{
    AutomationRule, Decision, Operator, OptimizationPolicy, RuleCondition,
};
use minerhubd::bootstrap;
use minerhubd::config::Config;

const EXAMPLE: &str = include_str!("../minerhub.example.toml");

fn rule(name: &str, status: &str, action: Decision) -> AutomationRule {
    AutomationRule::builder()
        .name(name)
        .conditions(RuleCondition::new("miner.status", Operator::Eq, status))
        .action(action)
        .build()
        .unwrap()
}

/// One unit whose policy starts any stopped miner and stops any running one,
/// so decisions do not depend on the simulated time of day.
fn toggling_config() -> (Config, Miner) {
    let monitor = AdapterConfig::new("monitor", AdapterKind::EnergyMonitor, "dummy_solar");
    let controller = AdapterConfig::new("controller", AdapterKind::MinerController, "dummy");
    let notifier = AdapterConfig::new("console", AdapterKind::Notifier, "log");

    let source = EnergySource::builder()
        .name("PV")
        .nominal_power_max(6000.0)
        .energy_monitor(monitor.id)
        .build()
        .unwrap();
    let miner = Miner::builder()
        .name("S19")
        .power_consumption_max(3250.0)
        .controller(controller.id)
        .build()
        .unwrap();
    let policy = OptimizationPolicy::builder()
        .name("toggle")
        .start_rule(rule("when off", "off", Decision::Start))
        .stop_rule(rule("when on", "on", Decision::Stop))
        .build()
        .unwrap();
    let unit = EnergyOptimizationUnit::builder()
        .name("rack")
        .enabled(true)
        .policy(policy.id)
        .energy_source(source.id)
        .target_miner(miner.id)
        .notifier(notifier.id)
        .build()
        .unwrap();

    let config = Config {
        adapters: vec![monitor, controller, notifier],
        energy_sources: vec![source],
        miners: vec![miner.clone()],
        policies: vec![policy],
        units: vec![unit],
        ..Config::default()
    };
    (config, miner)
}

#[test]
fn should_load_example_config() {
    let config = Config::from_toml(EXAMPLE).unwrap();
    config.validate().unwrap();

    assert_eq!(config.adapters.len(), 6);
    assert_eq!(config.miners.len(), 2);
    assert_eq!(config.policies[0].start_rules.len(), 1);
    assert_eq!(config.policies[0].stop_rules.len(), 1);
    assert!(config.units[0].enabled);
    assert_eq!(config.units[0].target_miner_ids.len(), 2);
}

#[tokio::test]
async fn should_decide_for_every_miner_of_example_installation() {
    let config = Config::from_toml(EXAMPLE).unwrap();
    let optimizer = bootstrap::build(&config).await.unwrap();

    let report = optimizer.run_all_enabled_units().await;

    assert_eq!(report.units.len(), 1);
    let unit = &report.units[0];
    assert_eq!(unit.status, UnitStatus::Completed);
    assert_eq!(unit.miners.len(), 2);
    for miner in &unit.miners {
        assert!(miner.outcome.decision().is_some(), "{:?}", miner.outcome);
    }
}

#[tokio::test]
async fn should_start_then_stop_miner_across_cycles() {
    let (config, miner) = toggling_config();
    let optimizer = bootstrap::build(&config).await.unwrap();

    let first = optimizer.run_all_enabled_units().await;
    let outcome = &first.units[0].miner(miner.id).unwrap().outcome;
    assert_eq!(
        *outcome,
        MinerOutcome::Decided {
            status: MinerStatus::Off,
            decision: Decision::Start,
            command: CommandOutcome::Succeeded,
        }
    );

    let second = optimizer.run_all_enabled_units().await;
    let outcome = &second.units[0].miner(miner.id).unwrap().outcome;
    assert_eq!(
        *outcome,
        MinerOutcome::Decided {
            status: MinerStatus::On,
            decision: Decision::Stop,
            command: CommandOutcome::Succeeded,
        }
    );
}

#[tokio::test]
async fn should_expose_context_and_rule_testing_for_configured_unit() {
    let (config, _) = toggling_config();
    let unit_id = config.units[0].id;
    let optimizer = bootstrap::build(&config).await.unwrap();

    let context = optimizer.decisional_context(unit_id).await.unwrap();
    assert!(context.miner.is_none());

    let producing = AutomationRule::builder()
        .name("producing")
        .conditions(RuleCondition::new("energy_state.production", Operator::Gte, 0))
        .action(Decision::Start)
        .build()
        .unwrap();
    assert!(optimizer.test_rules(vec![producing], &context));
}

#[tokio::test]
async fn should_release_adapters_resolved_during_cycle() {
    let (config, _) = toggling_config();
    let optimizer = bootstrap::build(&config).await.unwrap();
    assert_eq!(optimizer.adapters().cached_adapters().await, 0);

    optimizer.run_all_enabled_units().await;
    // monitor, controller and notifier
    assert_eq!(optimizer.adapters().cached_adapters().await, 3);

    bootstrap::release(&optimizer).await;
    assert_eq!(optimizer.adapters().cached_adapters().await, 0);
    assert_eq!(optimizer.adapters().cached_services().await, 0);
}

#[tokio::test]
async fn should_skip_disabled_units() {
    let (mut config, _) = toggling_config();
    config.units[0].disable();
    let optimizer = bootstrap::build(&config).await.unwrap();

    let report = optimizer.run_all_enabled_units().await;
    assert!(report.units.is_empty());
    assert_eq!(report.commands_sent(), 0);
}

#[tokio::test(start_paused = true)]
async fn should_run_cycles_until_shutdown() {
    let (config, _) = toggling_config();
    let optimizer = bootstrap::build(&config).await.unwrap();

    let cycles = run_every(
        &optimizer,
        Duration::from_secs(5),
        tokio::time::sleep(Duration::from_secs(12)),
    )
    .await;
    assert_eq!(cycles, 3);
}
