//! # minerhubd — minerhub daemon
//!
//! Composition root that wires all adapters together and runs the
//! optimization scheduler.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Seed the in-memory repositories with the configured installation
//! - Construct the adapter service and the optimization orchestrator
//! - Run one optimization cycle per interval
//! - Handle graceful shutdown (SIGINT), letting a running cycle finish and
//!   releasing the live adapters
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

use anyhow::Context;
use minerhub_app::scheduler::run_every;
use minerhubd::bootstrap;
use minerhubd::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("cannot load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let optimizer = bootstrap::build(&config)
        .await
        .context("cannot build the optimizer")?;

    tracing::info!(interval_secs = config.scheduler.interval_secs, "minerhubd started");
    let cycles = run_every(&optimizer, config.interval(), shutdown_signal()).await;
    bootstrap::release(&optimizer).await;
    tracing::info!(cycles, "minerhubd stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
