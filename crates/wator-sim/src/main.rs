//! Headless runner for the Wa-Tor simulation.

mod telemetry;

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, info};
use wator_core::RunConfig;
use wator_world::Simulation;

fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config = load_config()?;
    debug!(?config, "Run configuration");

    let mut simulation =
        Simulation::new(config.world.clone()).context("invalid simulation configuration")?;

    let started = Instant::now();
    let summary = simulation.run(config.num_chronons, config.log_interval);
    let elapsed = started.elapsed();

    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        chronons_per_sec = summary.chronons as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        "Finished"
    );

    // Final frame for an external renderer to pick up.
    if let Ok(path) = std::env::var("WATOR_SNAPSHOT") {
        let snapshot = simulation.snapshot();
        std::fs::write(&path, serde_json::to_vec(&snapshot)?)
            .with_context(|| format!("failed to write snapshot to {}", path))?;
        info!(path = %path, creatures = snapshot.creatures.len(), "Snapshot written");
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Configuration comes from the first argument or `WATOR_CONFIG`, otherwise defaults.
fn load_config() -> Result<RunConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WATOR_CONFIG").ok());

    match path {
        Some(path) => RunConfig::from_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path)),
        None => {
            info!("No configuration file given, using defaults");
            Ok(RunConfig::default())
        }
    }
}
