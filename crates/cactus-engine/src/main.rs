//! Headless driver for the Cactus Orbit simulation.
//!
//! Wires the simulation core to a controller and the event-driven
//! collaborators, runs the step loop, and prints a JSON run report.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `CACTUS_CONFIG` or `cactus-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the seeded simulation
//! 4. Pick the controller (`run.autopilot`)
//! 5. Run the loop until the time limit or a final death
//! 6. Print the report

mod controller;
mod error;
mod observers;
mod runner;

use std::path::PathBuf;

use cactus_core::Simulation;
use cactus_core::config::SimulationConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::controller::{Autopilot, Controller, IdleController};
use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "cactus-config.yaml";

/// Environment variable that overrides the configuration path.
const CONFIG_ENV_VAR: &str = "CACTUS_CONFIG";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is missing or invalid, the log
/// level cannot be parsed, or the report cannot be serialized.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.level).map_err(|e| EngineError::Logging {
            level: config.logging.level.clone(),
            message: e.to_string(),
        })?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("cactus-engine starting");
    info!(
        source = %source,
        seed = config.run.seed,
        sunlit_seconds = config.orbit.sunlit_seconds,
        eclipse_seconds = config.orbit.eclipse_seconds,
        full_cycle_seconds = config.orbit.full_cycle_seconds(),
        tick_seconds = config.run.tick_seconds,
        autopilot = config.run.autopilot,
        "Configuration loaded"
    );

    // 3. Build the simulation.
    let mut sim = Simulation::seeded(config.clone(), config.run.seed)?;

    // 4. Pick the controller.
    let mut controller: Box<dyn Controller> = if config.run.autopilot {
        Box::new(Autopilot::new(&config))
    } else {
        Box::new(IdleController::new())
    };

    // 5. Run.
    let report = runner::run(&config, &mut sim, controller.as_mut()).await;

    // 6. Print the report.
    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(run_id = %report.run_id, "cactus-engine shutdown complete");
    Ok(())
}

/// Load the configuration.
///
/// An explicit `CACTUS_CONFIG` path must exist. Without it, a missing
/// `cactus-config.yaml` falls back to the built-in defaults.
fn load_config() -> Result<(SimulationConfig, String), EngineError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        let config = SimulationConfig::from_file(&path)?;
        return Ok((config, path.display().to_string()));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        Ok((SimulationConfig::default(), "defaults".to_owned()))
    }
}
