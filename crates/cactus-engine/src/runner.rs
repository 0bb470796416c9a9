//! Driver loop for a headless run.
//!
//! [`run`] owns the step cadence the core deliberately leaves out:
//!
//! - **Fixed step**: `advance(run.tick_seconds)` each iteration.
//! - **Bounded run**: stop after `run.max_seconds` of simulated time
//!   (0 runs until the plant dies for good).
//! - **Real-time pacing**: with `run.realtime`, each step waits on a
//!   `tokio` interval of one tick.
//! - **Restart on death**: with `run.restart_on_death`, a dead plant
//!   triggers `reset_all` and a fresh `start`, up to `run.max_restarts`.
//! - **Manual restart**: a controller's [`Command::Restart`] takes the same
//!   path at any time and does not count toward `run.max_restarts`.
//!
//! The run ends with a [`RunReport`].

use std::rc::Rc;
use std::time::Duration;

use cactus_core::config::SimulationConfig;
use cactus_core::{Simulation, SimulationSnapshot};
use cactus_types::{Command, Topic};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use uuid::Uuid;

use crate::controller::Controller;
use crate::observers::{Observers, PlantLook};

/// Why the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// `run.max_seconds` of simulated time elapsed.
    TimeLimit,
    /// The plant died and no restart was allowed.
    PlantDied,
}

/// Summary of one run, printed as JSON when the binary exits.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique, time-ordered run id.
    pub run_id: Uuid,
    /// Seed of the dawn-trial random source.
    pub seed: u64,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    pub finished_at: DateTime<Utc>,
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Simulated seconds across all lives.
    pub simulated_seconds: f64,
    /// Steps executed.
    pub steps: u64,
    /// Plant deaths.
    pub deaths: u32,
    /// Automatic restarts performed.
    pub restarts: u32,
    /// Restarts requested by the controller.
    pub manual_restarts: u32,
    /// Upgrade purchase commands issued by the controller.
    pub purchase_commands: u32,
    /// Cooling pulses fired.
    pub pulses_fired: u32,
    /// Highest score reached in any life.
    pub peak_score: u64,
    /// State at the end of the run.
    pub final_snapshot: SimulationSnapshot,
    /// Plant look at the end of the run.
    pub final_look: PlantLook,
}

/// Drive `sim` with `controller` until the run ends.
///
/// `sim` must be freshly constructed; the runner attaches its
/// collaborators and calls `start` itself.
pub async fn run(
    config: &SimulationConfig,
    sim: &mut Simulation,
    controller: &mut dyn Controller,
) -> RunReport {
    let run_id = Uuid::now_v7();
    let started_at = Utc::now();
    let tick = config.run.tick_seconds;
    let max_seconds = config.run.max_seconds;

    let observers = Observers::new(config);
    begin_life(sim, &observers);

    let mut pacing = config.run.realtime.then(|| {
        let mut interval = tokio::time::interval(Duration::from_secs_f64(tick));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    info!(
        %run_id,
        seed = config.run.seed,
        tick_seconds = tick,
        max_seconds,
        realtime = config.run.realtime,
        restart_on_death = config.run.restart_on_death,
        "Run starting"
    );

    let mut simulated_seconds = 0.0_f64;
    let mut steps: u64 = 0;
    let mut restarts: u32 = 0;
    let mut manual_restarts: u32 = 0;
    let mut purchase_commands: u32 = 0;
    let mut peak_score: u64 = 0;

    let end_reason = loop {
        if max_seconds > 0.0 && simulated_seconds >= max_seconds {
            info!(simulated_seconds, "Time limit reached");
            break EndReason::TimeLimit;
        }

        if let Some(interval) = pacing.as_mut() {
            interval.tick().await;
        }

        for command in controller.decide(&sim.snapshot()) {
            if command.is_purchase() {
                purchase_commands = purchase_commands.saturating_add(1);
            }
            if command == Command::Restart {
                manual_restarts = manual_restarts.saturating_add(1);
                info!(manual_restarts, "Restart requested");
                restart_life(sim, &observers);
            } else {
                sim.execute(command);
            }
        }
        sim.advance(tick);
        observers.pulse_effect.borrow_mut().tick(tick);
        simulated_seconds += tick;
        steps = steps.saturating_add(1);
        peak_score = peak_score.max(sim.snapshot().score);

        if !observers.game_over.borrow().is_over() {
            continue;
        }

        if !config.run.restart_on_death || restarts >= config.run.max_restarts {
            info!(restarts, "Plant died, run over");
            break EndReason::PlantDied;
        }

        restarts = restarts.saturating_add(1);
        warn!(
            restart = restarts,
            max_restarts = config.run.max_restarts,
            "Plant died, restarting"
        );
        restart_life(sim, &observers);
    };

    let report = RunReport {
        run_id,
        seed: config.run.seed,
        started_at,
        finished_at: Utc::now(),
        end_reason,
        simulated_seconds,
        steps,
        deaths: observers.game_over.borrow().deaths(),
        restarts,
        manual_restarts,
        purchase_commands,
        pulses_fired: observers.pulse_effect.borrow().fired(),
        peak_score,
        final_snapshot: sim.snapshot(),
        final_look: observers.appearance.borrow().look(),
    };
    log_run_end(&report);
    report
}

/// Attach collaborators and start a fresh life.
fn begin_life(sim: &mut Simulation, observers: &Observers) {
    let hub = sim.hub();
    observers.attach(&hub);

    // Status line once per phase change.
    let hud = Rc::clone(&observers.hud);
    hub.subscribe(Topic::OrbitPhase, move |_| {
        info!(status = %hud.borrow().render(), "Orbit status");
    });

    sim.start();
}

/// Throw the current life away and begin a fresh one.
fn restart_life(sim: &mut Simulation, observers: &Observers) {
    sim.reset_all();
    observers.clear();
    begin_life(sim, observers);
}

/// Log the end-of-run summary.
pub fn log_run_end(report: &RunReport) {
    info!(
        run_id = %report.run_id,
        reason = ?report.end_reason,
        simulated_seconds = report.simulated_seconds,
        steps = report.steps,
        deaths = report.deaths,
        restarts = report.restarts,
        manual_restarts = report.manual_restarts,
        purchase_commands = report.purchase_commands,
        pulses_fired = report.pulses_fired,
        peak_score = report.peak_score,
        final_score = report.final_snapshot.score,
        "Run ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use cactus_core::config::{RunConfig, WindowConfig};

    use super::*;
    use crate::controller::{Autopilot, IdleController};

    /// Restarts once, on the `restart_at`-th decision.
    struct RestartOnce {
        decisions: u32,
        restart_at: u32,
    }

    impl Controller for RestartOnce {
        fn decide(&mut self, _snapshot: &SimulationSnapshot) -> Vec<Command> {
            self.decisions += 1;
            if self.decisions == self.restart_at {
                vec![Command::Restart]
            } else {
                Vec::new()
            }
        }
    }

    fn config(fail_chance: f64, run: RunConfig) -> SimulationConfig {
        SimulationConfig {
            window: WindowConfig {
                base_auto_open_fail_chance: fail_chance,
                min_auto_open_fail_chance: 0.0,
                fail_chance_reduction_per_upgrade: 0.05,
            },
            run,
            ..SimulationConfig::default()
        }
    }

    fn bounded(max_seconds: f64) -> RunConfig {
        RunConfig {
            tick_seconds: 0.5,
            max_seconds,
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn idle_run_with_failed_dawn_ends_in_death() {
        let config = config(1.0, bounded(600.0));
        let mut sim = Simulation::seeded(config.clone(), 1).unwrap();
        let report = run(&config, &mut sim, &mut IdleController::new()).await;

        assert_eq!(report.end_reason, EndReason::PlantDied);
        assert_eq!(report.deaths, 1);
        assert_eq!(report.restarts, 0);
        assert!(!report.final_snapshot.alive);
        // Dies at t=14 with 0.5s steps.
        assert_eq!(report.steps, 28);
    }

    #[tokio::test]
    async fn restarts_up_to_the_limit() {
        let run_config = RunConfig {
            restart_on_death: true,
            max_restarts: 2,
            ..bounded(600.0)
        };
        let config = config(1.0, run_config);
        let mut sim = Simulation::seeded(config.clone(), 1).unwrap();
        let report = run(&config, &mut sim, &mut IdleController::new()).await;

        assert_eq!(report.end_reason, EndReason::PlantDied);
        assert_eq!(report.deaths, 3);
        assert_eq!(report.restarts, 2);
        assert_eq!(report.steps, 84);
    }

    #[tokio::test]
    async fn autopilot_survives_the_time_limit() {
        let config = config(0.25, bounded(360.0));
        let mut sim = Simulation::seeded(config.clone(), 42).unwrap();
        let mut pilot = Autopilot::new(&config);
        let report = run(&config, &mut sim, &mut pilot).await;

        assert_eq!(report.end_reason, EndReason::TimeLimit);
        assert_eq!(report.deaths, 0);
        assert_eq!(report.simulated_seconds, 360.0);
        assert!(report.final_snapshot.alive);
        assert!(report.final_snapshot.ac_purchased);
        assert!(report.peak_score > 0);
        assert!(report.purchase_commands >= 3, "AC, pulse and auto-window levels");
    }

    #[tokio::test]
    async fn controller_restart_starts_a_fresh_life() {
        let config = config(0.0, bounded(5.0));
        let mut sim = Simulation::seeded(config.clone(), 3).unwrap();
        let mut controller = RestartOnce {
            decisions: 0,
            restart_at: 6,
        };
        let report = run(&config, &mut sim, &mut controller).await;

        assert_eq!(report.end_reason, EndReason::TimeLimit);
        assert_eq!(report.manual_restarts, 1);
        assert_eq!(report.restarts, 0);
        assert_eq!(report.deaths, 0);
        assert_eq!(report.steps, 10);
        assert_eq!(report.simulated_seconds, 5.0);
        // Five half-second steps before the restart, five after it.
        assert!(report.final_snapshot.started);
        assert_eq!(report.final_snapshot.elapsed_seconds, 2.5);
        assert_eq!(report.final_snapshot.temperature_c, 24.5);
    }

    #[tokio::test]
    async fn failed_dawn_leaves_the_plant_crying() {
        let config = config(1.0, bounded(1.0));
        let mut sim = Simulation::seeded(config.clone(), 1).unwrap();
        let report = run(&config, &mut sim, &mut IdleController::new()).await;

        assert!(report.final_look.crying);
        assert!(!report.final_look.thorny);
        assert_eq!(report.purchase_commands, 0);
    }

    #[tokio::test]
    async fn report_serializes_to_json() {
        let config = config(0.0, bounded(5.0));
        let mut sim = Simulation::seeded(config.clone(), 3).unwrap();
        let report = run(&config, &mut sim, &mut IdleController::new()).await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["end_reason"], "time_limit");
        assert_eq!(json["steps"], 10);
        assert_eq!(json["final_snapshot"]["phase"], "Sunlit");
        assert!(json["run_id"].is_string());
        assert_eq!(json["final_look"]["crying"], false);
    }
}
