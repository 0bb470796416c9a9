//! Simulation coordinator: owns the hub and the components and routes facts
//! between them.
//!
//! # Propagation
//!
//! Components never hold references to each other. Each one pushes the
//! facts it produces into an outbox; the coordinator publishes every fact
//! on the [`NotificationHub`] and then hands it to the dependent
//! components, depth-first, before moving on to the next fact:
//!
//! | Fact | Routed to |
//! |---|---|
//! | orbit phase | window (dawn trial / force close), score, pulse |
//! | window state | thermal, score |
//! | temperature | score |
//! | death | score, pulse |
//! | fail chance | window |
//! | AC purchased | thermal |
//! | ability purchased | pulse |
//!
//! # Step order
//!
//! [`Simulation::advance`] runs orbit, then thermal, then score. A dawn
//! transition therefore opens (or fails to open) the window before the
//! thermal model integrates, so the new window state applies to the same
//! step that crossed the boundary.

use std::rc::Rc;

use cactus_types::{Command, Notification, OrbitPhase, WindowStatus};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigError, SimulationConfig};
use crate::hub::NotificationHub;
use crate::orbit::OrbitCycle;
use crate::pulse::CoolingPulse;
use crate::score::ScoreEngine;
use crate::thermal::{DeathCause, ThermalModel};
use crate::upgrades::UpgradeEconomy;
use crate::window::WindowController;

/// Read-only view of the whole simulation at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationSnapshot {
    /// Whether [`Simulation::start`] has run.
    pub started: bool,
    /// Simulated seconds since start.
    pub elapsed_seconds: f64,
    /// Current orbit phase.
    pub phase: OrbitPhase,
    /// Seconds spent in the current phase.
    pub phase_elapsed_seconds: f64,
    /// Seconds until the next phase change.
    pub phase_remaining_seconds: f64,
    /// Window state and auto-failed flag.
    pub window: WindowStatus,
    /// Plant temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Whether the plant is alive.
    pub alive: bool,
    /// Why the plant died, once dead.
    pub death_cause: Option<DeathCause>,
    /// Integer score.
    pub score: u64,
    /// Score multiplier.
    pub multiplier: u32,
    /// Seconds accumulated toward the next multiplier step.
    pub streak_seconds: f64,
    /// Current auto-window upgrade level.
    pub auto_window_level: u32,
    /// Highest reachable auto-window level.
    pub max_auto_window_level: u32,
    /// Fail chance of the next dawn trial.
    pub auto_open_fail_chance: f64,
    /// Whether the AC has been bought.
    pub ac_purchased: bool,
    /// Whether the cooling pulse has been bought.
    pub pulse_purchased: bool,
    /// Whether the cooling pulse is armed.
    pub pulse_ready: bool,
    /// Whether a manual open would succeed.
    pub can_manually_open: bool,
    /// Whether a manual close would succeed.
    pub can_close: bool,
    /// Whether a pulse would fire, score included.
    pub can_pulse: bool,
}

/// The interacting components, rebuilt together on reset.
#[derive(Debug, Clone)]
struct Components {
    orbit: OrbitCycle,
    window: WindowController,
    thermal: ThermalModel,
    score: ScoreEngine,
    upgrades: UpgradeEconomy,
    pulse: CoolingPulse,
}

impl Components {
    fn new(config: &SimulationConfig) -> Self {
        let upgrades = UpgradeEconomy::new(&config.window);
        Self {
            orbit: OrbitCycle::new(&config.orbit),
            window: WindowController::new(upgrades.auto_open_fail_chance()),
            thermal: ThermalModel::new(&config.thermal),
            score: ScoreEngine::new(&config.scoring, config.thermal.starting_temp_c),
            upgrades,
            pulse: CoolingPulse::new(),
        }
    }
}

/// One simulation run.
///
/// `R` is the random source for dawn trials; inject a seeded generator to
/// make runs reproducible.
#[derive(Debug)]
pub struct Simulation<R: Rng = SmallRng> {
    config: SimulationConfig,
    hub: Rc<NotificationHub>,
    parts: Components,
    rng: R,
    started: bool,
    elapsed_seconds: f64,
}

impl Simulation<SmallRng> {
    /// Build a simulation whose dawn trials draw from `SmallRng` seeded
    /// with `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails
    /// validation.
    pub fn seeded(config: SimulationConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Validate `config` and build every component in its initial state.
    ///
    /// Nothing is published until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails
    /// validation.
    pub fn new(config: SimulationConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let parts = Components::new(&config);
        Ok(Self {
            config,
            hub: Rc::new(NotificationHub::new()),
            parts,
            rng,
            started: false,
            elapsed_seconds: 0.0,
        })
    }

    /// The hub this run publishes on.
    pub fn hub(&self) -> Rc<NotificationHub> {
        Rc::clone(&self.hub)
    }

    /// The validated configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Whether [`start`](Self::start) has run since construction or the last
    /// reset.
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Publish the full initial state and run the opening dawn trial.
    ///
    /// Calling it twice is a no-op.
    pub fn start(&mut self) {
        if self.started {
            debug!("Simulation already started");
            return;
        }
        self.started = true;

        let mut out = Vec::new();
        let parts = &mut self.parts;
        parts.upgrades.publish_all(&mut out);
        parts.pulse.publish(&mut out);
        parts.thermal.publish(&mut out);
        parts.score.publish_all(&mut out);
        parts.window.publish(&mut out);
        out.push(Notification::OrbitPhaseChanged(parts.orbit.phase()));

        info!(
            sunlit_seconds = self.config.orbit.sunlit_seconds,
            eclipse_seconds = self.config.orbit.eclipse_seconds,
            temperature_c = self.config.thermal.starting_temp_c,
            "Simulation started"
        );
        self.dispatch_all(out);
    }

    /// Advance every component by `elapsed` seconds.
    ///
    /// Ignored before [`start`](Self::start) and for negative or non-finite
    /// values.
    pub fn advance(&mut self, elapsed: f64) {
        if !self.started {
            debug!(elapsed, "Advance ignored, simulation not started");
            return;
        }
        if !elapsed.is_finite() || elapsed < 0.0 {
            warn!(elapsed, "Advance ignored, elapsed must be finite and non-negative");
            return;
        }
        self.elapsed_seconds += elapsed;

        let mut out = Vec::new();
        self.parts.orbit.advance(elapsed, &mut out);
        self.dispatch_all(out);

        let mut out = Vec::new();
        self.parts.thermal.advance(elapsed, &mut out);
        self.dispatch_all(out);

        let mut out = Vec::new();
        self.parts.score.advance(elapsed, &mut out);
        self.dispatch_all(out);
    }

    /// Open the window after a failed dawn trial.
    pub fn manual_open(&mut self) {
        self.with_outbox(|parts, out| parts.window.manual_open(out));
    }

    /// Close an open window.
    pub fn manual_close(&mut self) {
        self.with_outbox(|parts, out| parts.window.manual_close(out));
    }

    /// Buy one auto-window upgrade level.
    pub fn buy_auto_window_upgrade(&mut self) {
        self.with_outbox(|parts, out| parts.upgrades.buy_auto_window_upgrade(out));
    }

    /// Buy the AC.
    pub fn buy_ac(&mut self) {
        self.with_outbox(|parts, out| parts.upgrades.buy_ac(out));
    }

    /// Buy the cooling pulse (requires the AC).
    pub fn buy_pulse_upgrade(&mut self) {
        self.with_outbox(|parts, out| parts.upgrades.buy_pulse_upgrade(out));
    }

    /// Fire the cooling pulse. Returns whether it fired.
    ///
    /// Requires the pulse to be purchased, ready and the plant alive, and
    /// enough score to pay for it. Otherwise nothing changes.
    pub fn try_pulse(&mut self) -> bool {
        if !self.parts.pulse.can_pulse() {
            debug!(
                purchased = self.parts.pulse.is_purchased(),
                ready = self.parts.pulse.is_ready(),
                alive = self.parts.thermal.is_alive(),
                "Cooling pulse blocked"
            );
            return false;
        }

        let cost = self.config.pulse.cost_points;
        let mut out = Vec::new();
        if !self.parts.score.try_spend(cost, &mut out) {
            debug!(
                cost,
                score = self.parts.score.score(),
                "Cooling pulse blocked, not enough points"
            );
            return false;
        }
        self.parts
            .thermal
            .apply_instant_cooling(self.config.pulse.temp_drop_c, &mut out);
        self.parts.pulse.consume(&mut out);
        self.dispatch_all(out);
        true
    }

    /// Deduct `cost` from the score. See [`ScoreEngine::try_spend`].
    pub fn try_spend(&mut self, cost: u64) -> bool {
        let mut out = Vec::new();
        let spent = self.parts.score.try_spend(cost, &mut out);
        self.dispatch_all(out);
        spent
    }

    /// Cool the plant by `|degrees|` right now. No-op once dead.
    pub fn apply_instant_cooling(&mut self, degrees: f64) {
        self.with_outbox(|parts, out| parts.thermal.apply_instant_cooling(degrees, out));
    }

    /// Apply a [`Command`].
    ///
    /// [`Command::Restart`] only performs [`reset_all`](Self::reset_all); the
    /// caller re-subscribes and calls [`start`](Self::start).
    pub fn execute(&mut self, command: Command) {
        debug!(?command, "Executing command");
        match command {
            Command::ManualOpen => self.manual_open(),
            Command::ManualClose => self.manual_close(),
            Command::BuyAutoWindowUpgrade => self.buy_auto_window_upgrade(),
            Command::BuyAc => self.buy_ac(),
            Command::BuyPulseUpgrade => self.buy_pulse_upgrade(),
            Command::TryPulse => {
                self.try_pulse();
            }
            Command::Restart => self.reset_all(),
        }
    }

    /// Tear down the hub and put every component back in its initial state.
    ///
    /// Subscribers must re-register and [`start`](Self::start) must be
    /// called again. The random source carries on from where it was.
    pub fn reset_all(&mut self) {
        self.hub.teardown();
        self.parts = Components::new(&self.config);
        self.started = false;
        self.elapsed_seconds = 0.0;
        info!("Simulation reset");
    }

    /// Capture the current state.
    pub fn snapshot(&self) -> SimulationSnapshot {
        let Components {
            orbit,
            window,
            thermal,
            score,
            upgrades,
            pulse,
        } = &self.parts;

        SimulationSnapshot {
            started: self.started,
            elapsed_seconds: self.elapsed_seconds,
            phase: orbit.phase(),
            phase_elapsed_seconds: orbit.elapsed_in_phase(),
            phase_remaining_seconds: orbit.remaining_in_phase(),
            window: window.status(),
            temperature_c: thermal.temperature_c(),
            alive: thermal.is_alive(),
            death_cause: thermal.death_cause(),
            score: score.score(),
            multiplier: score.multiplier(),
            streak_seconds: score.streak_seconds(),
            auto_window_level: upgrades.auto_window_level(),
            max_auto_window_level: upgrades.max_auto_window_level(),
            auto_open_fail_chance: upgrades.auto_open_fail_chance(),
            ac_purchased: upgrades.ac_purchased(),
            pulse_purchased: upgrades.pulse_purchased(),
            pulse_ready: pulse.is_ready(),
            can_manually_open: window.can_manually_open(),
            can_close: window.can_close(),
            can_pulse: pulse.can_pulse() && score.score() >= self.config.pulse.cost_points,
        }
    }

    fn with_outbox(&mut self, f: impl FnOnce(&mut Components, &mut Vec<Notification>)) {
        let mut out = Vec::new();
        f(&mut self.parts, &mut out);
        self.dispatch_all(out);
    }

    fn dispatch_all(&mut self, facts: Vec<Notification>) {
        for fact in facts {
            self.dispatch(fact);
        }
    }

    fn dispatch(&mut self, fact: Notification) {
        trace!(?fact, "Publishing");
        self.hub.publish(&fact);

        let mut out = Vec::new();
        let parts = &mut self.parts;
        match fact {
            Notification::OrbitPhaseChanged(phase) => {
                parts.window.observe_phase(phase, &mut self.rng, &mut out);
                parts.score.observe_phase(phase);
                parts.pulse.observe_phase(phase, &mut out);
            }
            Notification::WindowStateChanged(status) => {
                parts.thermal.observe_window(status.state);
                parts.score.observe_window(status.state);
            }
            Notification::TemperatureChanged(temperature_c) => {
                parts.score.observe_temperature(temperature_c);
            }
            Notification::PlantDied => {
                parts.score.observe_death(&mut out);
                parts.pulse.observe_death();
            }
            Notification::AutoOpenFailChanceChanged(chance) => {
                parts.window.observe_fail_chance(chance);
            }
            Notification::AcPurchasedChanged(purchased) => {
                parts.thermal.observe_ac_purchased(purchased);
            }
            Notification::AbilityPurchasedChanged(purchased) => {
                parts.pulse.observe_purchased(purchased);
            }
            Notification::ScoreChanged(_)
            | Notification::MultiplierChanged(_)
            | Notification::SafeStreakChanged(_)
            | Notification::AbilityReadyChanged(_)
            | Notification::AbilityTriggered => {}
        }

        self.dispatch_all(out);
    }
}
