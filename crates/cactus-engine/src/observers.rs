//! Collaborators that react to published facts.
//!
//! None of these hold core invariants. They subscribe to the hub, keep
//! their own presentation state, and are re-attached after every
//! [`Simulation::reset_all`], which drops all subscriptions.
//!
//! - [`PulseEffect`] -- countdown for the visual effect after a pulse.
//! - [`PlantAppearance`] -- flower, thorns and face mood toggled by thresholds.
//! - [`GameOver`] -- latches on death; the driver decides whether to restart.
//! - [`Hud`] -- one-line status text built from the latest facts.
//! - An event log that writes every fact as JSON at debug level.
//!
//! [`Simulation::reset_all`]: cactus_core::Simulation::reset_all

use std::cell::RefCell;
use std::rc::Rc;

use cactus_core::NotificationHub;
use cactus_core::config::SimulationConfig;
use cactus_types::{Notification, OrbitPhase, Topic, WindowStatus};
use serde::Serialize;
use tracing::{debug, info, warn};

// =============================================================================
// Pulse effect
// =============================================================================

/// Timer for the cooling-pulse effect, decremented by the driver each step.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseEffect {
    duration_seconds: f64,
    remaining_seconds: f64,
    fired: u32,
}

impl PulseEffect {
    /// Create an idle effect lasting `duration_seconds` once triggered.
    pub const fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            remaining_seconds: 0.0,
            fired: 0,
        }
    }

    /// Whether the effect is currently playing.
    pub const fn is_active(&self) -> bool {
        self.remaining_seconds > 0.0
    }

    /// Pulses observed over the collaborator's lifetime.
    pub const fn fired(&self) -> u32 {
        self.fired
    }

    /// Handle a published fact.
    pub fn observe(&mut self, fact: &Notification) {
        if *fact == Notification::AbilityTriggered {
            self.fired = self.fired.saturating_add(1);
            self.remaining_seconds = self.duration_seconds;
            info!(duration_seconds = self.duration_seconds, "Pulse effect started");
        }
    }

    /// Count the effect down. Returns `true` on the step it ends.
    pub fn tick(&mut self, elapsed: f64) -> bool {
        if !self.is_active() {
            return false;
        }
        self.remaining_seconds = (self.remaining_seconds - elapsed).max(0.0);
        if self.is_active() {
            return false;
        }
        info!("Pulse effect ended");
        true
    }

    /// Cancel any running effect (the pulse count is kept).
    pub const fn clear(&mut self) {
        self.remaining_seconds = 0.0;
    }
}

// =============================================================================
// Plant appearance
// =============================================================================

/// What the plant looks like right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlantLook {
    /// Flower showing (score above the flower threshold).
    pub flowering: bool,
    /// Thorns showing (temperature above the thorns threshold).
    pub thorny: bool,
    /// Crying face: the dawn trial failed, the window is still shut and the
    /// plant is comfortable enough to want it open.
    pub crying: bool,
}

/// Flower, thorns and face mood.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantAppearance {
    flower_score_threshold: u64,
    thorns_temp_threshold_c: f64,
    safe_min_temp_c: f64,
    safe_max_temp_c: f64,
    starting_temp_c: f64,
    window: WindowStatus,
    temperature_c: f64,
    look: PlantLook,
}

impl PlantAppearance {
    /// Create a bare, smiling plant with the configured thresholds.
    pub const fn new(config: &SimulationConfig) -> Self {
        Self {
            flower_score_threshold: config.appearance.flower_score_threshold,
            thorns_temp_threshold_c: config.appearance.thorns_temp_threshold_c,
            safe_min_temp_c: config.scoring.safe_min_temp_c,
            safe_max_temp_c: config.scoring.safe_max_temp_c,
            starting_temp_c: config.thermal.starting_temp_c,
            window: WindowStatus::CLOSED,
            temperature_c: config.thermal.starting_temp_c,
            look: PlantLook {
                flowering: false,
                thorny: false,
                crying: false,
            },
        }
    }

    /// Current look.
    pub const fn look(&self) -> PlantLook {
        self.look
    }

    /// Handle a published fact.
    pub fn observe(&mut self, fact: &Notification) {
        match *fact {
            Notification::ScoreChanged(score) => {
                let flowering = score > self.flower_score_threshold;
                if flowering != self.look.flowering {
                    info!(score, flowering, "Plant flower toggled");
                    self.look.flowering = flowering;
                }
            }
            Notification::TemperatureChanged(temperature_c) => {
                self.temperature_c = temperature_c;
                let thorny = temperature_c > self.thorns_temp_threshold_c;
                if thorny != self.look.thorny {
                    info!(temperature_c, thorny, "Plant thorns toggled");
                    self.look.thorny = thorny;
                }
                self.update_mood();
            }
            Notification::WindowStateChanged(status) => {
                self.window = status;
                self.update_mood();
            }
            _ => {}
        }
    }

    /// Back to the bare, smiling look.
    pub const fn clear(&mut self) {
        self.window = WindowStatus::CLOSED;
        self.temperature_c = self.starting_temp_c;
        self.look = PlantLook {
            flowering: false,
            thorny: false,
            crying: false,
        };
    }

    fn update_mood(&mut self) {
        let comfortable =
            (self.safe_min_temp_c..=self.safe_max_temp_c).contains(&self.temperature_c);
        let crying = !self.window.is_open() && self.window.auto_failed_this_dawn && comfortable;
        if crying != self.look.crying {
            info!(crying, temperature_c = self.temperature_c, "Plant face changed");
            self.look.crying = crying;
        }
    }
}

// =============================================================================
// Game over
// =============================================================================

/// Latches when the plant dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameOver {
    over: bool,
    deaths: u32,
}

impl GameOver {
    /// Create a cleared latch.
    pub const fn new() -> Self {
        Self {
            over: false,
            deaths: 0,
        }
    }

    /// Whether the current run has ended in death.
    pub const fn is_over(&self) -> bool {
        self.over
    }

    /// Deaths observed over the collaborator's lifetime.
    pub const fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Handle a published fact.
    pub fn observe(&mut self, fact: &Notification) {
        if *fact == Notification::PlantDied {
            self.over = true;
            self.deaths = self.deaths.saturating_add(1);
            warn!(deaths = self.deaths, "Game over");
        }
    }

    /// Re-arm for a new run (the death count is kept).
    pub const fn clear(&mut self) {
        self.over = false;
    }
}

// =============================================================================
// HUD
// =============================================================================

/// Latest value of each displayed fact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hud {
    phase: Option<OrbitPhase>,
    window: Option<WindowStatus>,
    temperature_c: f64,
    score: u64,
    multiplier: u32,
    streak_seconds: f64,
    fail_chance: f64,
    ac_purchased: bool,
    pulse_purchased: bool,
    pulse_ready: bool,
}

impl Hud {
    /// Create an empty HUD.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a published fact.
    pub fn observe(&mut self, fact: &Notification) {
        match *fact {
            Notification::OrbitPhaseChanged(phase) => self.phase = Some(phase),
            Notification::WindowStateChanged(status) => self.window = Some(status),
            Notification::TemperatureChanged(t) => self.temperature_c = t,
            Notification::ScoreChanged(score) => self.score = score,
            Notification::MultiplierChanged(m) => self.multiplier = m,
            Notification::SafeStreakChanged(s) => self.streak_seconds = s,
            Notification::AutoOpenFailChanceChanged(c) => self.fail_chance = c,
            Notification::AcPurchasedChanged(b) => self.ac_purchased = b,
            Notification::AbilityPurchasedChanged(b) => self.pulse_purchased = b,
            Notification::AbilityReadyChanged(b) => self.pulse_ready = b,
            Notification::PlantDied | Notification::AbilityTriggered => {}
        }
    }

    /// One status line.
    pub fn render(&self) -> String {
        let phase = self
            .phase
            .map_or_else(|| "-".to_owned(), |p| p.to_string());
        let window = self.window.map_or_else(
            || "-".to_owned(),
            |w| {
                let failed = if w.auto_failed_this_dawn { "yes" } else { "no" };
                format!("{} (auto-open failed: {failed})", w.state)
            },
        );
        let pulse = match (self.pulse_purchased, self.pulse_ready) {
            (false, _) => "locked",
            (true, true) => "ready",
            (true, false) => "used",
        };
        format!(
            "orbit {phase} | window {window} | {:.1}C | score {} x{} | streak {} | fail {:.0}% | ac {} | pulse {pulse}",
            self.temperature_c,
            self.score,
            self.multiplier,
            format_streak(self.streak_seconds),
            self.fail_chance * 100.0,
            if self.ac_purchased { "yes" } else { "no" },
        )
    }
}

/// `mm:ss` for a non-negative number of seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_streak(seconds: f64) -> String {
    let whole = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

// =============================================================================
// Event log
// =============================================================================

/// Log one fact as JSON.
fn log_event(fact: &Notification) {
    match serde_json::to_string(fact) {
        Ok(json) => debug!(target: "cactus::events", event = %json, "Published"),
        Err(e) => warn!(error = %e, "Failed to serialize notification"),
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// Every collaborator the driver owns, shared with their hub handlers.
#[derive(Debug, Clone)]
pub struct Observers {
    /// Pulse effect timer.
    pub pulse_effect: Rc<RefCell<PulseEffect>>,
    /// Flower and thorns.
    pub appearance: Rc<RefCell<PlantAppearance>>,
    /// Death latch.
    pub game_over: Rc<RefCell<GameOver>>,
    /// Status line.
    pub hud: Rc<RefCell<Hud>>,
}

impl Observers {
    /// Build the collaborators for `config`.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            pulse_effect: Rc::new(RefCell::new(PulseEffect::new(
                config.pulse.effect_duration_seconds,
            ))),
            appearance: Rc::new(RefCell::new(PlantAppearance::new(config))),
            game_over: Rc::new(RefCell::new(GameOver::new())),
            hud: Rc::new(RefCell::new(Hud::new())),
        }
    }

    /// Subscribe every collaborator to `hub`.
    pub fn attach(&self, hub: &NotificationHub) {
        let effect = Rc::clone(&self.pulse_effect);
        hub.subscribe(Topic::AbilityTriggered, move |n| effect.borrow_mut().observe(n));

        let appearance = Rc::clone(&self.appearance);
        hub.subscribe(Topic::Score, {
            let appearance = Rc::clone(&appearance);
            move |n| appearance.borrow_mut().observe(n)
        });
        hub.subscribe(Topic::WindowState, {
            let appearance = Rc::clone(&appearance);
            move |n| appearance.borrow_mut().observe(n)
        });
        hub.subscribe(Topic::Temperature, move |n| appearance.borrow_mut().observe(n));

        let game_over = Rc::clone(&self.game_over);
        hub.subscribe(Topic::Death, move |n| game_over.borrow_mut().observe(n));

        let hud = Rc::clone(&self.hud);
        hub.subscribe_all(move |n| hud.borrow_mut().observe(n));

        hub.subscribe_all(log_event);
    }

    /// Clear per-run presentation state before a restart.
    pub fn clear(&self) {
        self.pulse_effect.borrow_mut().clear();
        self.appearance.borrow_mut().clear();
        self.game_over.borrow_mut().clear();
        *self.hud.borrow_mut() = Hud::new();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use cactus_types::WindowState;

    use super::*;

    #[test]
    fn pulse_effect_counts_down() {
        let mut effect = PulseEffect::new(1.5);
        assert!(!effect.tick(0.5));

        effect.observe(&Notification::AbilityTriggered);
        assert!(effect.is_active());
        assert!(!effect.tick(0.5));
        assert!(!effect.tick(0.5));
        assert!(effect.tick(0.5));
        assert!(!effect.is_active());
        assert!(!effect.tick(0.5), "ends only once");
        assert_eq!(effect.fired(), 1);
    }

    #[test]
    fn pulse_effect_retriggers_from_full() {
        let mut effect = PulseEffect::new(1.5);
        effect.observe(&Notification::AbilityTriggered);
        effect.tick(1.0);
        effect.observe(&Notification::AbilityTriggered);
        assert_eq!(effect.fired(), 2);
        assert!(!effect.tick(1.0), "restarted at the full duration");
        assert!(effect.tick(0.5));
    }

    #[test]
    fn appearance_thresholds_are_strict() {
        let mut plant = PlantAppearance::new(&SimulationConfig::default());
        plant.observe(&Notification::ScoreChanged(100));
        assert!(!plant.look().flowering);
        plant.observe(&Notification::ScoreChanged(101));
        assert!(plant.look().flowering);

        plant.observe(&Notification::TemperatureChanged(80.0));
        assert!(!plant.look().thorny);
        plant.observe(&Notification::TemperatureChanged(80.5));
        assert!(plant.look().thorny);

        plant.observe(&Notification::ScoreChanged(20));
        assert!(!plant.look().flowering, "spending can wilt the flower");
    }

    fn failed_dawn() -> Notification {
        Notification::WindowStateChanged(WindowStatus {
            state: WindowState::Closed,
            auto_failed_this_dawn: true,
        })
    }

    #[test]
    fn cries_while_shut_out_after_failed_dawn() {
        let mut plant = PlantAppearance::new(&SimulationConfig::default());
        assert!(!plant.look().crying);

        plant.observe(&failed_dawn());
        assert!(plant.look().crying, "22 degrees is inside the safe range");

        plant.observe(&Notification::WindowStateChanged(WindowStatus {
            state: WindowState::Open,
            auto_failed_this_dawn: false,
        }));
        assert!(!plant.look().crying, "smiles once the window opens");
    }

    #[test]
    fn crying_needs_a_comfortable_temperature() {
        let mut plant = PlantAppearance::new(&SimulationConfig::default());
        plant.observe(&failed_dawn());

        plant.observe(&Notification::TemperatureChanged(9.5));
        assert!(!plant.look().crying);
        plant.observe(&Notification::TemperatureChanged(10.0));
        assert!(plant.look().crying, "safe range is inclusive");
        plant.observe(&Notification::TemperatureChanged(60.0));
        assert!(plant.look().crying);
        plant.observe(&Notification::TemperatureChanged(60.5));
        assert!(!plant.look().crying);
    }

    #[test]
    fn eclipse_close_stops_crying() {
        let mut plant = PlantAppearance::new(&SimulationConfig::default());
        plant.observe(&failed_dawn());
        assert!(plant.look().crying);

        plant.observe(&Notification::WindowStateChanged(WindowStatus::CLOSED));
        assert!(!plant.look().crying);
    }

    #[test]
    fn game_over_latches_and_clears() {
        let mut over = GameOver::new();
        over.observe(&Notification::ScoreChanged(3));
        assert!(!over.is_over());

        over.observe(&Notification::PlantDied);
        assert!(over.is_over());
        over.clear();
        assert!(!over.is_over());
        assert_eq!(over.deaths(), 1);
    }

    #[test]
    fn hud_renders_latest_facts() {
        let mut hud = Hud::new();
        hud.observe(&Notification::OrbitPhaseChanged(OrbitPhase::Eclipse));
        hud.observe(&Notification::WindowStateChanged(WindowStatus {
            state: WindowState::Closed,
            auto_failed_this_dawn: false,
        }));
        hud.observe(&Notification::TemperatureChanged(21.25));
        hud.observe(&Notification::ScoreChanged(42));
        hud.observe(&Notification::MultiplierChanged(2));
        hud.observe(&Notification::SafeStreakChanged(75.9));
        hud.observe(&Notification::AutoOpenFailChanceChanged(0.25));
        hud.observe(&Notification::AbilityPurchasedChanged(true));
        hud.observe(&Notification::AbilityReadyChanged(false));

        let line = hud.render();
        assert!(line.contains("orbit eclipse"));
        assert!(line.contains("window closed (auto-open failed: no)"));
        assert!(line.contains("score 42 x2"));
        assert!(line.contains("streak 01:15"));
        assert!(line.contains("fail 25%"));
        assert!(line.contains("pulse used"));
    }

    #[test]
    fn streak_format() {
        assert_eq!(format_streak(0.0), "00:00");
        assert_eq!(format_streak(59.99), "00:59");
        assert_eq!(format_streak(61.0), "01:01");
        assert_eq!(format_streak(-3.0), "00:00");
    }

    #[test]
    fn attach_routes_facts_to_collaborators() {
        let hub = NotificationHub::new();
        let observers = Observers::new(&SimulationConfig::default());
        observers.attach(&hub);

        hub.publish(&Notification::AbilityTriggered);
        hub.publish(&Notification::ScoreChanged(500));
        hub.publish(&failed_dawn());
        hub.publish(&Notification::PlantDied);

        assert!(observers.appearance.borrow().look().crying);
        assert!(observers.pulse_effect.borrow().is_active());
        assert!(observers.appearance.borrow().look().flowering);
        assert!(observers.game_over.borrow().is_over());
        assert!(observers.hud.borrow().render().contains("score 500"));

        observers.clear();
        assert!(!observers.game_over.borrow().is_over());
        assert!(!observers.appearance.borrow().look().flowering);
    }
}
