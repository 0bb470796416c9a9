//! Thermal model: plant temperature integration and life/death.
//!
//! Each step while alive:
//!
//! 1. Pick the rate: `+heat` with the window open, `-cool` otherwise.
//! 2. Integrate: `temperature += rate * elapsed`.
//! 3. Check the alive range `[base_min, ac ? ac_max : base_max]`
//!    (inclusive). Inside the range the grace timer resets; outside it
//!    accumulates, and once it reaches `death_grace_seconds` the plant
//!    dies.
//! 4. Publish the new temperature, or `PlantDied` on the dying step.
//!
//! Death is one-way. After it the temperature is frozen and every
//! operation is a no-op.

use cactus_types::{Notification, WindowState};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ThermalConfig;

/// Why the plant died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Temperature stayed below the alive range for the grace period.
    Froze,
    /// Temperature stayed above the alive range for the grace period.
    Overheated,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Froze => write!(f, "froze"),
            Self::Overheated => write!(f, "overheated"),
        }
    }
}

/// Continuous temperature integrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalModel {
    temperature_c: f64,
    alive: bool,
    death_cause: Option<DeathCause>,
    out_of_range_seconds: f64,
    window: WindowState,
    ac_purchased: bool,
    config: ThermalConfig,
}

impl ThermalModel {
    /// Create a living plant at the configured starting temperature.
    pub fn new(config: &ThermalConfig) -> Self {
        Self {
            temperature_c: config.starting_temp_c,
            alive: true,
            death_cause: None,
            out_of_range_seconds: 0.0,
            window: WindowState::Closed,
            ac_purchased: false,
            config: config.clone(),
        }
    }

    /// Current temperature in degrees Celsius.
    pub const fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Whether the plant is alive.
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Cause of death, once dead.
    pub const fn death_cause(&self) -> Option<DeathCause> {
        self.death_cause
    }

    /// Continuous seconds spent outside the alive range.
    pub const fn out_of_range_seconds(&self) -> f64 {
        self.out_of_range_seconds
    }

    /// Inclusive alive range for the current AC state.
    pub const fn alive_range(&self) -> (f64, f64) {
        let max = if self.ac_purchased {
            self.config.ac_max_alive_temp_c
        } else {
            self.config.base_max_alive_temp_c
        };
        (self.config.base_min_alive_temp_c, max)
    }

    /// Record the window state the next step integrates against.
    pub const fn observe_window(&mut self, state: WindowState) {
        self.window = state;
    }

    /// Record the AC purchase flag. Widens the range from the next step on.
    pub const fn observe_ac_purchased(&mut self, purchased: bool) {
        self.ac_purchased = purchased;
    }

    /// Integrate one step.
    pub fn advance(&mut self, elapsed: f64, out: &mut Vec<Notification>) {
        if !self.alive {
            return;
        }

        let rate = match self.window {
            WindowState::Open => self.config.heat_per_second_open,
            WindowState::Closed => -self.config.cool_per_second_closed,
        };
        self.temperature_c = rate.mul_add(elapsed, self.temperature_c);

        let (min, max) = self.alive_range();
        if (min..=max).contains(&self.temperature_c) {
            self.out_of_range_seconds = 0.0;
        } else {
            self.out_of_range_seconds += elapsed;
            if self.out_of_range_seconds >= self.config.death_grace_seconds {
                let cause = if self.temperature_c < min {
                    DeathCause::Froze
                } else {
                    DeathCause::Overheated
                };
                self.die(cause, min, max, out);
                return;
            }
        }

        out.push(Notification::TemperatureChanged(self.temperature_c));
    }

    /// Drop the temperature by `|degrees|` immediately and publish it.
    pub fn apply_instant_cooling(&mut self, degrees: f64, out: &mut Vec<Notification>) {
        if !self.alive {
            debug!("Instant cooling ignored, plant is dead");
            return;
        }
        if !degrees.is_finite() {
            warn!(degrees, "Instant cooling ignored, amount is not finite");
            return;
        }

        self.temperature_c -= degrees.abs();
        info!(
            drop_c = degrees.abs(),
            temperature_c = self.temperature_c,
            "Instant cooling applied"
        );
        out.push(Notification::TemperatureChanged(self.temperature_c));
    }

    /// Push the current temperature (used at run start).
    pub fn publish(&self, out: &mut Vec<Notification>) {
        out.push(Notification::TemperatureChanged(self.temperature_c));
    }

    fn die(&mut self, cause: DeathCause, min: f64, max: f64, out: &mut Vec<Notification>) {
        self.alive = false;
        self.death_cause = Some(cause);
        warn!(
            %cause,
            temperature_c = self.temperature_c,
            alive_min = min,
            alive_max = max,
            grace_seconds = self.config.death_grace_seconds,
            "Plant died"
        );
        out.push(Notification::PlantDied);
    }
}
