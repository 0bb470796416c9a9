//! Orbit cycle: the Sunlit/Eclipse clock that drives every other component.
//!
//! The cycle starts Sunlit with a zero timer. Each step adds the elapsed
//! time; when the timer reaches the current phase's duration the overshoot
//! is carried into the next phase (`timer -= duration`) and the phase
//! flips. Neither phase is terminal.

use cactus_types::{Notification, OrbitPhase};
use tracing::info;

use crate::config::OrbitConfig;

/// Two-state orbit timer.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCycle {
    phase: OrbitPhase,
    elapsed_in_phase: f64,
    sunlit_seconds: f64,
    eclipse_seconds: f64,
}

impl OrbitCycle {
    /// Create a cycle at the start of a Sunlit phase.
    pub const fn new(config: &OrbitConfig) -> Self {
        Self {
            phase: OrbitPhase::Sunlit,
            elapsed_in_phase: 0.0,
            sunlit_seconds: config.sunlit_seconds,
            eclipse_seconds: config.eclipse_seconds,
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> OrbitPhase {
        self.phase
    }

    /// Seconds spent in the current phase.
    pub const fn elapsed_in_phase(&self) -> f64 {
        self.elapsed_in_phase
    }

    /// Configured length of `phase`.
    pub const fn duration_of(&self, phase: OrbitPhase) -> f64 {
        match phase {
            OrbitPhase::Sunlit => self.sunlit_seconds,
            OrbitPhase::Eclipse => self.eclipse_seconds,
        }
    }

    /// Seconds left before the next phase change.
    pub const fn remaining_in_phase(&self) -> f64 {
        (self.duration_of(self.phase) - self.elapsed_in_phase).max(0.0)
    }

    /// Advance the timer, pushing one `OrbitPhaseChanged` per boundary crossed.
    ///
    /// A step longer than a whole phase crosses several boundaries; each
    /// one is reported in order.
    pub fn advance(&mut self, elapsed: f64, out: &mut Vec<Notification>) {
        self.elapsed_in_phase += elapsed;

        loop {
            let duration = self.duration_of(self.phase);
            if self.elapsed_in_phase < duration {
                break;
            }
            self.elapsed_in_phase -= duration;
            self.phase = self.phase.next();
            info!(phase = %self.phase, "Orbit phase changed");
            out.push(Notification::OrbitPhaseChanged(self.phase));
        }
    }
}
