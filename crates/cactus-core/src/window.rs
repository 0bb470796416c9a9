//! Window controller: the Open/Closed state machine.
//!
//! # Transitions
//!
//! | Trigger | Precondition | Result |
//! |---|---|---|
//! | Sunlit begins | trial fails | Closed, `auto_failed = true` |
//! | Sunlit begins | trial succeeds | Open, `auto_failed = false` |
//! | Eclipse begins | none | Closed, `auto_failed = false` |
//! | Manual open | Sunlit, Closed, `auto_failed` | Open, `auto_failed = false` |
//! | Manual close | Open | Closed, `auto_failed = false` |
//!
//! The auto-failed flag is only ever set while Closed; opening the window
//! by any route clears it. Commands whose precondition does not hold are
//! no-ops and publish nothing.

use cactus_types::{Notification, OrbitPhase, WindowState, WindowStatus};
use rand::Rng;
use tracing::{debug, info};

/// Window state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowController {
    status: WindowStatus,
    phase: OrbitPhase,
    fail_chance: f64,
}

impl WindowController {
    /// Create a closed window, assuming Sunlit and the base fail chance
    /// until told otherwise.
    pub const fn new(base_fail_chance: f64) -> Self {
        Self {
            status: WindowStatus::CLOSED,
            phase: OrbitPhase::Sunlit,
            fail_chance: base_fail_chance,
        }
    }

    /// Current status.
    pub const fn status(&self) -> WindowStatus {
        self.status
    }

    /// Fail chance the next dawn trial will use.
    pub const fn fail_chance(&self) -> f64 {
        self.fail_chance
    }

    /// Whether a manual open would succeed right now.
    pub fn can_manually_open(&self) -> bool {
        self.phase == OrbitPhase::Sunlit
            && self.status.state == WindowState::Closed
            && self.status.auto_failed_this_dawn
    }

    /// Whether a manual close would succeed right now.
    pub fn can_close(&self) -> bool {
        self.status.state == WindowState::Open
    }

    /// Record a newly published fail chance.
    pub fn observe_fail_chance(&mut self, chance: f64) {
        self.fail_chance = chance.clamp(0.0, 1.0);
    }

    /// React to an orbit phase change.
    ///
    /// Entering Sunlit runs one Bernoulli trial with a single draw from
    /// `rng`; entering Eclipse force-closes the window.
    pub fn observe_phase<R: Rng>(
        &mut self,
        phase: OrbitPhase,
        rng: &mut R,
        out: &mut Vec<Notification>,
    ) {
        self.phase = phase;
        match phase {
            OrbitPhase::Sunlit => self.run_dawn_trial(rng, out),
            OrbitPhase::Eclipse => self.set(WindowState::Closed, false, out),
        }
    }

    /// Open the window after a failed dawn trial.
    pub fn manual_open(&mut self, out: &mut Vec<Notification>) {
        if !self.can_manually_open() {
            debug!(
                phase = %self.phase,
                state = %self.status.state,
                auto_failed = self.status.auto_failed_this_dawn,
                "Manual open blocked"
            );
            return;
        }
        info!("Window manually opened");
        self.set(WindowState::Open, false, out);
    }

    /// Close an open window.
    pub fn manual_close(&mut self, out: &mut Vec<Notification>) {
        if !self.can_close() {
            debug!("Manual close blocked, window already closed");
            return;
        }
        info!("Window manually closed");
        self.set(WindowState::Closed, false, out);
    }

    /// Push the current status (used at run start).
    pub fn publish(&self, out: &mut Vec<Notification>) {
        out.push(Notification::WindowStateChanged(self.status));
    }

    fn run_dawn_trial<R: Rng>(&mut self, rng: &mut R, out: &mut Vec<Notification>) {
        let roll: f64 = rng.random();
        if roll < self.fail_chance {
            info!(fail_chance = self.fail_chance, "Auto-open failed at dawn");
            self.set(WindowState::Closed, true, out);
        } else {
            info!(fail_chance = self.fail_chance, "Auto-open succeeded at dawn");
            self.set(WindowState::Open, false, out);
        }
    }

    fn set(&mut self, state: WindowState, auto_failed: bool, out: &mut Vec<Notification>) {
        self.status = WindowStatus {
            state,
            // The flag never survives an open window.
            auto_failed_this_dawn: auto_failed && state == WindowState::Closed,
        };
        out.push(Notification::WindowStateChanged(self.status));
    }
}
