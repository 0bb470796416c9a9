//! Cooling pulse: the once-per-orbit active ability.
//!
//! The pulse is usable when it has been purchased, is ready, and the plant
//! is alive. Firing it (see [`Simulation::try_pulse`]) spends score and
//! cools the plant; readiness then stays false until the next Sunlit
//! transition. Eclipse never touches readiness.
//!
//! [`Simulation::try_pulse`]: crate::simulation::Simulation::try_pulse

use cactus_types::{Notification, OrbitPhase};
use tracing::{debug, info};

/// Readiness gate for the cooling pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoolingPulse {
    purchased: bool,
    ready: bool,
    dead: bool,
}

impl CoolingPulse {
    /// Create an unpurchased pulse.
    pub const fn new() -> Self {
        Self {
            purchased: false,
            ready: false,
            dead: false,
        }
    }

    /// Whether the pulse has been bought.
    pub const fn is_purchased(&self) -> bool {
        self.purchased
    }

    /// Whether the pulse is armed for this orbit.
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether a trigger would pass the gate (score is checked separately).
    pub const fn can_pulse(&self) -> bool {
        self.purchased && self.ready && !self.dead
    }

    /// Record the purchase flag. A purchase arms the pulse immediately; the
    /// ledger publishes that readiness itself.
    pub const fn observe_purchased(&mut self, purchased: bool) {
        self.purchased = purchased;
        if purchased {
            self.ready = true;
        }
    }

    /// Re-arm on each Sunlit transition while purchased.
    pub fn observe_phase(&mut self, phase: OrbitPhase, out: &mut Vec<Notification>) {
        if phase != OrbitPhase::Sunlit || !self.purchased {
            return;
        }
        self.ready = true;
        debug!("Cooling pulse re-armed for the new orbit");
        out.push(Notification::AbilityReadyChanged(true));
    }

    /// Record the plant's death. The pulse stays unusable afterwards.
    pub const fn observe_death(&mut self) {
        self.dead = true;
    }

    /// Disarm after a successful trigger and announce it.
    pub fn consume(&mut self, out: &mut Vec<Notification>) {
        self.ready = false;
        info!("Cooling pulse fired, used until next Sunlit");
        out.push(Notification::AbilityReadyChanged(false));
        out.push(Notification::AbilityTriggered);
    }

    /// Push readiness (used at run start).
    pub fn publish(&self, out: &mut Vec<Notification>) {
        out.push(Notification::AbilityReadyChanged(self.ready));
    }
}
