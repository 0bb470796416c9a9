//! Input sources for the driver loop.
//!
//! Each step the driver shows the current [`SimulationSnapshot`] to a
//! [`Controller`] and applies the commands it returns before advancing.
//! The controller stands in for a player: it could be a keyboard binding,
//! a scripted bot, or a test stub.
//!
//! - [`Autopilot`] plays a simple survival policy.
//! - [`IdleController`] never issues a command.

use cactus_core::SimulationSnapshot;
use cactus_core::config::SimulationConfig;
use cactus_types::Command;

/// Degrees below the alive ceiling at which the autopilot fires the pulse.
const PULSE_MARGIN_C: f64 = 5.0;

/// Degrees below the alive ceiling at which the autopilot shuts the window.
const CLOSE_MARGIN_C: f64 = 2.0;

/// A source of player commands.
pub trait Controller {
    /// Commands to apply before the next step, in order.
    fn decide(&mut self, snapshot: &SimulationSnapshot) -> Vec<Command>;
}

/// A controller that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleController;

impl IdleController {
    /// Create an idle controller.
    pub const fn new() -> Self {
        Self
    }
}

impl Controller for IdleController {
    fn decide(&mut self, _snapshot: &SimulationSnapshot) -> Vec<Command> {
        Vec::new()
    }
}

/// A scripted survival policy.
///
/// In priority order each step:
///
/// 1. Buy the next missing upgrade (AC, then pulse, then auto-window levels).
/// 2. Manually open the window after a failed dawn.
/// 3. Fire the pulse when within [`PULSE_MARGIN_C`] of the alive ceiling.
/// 4. Otherwise close the window when within [`CLOSE_MARGIN_C`] of it.
#[derive(Debug, Clone)]
pub struct Autopilot {
    base_ceiling_c: f64,
    ac_ceiling_c: f64,
}

impl Autopilot {
    /// Create an autopilot tuned to `config`'s alive range.
    pub const fn new(config: &SimulationConfig) -> Self {
        Self {
            base_ceiling_c: config.thermal.base_max_alive_temp_c,
            ac_ceiling_c: config.thermal.ac_max_alive_temp_c,
        }
    }

    const fn ceiling(&self, snapshot: &SimulationSnapshot) -> f64 {
        if snapshot.ac_purchased {
            self.ac_ceiling_c
        } else {
            self.base_ceiling_c
        }
    }

    const fn next_purchase(snapshot: &SimulationSnapshot) -> Option<Command> {
        if !snapshot.ac_purchased {
            Some(Command::BuyAc)
        } else if !snapshot.pulse_purchased {
            Some(Command::BuyPulseUpgrade)
        } else if snapshot.auto_window_level < snapshot.max_auto_window_level {
            Some(Command::BuyAutoWindowUpgrade)
        } else {
            None
        }
    }
}

impl Controller for Autopilot {
    fn decide(&mut self, snapshot: &SimulationSnapshot) -> Vec<Command> {
        if !snapshot.started || !snapshot.alive {
            return Vec::new();
        }

        let mut commands: Vec<Command> = Self::next_purchase(snapshot).into_iter().collect();

        if snapshot.can_manually_open {
            commands.push(Command::ManualOpen);
            return commands;
        }

        let ceiling = self.ceiling(snapshot);
        if snapshot.can_pulse && snapshot.temperature_c >= ceiling - PULSE_MARGIN_C {
            commands.push(Command::TryPulse);
        } else if snapshot.can_close && snapshot.temperature_c >= ceiling - CLOSE_MARGIN_C {
            commands.push(Command::ManualClose);
        }
        commands
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cactus_core::Simulation;
    use cactus_core::config::WindowConfig;

    use super::*;

    fn snapshot(config: SimulationConfig) -> SimulationSnapshot {
        let mut sim = Simulation::seeded(config, 1).unwrap();
        sim.start();
        sim.snapshot()
    }

    fn pinned(fail_chance: f64) -> SimulationConfig {
        SimulationConfig {
            window: WindowConfig {
                base_auto_open_fail_chance: fail_chance,
                min_auto_open_fail_chance: 0.0,
                fail_chance_reduction_per_upgrade: 0.05,
            },
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn idle_never_acts() {
        let snap = snapshot(pinned(1.0));
        assert!(IdleController::new().decide(&snap).is_empty());
    }

    #[test]
    fn autopilot_buys_ac_first() {
        let config = pinned(0.0);
        let mut pilot = Autopilot::new(&config);
        let commands = pilot.decide(&snapshot(config));
        assert_eq!(commands, vec![Command::BuyAc]);
        assert!(commands.iter().all(|c| c.is_purchase()));
    }

    #[test]
    fn autopilot_opens_after_failed_dawn() {
        let config = pinned(1.0);
        let mut pilot = Autopilot::new(&config);
        let commands = pilot.decide(&snapshot(config));
        assert_eq!(commands, vec![Command::BuyAc, Command::ManualOpen]);
    }

    #[test]
    fn autopilot_closes_near_the_ceiling() {
        let config = pinned(0.0);
        let mut pilot = Autopilot::new(&config);
        let mut snap = snapshot(config);
        snap.ac_purchased = true;
        snap.pulse_purchased = true;
        snap.auto_window_level = snap.max_auto_window_level;
        snap.temperature_c = 113.5;
        assert_eq!(pilot.decide(&snap), vec![Command::ManualClose]);

        snap.temperature_c = 100.0;
        assert!(pilot.decide(&snap).is_empty());
    }

    #[test]
    fn autopilot_prefers_pulse_when_available() {
        let config = pinned(0.0);
        let mut pilot = Autopilot::new(&config);
        let mut snap = snapshot(config);
        snap.ac_purchased = true;
        snap.pulse_purchased = true;
        snap.auto_window_level = snap.max_auto_window_level;
        snap.can_pulse = true;
        snap.temperature_c = 111.0;
        assert_eq!(pilot.decide(&snap), vec![Command::TryPulse]);
    }

    #[test]
    fn autopilot_is_silent_once_dead() {
        let config = pinned(1.0);
        let mut pilot = Autopilot::new(&config);
        let mut snap = snapshot(config);
        snap.alive = false;
        assert!(pilot.decide(&snap).is_empty());
    }
}
