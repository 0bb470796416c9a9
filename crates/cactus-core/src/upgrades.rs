//! Upgrade economy: the purchase ledger and the values derived from it.
//!
//! The ledger has no time dependency. Each purchase is one-way and
//! idempotent: buying something already owned, past its maximum level, or
//! without its prerequisite is a no-op with a diagnostic.
//!
//! | Upgrade | Effect | Prerequisite |
//! |---|---|---|
//! | Auto window (levelled) | fail chance `max(min, base - level * step)` | none |
//! | AC | alive ceiling raised to the AC value | none |
//! | Cooling pulse | unlocks the once-per-orbit pulse | AC |

use cactus_types::Notification;
use tracing::{debug, info};

use crate::config::WindowConfig;

/// Tolerance applied before rounding the level count up, so that a ratio
/// like `0.15 / 0.05` that lands a hair above 3 still yields 3 levels.
const LEVEL_EPSILON: f64 = 1e-9;

/// Purchase ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeEconomy {
    auto_window_level: u32,
    max_auto_window_level: u32,
    ac_purchased: bool,
    pulse_purchased: bool,
    base_fail: f64,
    min_fail: f64,
    step: f64,
}

impl UpgradeEconomy {
    /// Create an empty ledger.
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            auto_window_level: 0,
            max_auto_window_level: max_auto_window_level(config),
            ac_purchased: false,
            pulse_purchased: false,
            base_fail: config.base_auto_open_fail_chance,
            min_fail: config.min_auto_open_fail_chance,
            step: config.fail_chance_reduction_per_upgrade,
        }
    }

    /// Current auto-window upgrade level.
    pub const fn auto_window_level(&self) -> u32 {
        self.auto_window_level
    }

    /// Highest reachable auto-window level.
    pub const fn max_auto_window_level(&self) -> u32 {
        self.max_auto_window_level
    }

    /// Whether the AC has been bought.
    pub const fn ac_purchased(&self) -> bool {
        self.ac_purchased
    }

    /// Whether the cooling pulse has been bought.
    pub const fn pulse_purchased(&self) -> bool {
        self.pulse_purchased
    }

    /// Fail chance at the current level, clamped to the configured floor.
    pub fn auto_open_fail_chance(&self) -> f64 {
        let reduced = self.step.mul_add(-f64::from(self.auto_window_level), self.base_fail);
        reduced.max(self.min_fail)
    }

    /// Buy one auto-window level and publish the new fail chance.
    pub fn buy_auto_window_upgrade(&mut self, out: &mut Vec<Notification>) {
        if self.auto_window_level >= self.max_auto_window_level {
            debug!(
                level = self.auto_window_level,
                fail_chance = self.auto_open_fail_chance(),
                "Auto-window upgrade already at max"
            );
            return;
        }

        self.auto_window_level = self.auto_window_level.saturating_add(1);
        let fail_chance = self.auto_open_fail_chance();
        info!(
            level = self.auto_window_level,
            max_level = self.max_auto_window_level,
            fail_chance,
            "Auto-window upgrade purchased"
        );
        out.push(Notification::AutoOpenFailChanceChanged(fail_chance));
    }

    /// Buy the AC.
    pub fn buy_ac(&mut self, out: &mut Vec<Notification>) {
        if self.ac_purchased {
            debug!("AC already purchased");
            return;
        }

        self.ac_purchased = true;
        info!("AC purchased, alive ceiling raised");
        out.push(Notification::AcPurchasedChanged(true));
    }

    /// Buy the cooling pulse. The first purchase also makes it ready.
    pub fn buy_pulse_upgrade(&mut self, out: &mut Vec<Notification>) {
        if !self.ac_purchased {
            debug!("Cooling pulse requires AC first");
            return;
        }
        if self.pulse_purchased {
            debug!("Cooling pulse already purchased");
            return;
        }

        self.pulse_purchased = true;
        info!("Cooling pulse purchased");
        out.push(Notification::AbilityPurchasedChanged(true));
        out.push(Notification::AbilityReadyChanged(true));
    }

    /// Push the full ledger state (used at run start).
    pub fn publish_all(&self, out: &mut Vec<Notification>) {
        out.push(Notification::AutoOpenFailChanceChanged(
            self.auto_open_fail_chance(),
        ));
        out.push(Notification::AcPurchasedChanged(self.ac_purchased));
        out.push(Notification::AbilityPurchasedChanged(self.pulse_purchased));
    }
}

/// `ceil((base - min) / step)`, or 0 when the step is not positive.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn max_auto_window_level(config: &WindowConfig) -> u32 {
    let step = config.fail_chance_reduction_per_upgrade;
    if step <= 0.0 {
        return 0;
    }
    let needed =
        (config.base_auto_open_fail_chance - config.min_auto_open_fail_chance).max(0.0);
    // Probabilities are in [0, 1] and step > 0, so the ratio is finite and
    // non-negative; the cast saturates for absurdly small steps.
    (needed / step - LEVEL_EPSILON).ceil().max(0.0) as u32
}
