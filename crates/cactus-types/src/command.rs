//! Commands accepted by the simulation core.
//!
//! Input bindings, UI buttons and scripted players all speak this
//! vocabulary. Every command is safe to issue at any time; commands whose
//! preconditions do not hold are silent no-ops.

use serde::{Deserialize, Serialize};

/// A player-facing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Open the window after a failed dawn trial.
    ManualOpen,
    /// Close an open window.
    ManualClose,
    /// Buy one level of the auto-window upgrade.
    BuyAutoWindowUpgrade,
    /// Buy the AC (raises the alive ceiling).
    BuyAc,
    /// Buy the cooling pulse ability (requires AC).
    BuyPulseUpgrade,
    /// Fire the cooling pulse.
    TryPulse,
    /// Throw the run away and start over.
    ///
    /// The core only resets; whoever drives the loop re-subscribes its
    /// collaborators and starts the fresh run.
    Restart,
}

impl Command {
    /// Whether this command buys an upgrade.
    pub const fn is_purchase(self) -> bool {
        matches!(
            self,
            Self::BuyAutoWindowUpgrade | Self::BuyAc | Self::BuyPulseUpgrade
        )
    }
}
