//! Facts published on the notification hub.
//!
//! A [`Notification`] is the payload of one publish. External collaborators
//! (rendering, audio, HUD) consume these and never mutate the core.

use serde::{Deserialize, Serialize};

use crate::enums::{OrbitPhase, Topic, WindowState};

/// Window state together with the outcome of the most recent dawn trial.
///
/// `auto_failed_this_dawn` is only ever `true` while `state` is
/// [`WindowState::Closed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowStatus {
    /// Current window state.
    pub state: WindowState,
    /// Whether the automatic opening at the last Sunlit transition failed.
    pub auto_failed_this_dawn: bool,
}

impl WindowStatus {
    /// The initial status: closed, no failed trial.
    pub const CLOSED: Self = Self {
        state: WindowState::Closed,
        auto_failed_this_dawn: false,
    };

    /// Whether the window is open.
    pub fn is_open(self) -> bool {
        self.state == WindowState::Open
    }
}

/// A single published fact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "value", rename_all = "snake_case")]
pub enum Notification {
    /// The orbit entered a new phase.
    OrbitPhaseChanged(OrbitPhase),
    /// The window changed state.
    WindowStateChanged(WindowStatus),
    /// Plant temperature in degrees Celsius.
    TemperatureChanged(f64),
    /// The plant died. Published exactly once per run.
    PlantDied,
    /// Integer score.
    ScoreChanged(u64),
    /// Score multiplier (a power of two).
    MultiplierChanged(u32),
    /// Safe-temperature streak in seconds.
    SafeStreakChanged(f64),
    /// Probability that the dawn auto-open fails.
    AutoOpenFailChanceChanged(f64),
    /// AC purchase flag.
    AcPurchasedChanged(bool),
    /// Cooling pulse purchase flag.
    AbilityPurchasedChanged(bool),
    /// Cooling pulse readiness.
    AbilityReadyChanged(bool),
    /// The cooling pulse fired.
    AbilityTriggered,
}

impl Notification {
    /// The hub topic this fact is published on.
    pub const fn topic(&self) -> Topic {
        match self {
            Self::OrbitPhaseChanged(_) => Topic::OrbitPhase,
            Self::WindowStateChanged(_) => Topic::WindowState,
            Self::TemperatureChanged(_) => Topic::Temperature,
            Self::PlantDied => Topic::Death,
            Self::ScoreChanged(_) => Topic::Score,
            Self::MultiplierChanged(_) => Topic::Multiplier,
            Self::SafeStreakChanged(_) => Topic::SafeStreak,
            Self::AutoOpenFailChanceChanged(_) => Topic::AutoOpenFailChance,
            Self::AcPurchasedChanged(_) => Topic::AcPurchased,
            Self::AbilityPurchasedChanged(_) => Topic::AbilityPurchased,
            Self::AbilityReadyChanged(_) => Topic::AbilityReady,
            Self::AbilityTriggered => Topic::AbilityTriggered,
        }
    }
}
