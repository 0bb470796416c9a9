//! Enumeration types for the Cactus Orbit simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Orbit
// ---------------------------------------------------------------------------

/// One of the two alternating orbit phases.
///
/// Sunlit allows the window to open and score to accrue; Eclipse forces the
/// window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrbitPhase {
    /// The enclosure faces the sun.
    Sunlit,
    /// The enclosure is in the planet's shadow.
    Eclipse,
}

impl OrbitPhase {
    /// The phase that follows this one.
    pub const fn next(self) -> Self {
        match self {
            Self::Sunlit => Self::Eclipse,
            Self::Eclipse => Self::Sunlit,
        }
    }
}

impl core::fmt::Display for OrbitPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Sunlit => write!(f, "sunlit"),
            Self::Eclipse => write!(f, "eclipse"),
        }
    }
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Physical state of the enclosure window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowState {
    /// Window open: the plant heats up.
    Open,
    /// Window closed: the plant cools down.
    Closed,
}

impl core::fmt::Display for WindowState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Hub topics
// ---------------------------------------------------------------------------

/// A named broadcast channel on the notification hub.
///
/// There is exactly one topic per published fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Orbit phase changed.
    OrbitPhase,
    /// Window state (and auto-failed flag) changed.
    WindowState,
    /// Plant temperature updated.
    Temperature,
    /// Plant died (one-shot).
    Death,
    /// Integer score changed.
    Score,
    /// Score multiplier changed.
    Multiplier,
    /// Safe-temperature streak crossed a whole second.
    SafeStreak,
    /// Auto-open fail chance recomputed.
    AutoOpenFailChance,
    /// AC purchase flag.
    AcPurchased,
    /// Cooling pulse purchase flag.
    AbilityPurchased,
    /// Cooling pulse readiness.
    AbilityReady,
    /// Cooling pulse fired (momentary).
    AbilityTriggered,
}

impl Topic {
    /// Every topic, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::OrbitPhase,
        Self::WindowState,
        Self::Temperature,
        Self::Death,
        Self::Score,
        Self::Multiplier,
        Self::SafeStreak,
        Self::AutoOpenFailChance,
        Self::AcPurchased,
        Self::AbilityPurchased,
        Self::AbilityReady,
        Self::AbilityTriggered,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_alternates() {
        assert_eq!(OrbitPhase::Sunlit.next(), OrbitPhase::Eclipse);
        assert_eq!(OrbitPhase::Eclipse.next(), OrbitPhase::Sunlit);
    }

    #[test]
    fn all_topics_are_distinct() {
        let mut topics = Topic::ALL.to_vec();
        topics.sort();
        topics.dedup();
        assert_eq!(topics.len(), Topic::ALL.len());
    }
}
