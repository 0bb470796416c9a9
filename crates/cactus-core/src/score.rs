//! Score engine: point accrual and the safe-temperature multiplier streak.
//!
//! Two machines share one step:
//!
//! - **Streak**: while alive with the temperature inside the inclusive
//!   safe range, the streak timer accumulates. Each time it reaches the
//!   step duration it loses one step (overshoot kept) and the multiplier
//!   doubles, up to the cap. Leaving the range resets the streak to 0 and
//!   the multiplier to 1 on the same step.
//! - **Accrual**: while Sunlit with the window open and the plant alive,
//!   `points_per_second * multiplier * elapsed` is added to a fractional
//!   carry; whole points are flushed into the integer score.
//!
//! The multiplier is published only when it changes; the streak only when
//! its whole-second value changes.

use cactus_types::{Notification, OrbitPhase, WindowState};
use tracing::{debug, info};

use crate::config::ScoringConfig;

/// Score, multiplier and streak state.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEngine {
    score: u64,
    carry: f64,
    multiplier: u32,
    streak_seconds: f64,
    last_published_streak: Option<u64>,
    phase: OrbitPhase,
    window: WindowState,
    temperature_c: f64,
    alive: bool,
    config: ScoringConfig,
}

impl ScoreEngine {
    /// Create an engine with zero score and multiplier 1.
    ///
    /// `starting_temp_c` seeds the observed temperature until the thermal
    /// model publishes one.
    pub fn new(config: &ScoringConfig, starting_temp_c: f64) -> Self {
        Self {
            score: 0,
            carry: 0.0,
            multiplier: 1,
            streak_seconds: 0.0,
            last_published_streak: None,
            phase: OrbitPhase::Sunlit,
            window: WindowState::Closed,
            temperature_c: starting_temp_c,
            alive: true,
            config: config.clone(),
        }
    }

    /// Integer score.
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Fractional points not yet flushed into the score.
    pub const fn carry(&self) -> f64 {
        self.carry
    }

    /// Current multiplier.
    pub const fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Seconds accumulated toward the next multiplier step.
    pub const fn streak_seconds(&self) -> f64 {
        self.streak_seconds
    }

    /// Whether points accrue this step.
    pub fn is_accruing(&self) -> bool {
        self.phase == OrbitPhase::Sunlit && self.window == WindowState::Open && self.alive
    }

    /// Whether the observed temperature is inside the safe range.
    pub fn in_safe_range(&self) -> bool {
        (self.config.safe_min_temp_c..=self.config.safe_max_temp_c).contains(&self.temperature_c)
    }

    /// Record the orbit phase.
    pub const fn observe_phase(&mut self, phase: OrbitPhase) {
        self.phase = phase;
    }

    /// Record the window state.
    pub const fn observe_window(&mut self, state: WindowState) {
        self.window = state;
    }

    /// Record the latest published temperature.
    pub const fn observe_temperature(&mut self, temperature_c: f64) {
        self.temperature_c = temperature_c;
    }

    /// React to the plant's death: the streak and multiplier collapse.
    pub fn observe_death(&mut self, out: &mut Vec<Notification>) {
        self.alive = false;
        self.break_streak(out);
    }

    /// Run one step of both machines.
    pub fn advance(&mut self, elapsed: f64, out: &mut Vec<Notification>) {
        if !self.alive {
            return;
        }

        self.advance_streak(elapsed, out);

        if self.is_accruing() {
            let points = self.config.points_per_second * f64::from(self.multiplier) * elapsed;
            self.add_points(points, out);
        }
    }

    /// Deduct `cost` from the score.
    ///
    /// A zero cost always succeeds without publishing. Returns `false`
    /// without touching anything when the score is short.
    pub fn try_spend(&mut self, cost: u64, out: &mut Vec<Notification>) -> bool {
        if cost == 0 {
            return true;
        }
        if self.score < cost {
            debug!(score = self.score, cost, "Spend refused, score too low");
            return false;
        }

        self.score -= cost;
        self.carry = 0.0;
        info!(cost, score = self.score, "Score spent");
        out.push(Notification::ScoreChanged(self.score));
        true
    }

    /// Push score, multiplier and streak (used at run start).
    pub fn publish_all(&mut self, out: &mut Vec<Notification>) {
        out.push(Notification::ScoreChanged(self.score));
        out.push(Notification::MultiplierChanged(self.multiplier));
        self.last_published_streak = None;
        self.publish_streak_if_changed(out);
    }

    fn advance_streak(&mut self, elapsed: f64, out: &mut Vec<Notification>) {
        if !self.in_safe_range() {
            self.break_streak(out);
            return;
        }

        self.streak_seconds += elapsed;
        let step = self.config.seconds_per_multiplier_step;
        while self.streak_seconds >= step && self.multiplier < self.config.max_multiplier {
            self.streak_seconds -= step;
            self.set_multiplier(self.multiplier.saturating_mul(2), out);
        }
        self.publish_streak_if_changed(out);
    }

    fn break_streak(&mut self, out: &mut Vec<Notification>) {
        if self.streak_seconds > 0.0 || self.multiplier != 1 {
            debug!(
                streak_seconds = self.streak_seconds,
                multiplier = self.multiplier,
                "Safe streak broken"
            );
        }
        self.streak_seconds = 0.0;
        self.publish_streak_if_changed(out);
        self.set_multiplier(1, out);
    }

    fn set_multiplier(&mut self, multiplier: u32, out: &mut Vec<Notification>) {
        let multiplier = multiplier.clamp(1, self.config.max_multiplier);
        if multiplier == self.multiplier {
            return;
        }
        self.multiplier = multiplier;
        info!(multiplier, "Multiplier changed");
        out.push(Notification::MultiplierChanged(multiplier));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn add_points(&mut self, points: f64, out: &mut Vec<Notification>) {
        let total = self.carry + points;
        let whole = total.floor();
        if whole >= 1.0 {
            // total is finite and non-negative here.
            self.score = self.score.saturating_add(whole as u64);
            out.push(Notification::ScoreChanged(self.score));
        }
        self.carry = total - whole;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn publish_streak_if_changed(&mut self, out: &mut Vec<Notification>) {
        let whole = self.streak_seconds.floor() as u64;
        if self.last_published_streak == Some(whole) {
            return;
        }
        self.last_published_streak = Some(whole);
        out.push(Notification::SafeStreakChanged(self.streak_seconds));
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn engine() -> ScoreEngine {
        let mut engine = ScoreEngine::new(&ScoringConfig::default(), 22.0);
        engine.publish_all(&mut Vec::new());
        engine
    }

    fn accruing() -> ScoreEngine {
        let mut engine = engine();
        engine.observe_window(WindowState::Open);
        engine
    }

    fn multipliers(out: &[Notification]) -> Vec<u32> {
        out.iter()
            .filter_map(|n| match n {
                Notification::MultiplierChanged(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn publish_all_reports_initial_state() {
        let mut engine = ScoreEngine::new(&ScoringConfig::default(), 22.0);
        let mut out = Vec::new();
        engine.publish_all(&mut out);
        assert_eq!(
            out,
            vec![
                Notification::ScoreChanged(0),
                Notification::MultiplierChanged(1),
                Notification::SafeStreakChanged(0.0),
            ]
        );
    }

    #[test]
    fn accrues_only_when_sunlit_open_and_alive() {
        let mut engine = engine();
        let mut out = Vec::new();
        engine.advance(5.0, &mut out);
        assert_eq!(engine.score(), 0, "window closed");

        engine.observe_window(WindowState::Open);
        engine.observe_phase(OrbitPhase::Eclipse);
        engine.advance(5.0, &mut out);
        assert_eq!(engine.score(), 0, "eclipse");

        engine.observe_phase(OrbitPhase::Sunlit);
        engine.advance(5.0, &mut out);
        assert_eq!(engine.score(), 5);
    }

    #[test]
    fn fractional_points_carry_without_drift() {
        let mut engine = accruing();
        let mut out = Vec::new();
        for _ in 0..40 {
            engine.advance(0.25, &mut out);
        }
        assert_eq!(engine.score(), 10);
        assert_eq!(engine.carry(), 0.0);
        let scores = out
            .iter()
            .filter(|n| matches!(n, Notification::ScoreChanged(_)))
            .count();
        assert_eq!(scores, 10);
    }

    #[test]
    fn multiplier_doubles_exactly_at_step() {
        let mut engine = engine();
        let mut out = Vec::new();
        for _ in 0..59 {
            engine.advance(0.5, &mut out);
        }
        assert!(multipliers(&out).is_empty());

        engine.advance(0.5, &mut out);
        assert_eq!(multipliers(&out), vec![2]);
        assert_eq!(engine.streak_seconds(), 0.0);
    }

    #[test]
    fn long_step_doubles_repeatedly_up_to_cap() {
        let mut engine = engine();
        let mut out = Vec::new();
        engine.advance(100.0, &mut out);
        assert_eq!(multipliers(&out), vec![2, 4]);
        assert_eq!(engine.multiplier(), 4);
        // Streak keeps running once capped.
        assert_eq!(engine.streak_seconds(), 40.0);
    }

    #[test]
    fn leaving_safe_range_resets_on_same_step() {
        let mut engine = engine();
        let mut out = Vec::new();
        engine.advance(45.0, &mut out);
        assert_eq!(engine.multiplier(), 2);

        out.clear();
        engine.observe_temperature(61.0);
        engine.advance(0.1, &mut out);
        assert_eq!(engine.multiplier(), 1);
        assert_eq!(engine.streak_seconds(), 0.0);
        assert_eq!(
            out,
            vec![
                Notification::SafeStreakChanged(0.0),
                Notification::MultiplierChanged(1),
            ]
        );

        out.clear();
        engine.advance(0.1, &mut out);
        assert!(out.is_empty(), "nothing changes while out of range");
    }

    #[test]
    fn safe_range_is_inclusive() {
        let mut engine = engine();
        engine.observe_temperature(10.0);
        assert!(engine.in_safe_range());
        engine.observe_temperature(60.0);
        assert!(engine.in_safe_range());
        engine.observe_temperature(60.5);
        assert!(!engine.in_safe_range());
    }

    #[test]
    fn streak_published_on_whole_second_change() {
        let mut engine = engine();
        let mut out = Vec::new();
        for _ in 0..8 {
            engine.advance(0.25, &mut out);
        }
        assert_eq!(
            out,
            vec![
                Notification::SafeStreakChanged(1.0),
                Notification::SafeStreakChanged(2.0),
            ]
        );
    }

    #[test]
    fn death_collapses_multiplier_and_stops_accrual() {
        let mut engine = accruing();
        let mut out = Vec::new();
        engine.advance(30.0, &mut out);
        let score = engine.score();

        out.clear();
        engine.observe_death(&mut out);
        assert_eq!(engine.multiplier(), 1);
        assert!(out.contains(&Notification::MultiplierChanged(1)));

        out.clear();
        engine.advance(10.0, &mut out);
        assert_eq!(engine.score(), score);
        assert!(out.is_empty());
    }

    #[test]
    fn try_spend_rules() {
        let mut engine = accruing();
        let mut out = Vec::new();
        engine.advance(15.5, &mut out);
        assert_eq!(engine.score(), 15);

        out.clear();
        assert!(!engine.try_spend(20, &mut out));
        assert_eq!(engine.score(), 15);
        assert_eq!(engine.carry(), 0.5);
        assert!(out.is_empty());

        assert!(engine.try_spend(0, &mut out));
        assert!(out.is_empty());

        assert!(engine.try_spend(10, &mut out));
        assert_eq!(engine.score(), 5);
        assert_eq!(engine.carry(), 0.0);
        assert_eq!(out, vec![Notification::ScoreChanged(5)]);
    }
}
