//! Configuration loading and typed config structures for the Cactus Orbit
//! simulation.
//!
//! The canonical configuration lives in `cactus-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure, a loader,
//! and [`SimulationConfig::validate`], which is the only fatal error path
//! in the core: a configuration that fails validation never produces a
//! running simulation.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A field holds a value outside its permitted range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field (e.g. `orbit.sunlit_seconds`).
        field: &'static str,
        /// Explanation of what is wrong with the value.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `cactus-config.yaml`. All fields have defaults
/// matching the shipped tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Orbit phase durations.
    #[serde(default)]
    pub orbit: OrbitConfig,

    /// Auto-open fail probabilities and upgrade step.
    #[serde(default)]
    pub window: WindowConfig,

    /// Temperature integration and alive range.
    #[serde(default)]
    pub thermal: ThermalConfig,

    /// Score accrual and multiplier streak.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Cooling pulse ability.
    #[serde(default)]
    pub pulse: PulseConfig,

    /// Thresholds read by the plant appearance collaborator.
    #[serde(default)]
    pub appearance: AppearanceConfig,

    /// Driver loop settings (seed, step size, bounds).
    #[serde(default)]
    pub run: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the components rely on.
    ///
    /// Durations and rates must be positive and finite, probabilities must
    /// lie in `[0, 1]` with `min <= base`, temperature bands must not be
    /// inverted, and the multiplier cap must be a power of two.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.orbit.validate()?;
        self.window.validate()?;
        self.thermal.validate()?;
        self.scoring.validate()?;
        self.pulse.validate()?;
        self.run.validate()?;
        Ok(())
    }
}

/// Orbit phase durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitConfig {
    /// Length of the Sunlit phase in seconds.
    #[serde(default = "default_sunlit_seconds")]
    pub sunlit_seconds: f64,

    /// Length of the Eclipse phase in seconds.
    #[serde(default = "default_eclipse_seconds")]
    pub eclipse_seconds: f64,
}

impl OrbitConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("orbit.sunlit_seconds", self.sunlit_seconds)?;
        positive("orbit.eclipse_seconds", self.eclipse_seconds)
    }

    /// Length of one full orbit (Sunlit + Eclipse).
    pub const fn full_cycle_seconds(&self) -> f64 {
        self.sunlit_seconds + self.eclipse_seconds
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            sunlit_seconds: default_sunlit_seconds(),
            eclipse_seconds: default_eclipse_seconds(),
        }
    }
}

/// Auto-open fail probabilities and the upgrade that lowers them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Fail probability with no upgrades.
    #[serde(default = "default_base_fail_chance")]
    pub base_auto_open_fail_chance: f64,

    /// Floor the upgrades cannot push below.
    #[serde(default = "default_min_fail_chance")]
    pub min_auto_open_fail_chance: f64,

    /// Reduction per auto-window upgrade level.
    #[serde(default = "default_fail_chance_step")]
    pub fail_chance_reduction_per_upgrade: f64,
}

impl WindowConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        probability(
            "window.base_auto_open_fail_chance",
            self.base_auto_open_fail_chance,
        )?;
        probability(
            "window.min_auto_open_fail_chance",
            self.min_auto_open_fail_chance,
        )?;
        probability(
            "window.fail_chance_reduction_per_upgrade",
            self.fail_chance_reduction_per_upgrade,
        )?;
        if self.min_auto_open_fail_chance > self.base_auto_open_fail_chance {
            return Err(ConfigError::Invalid {
                field: "window.min_auto_open_fail_chance",
                reason: format!(
                    "{} exceeds base fail chance {}",
                    self.min_auto_open_fail_chance, self.base_auto_open_fail_chance
                ),
            });
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            base_auto_open_fail_chance: default_base_fail_chance(),
            min_auto_open_fail_chance: default_min_fail_chance(),
            fail_chance_reduction_per_upgrade: default_fail_chance_step(),
        }
    }
}

/// Temperature integration and alive range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalConfig {
    /// Temperature at the start of a run.
    #[serde(default = "default_starting_temp_c")]
    pub starting_temp_c: f64,

    /// Heating rate while the window is open (degrees per second).
    #[serde(default = "default_heat_per_second")]
    pub heat_per_second_open: f64,

    /// Cooling rate while the window is closed (degrees per second).
    #[serde(default = "default_cool_per_second")]
    pub cool_per_second_closed: f64,

    /// Lower bound of the alive range.
    #[serde(default = "default_base_min_alive")]
    pub base_min_alive_temp_c: f64,

    /// Upper bound of the alive range without AC.
    #[serde(default = "default_base_max_alive")]
    pub base_max_alive_temp_c: f64,

    /// Upper bound of the alive range once AC is purchased.
    #[serde(default = "default_ac_max_alive")]
    pub ac_max_alive_temp_c: f64,

    /// Continuous time outside the alive range before the plant dies.
    #[serde(default = "default_death_grace_seconds")]
    pub death_grace_seconds: f64,
}

impl ThermalConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        finite("thermal.starting_temp_c", self.starting_temp_c)?;
        positive("thermal.heat_per_second_open", self.heat_per_second_open)?;
        positive("thermal.cool_per_second_closed", self.cool_per_second_closed)?;
        positive("thermal.death_grace_seconds", self.death_grace_seconds)?;
        ordered(
            "thermal.base_max_alive_temp_c",
            self.base_min_alive_temp_c,
            self.base_max_alive_temp_c,
        )?;
        ordered(
            "thermal.ac_max_alive_temp_c",
            self.base_max_alive_temp_c,
            self.ac_max_alive_temp_c,
        )
    }
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            starting_temp_c: default_starting_temp_c(),
            heat_per_second_open: default_heat_per_second(),
            cool_per_second_closed: default_cool_per_second(),
            base_min_alive_temp_c: default_base_min_alive(),
            base_max_alive_temp_c: default_base_max_alive(),
            ac_max_alive_temp_c: default_ac_max_alive(),
            death_grace_seconds: default_death_grace_seconds(),
        }
    }
}

/// Score accrual and multiplier streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Base points per second while accruing.
    #[serde(default = "default_points_per_second")]
    pub points_per_second: f64,

    /// Lower bound of the safe range.
    #[serde(default = "default_safe_min")]
    pub safe_min_temp_c: f64,

    /// Upper bound of the safe range.
    #[serde(default = "default_safe_max")]
    pub safe_max_temp_c: f64,

    /// Continuous safe dwell needed for each doubling.
    #[serde(default = "default_seconds_per_multiplier_step")]
    pub seconds_per_multiplier_step: f64,

    /// Multiplier cap. Must be a power of two.
    #[serde(default = "default_max_multiplier")]
    pub max_multiplier: u32,
}

impl ScoringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("scoring.points_per_second", self.points_per_second)?;
        positive(
            "scoring.seconds_per_multiplier_step",
            self.seconds_per_multiplier_step,
        )?;
        ordered(
            "scoring.safe_max_temp_c",
            self.safe_min_temp_c,
            self.safe_max_temp_c,
        )?;
        if !self.max_multiplier.is_power_of_two() {
            return Err(ConfigError::Invalid {
                field: "scoring.max_multiplier",
                reason: format!(
                    "{} is not a power of two reachable by doubling from 1",
                    self.max_multiplier
                ),
            });
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points_per_second: default_points_per_second(),
            safe_min_temp_c: default_safe_min(),
            safe_max_temp_c: default_safe_max(),
            seconds_per_multiplier_step: default_seconds_per_multiplier_step(),
            max_multiplier: default_max_multiplier(),
        }
    }
}

/// Cooling pulse ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Score spent per pulse.
    #[serde(default = "default_pulse_cost")]
    pub cost_points: u64,

    /// Instant temperature drop applied by a pulse.
    #[serde(default = "default_pulse_temp_drop")]
    pub temp_drop_c: f64,

    /// How long the visual effect of a pulse lasts. Owned by collaborators.
    #[serde(default = "default_pulse_effect_duration")]
    pub effect_duration_seconds: f64,
}

impl PulseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        finite("pulse.temp_drop_c", self.temp_drop_c)?;
        if self.temp_drop_c < 0.0 {
            return Err(ConfigError::Invalid {
                field: "pulse.temp_drop_c",
                reason: format!("{} is negative", self.temp_drop_c),
            });
        }
        positive("pulse.effect_duration_seconds", self.effect_duration_seconds)
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            cost_points: default_pulse_cost(),
            temp_drop_c: default_pulse_temp_drop(),
            effect_duration_seconds: default_pulse_effect_duration(),
        }
    }
}

/// Thresholds read by the plant appearance collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppearanceConfig {
    /// The plant flowers once the score exceeds this value.
    #[serde(default = "default_flower_score_threshold")]
    pub flower_score_threshold: u64,

    /// The plant grows thorns above this temperature.
    #[serde(default = "default_thorns_temp_threshold")]
    pub thorns_temp_threshold_c: f64,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            flower_score_threshold: default_flower_score_threshold(),
            thorns_temp_threshold_c: default_thorns_temp_threshold(),
        }
    }
}

/// Driver loop settings.
///
/// A value of 0 for `max_seconds` means the run is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed for the auto-open trial random source.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated seconds advanced per driver step.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,

    /// Simulated seconds before the run ends (0 = unbounded).
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,

    /// Pace steps against the wall clock instead of running flat out.
    #[serde(default)]
    pub realtime: bool,

    /// Reset and start again when the plant dies.
    #[serde(default)]
    pub restart_on_death: bool,

    /// Upper bound on automatic restarts per run.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Drive the run with the autopilot instead of leaving it idle.
    #[serde(default = "default_autopilot")]
    pub autopilot: bool,
}

impl RunConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("run.tick_seconds", self.tick_seconds)?;
        finite("run.max_seconds", self.max_seconds)?;
        if self.max_seconds < 0.0 {
            return Err(ConfigError::Invalid {
                field: "run.max_seconds",
                reason: format!("{} is negative", self.max_seconds),
            });
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_seconds: default_tick_seconds(),
            max_seconds: default_max_seconds(),
            realtime: false,
            restart_on_death: false,
            max_restarts: default_max_restarts(),
            autopilot: default_autopilot(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is not a finite number"),
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be greater than zero"),
        })
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside [0, 1]"),
        })
    }
}

/// `upper` is the field being reported; it must not be below `lower`.
fn ordered(field: &'static str, lower: f64, upper: f64) -> Result<(), ConfigError> {
    finite(field, lower)?;
    finite(field, upper)?;
    if lower <= upper {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{upper} is below {lower}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_sunlit_seconds() -> f64 {
    60.0
}

const fn default_eclipse_seconds() -> f64 {
    30.0
}

const fn default_base_fail_chance() -> f64 {
    0.25
}

const fn default_min_fail_chance() -> f64 {
    0.10
}

const fn default_fail_chance_step() -> f64 {
    0.05
}

const fn default_starting_temp_c() -> f64 {
    22.0
}

const fn default_heat_per_second() -> f64 {
    1.0
}

const fn default_cool_per_second() -> f64 {
    2.0
}

const fn default_base_min_alive() -> f64 {
    0.0
}

const fn default_base_max_alive() -> f64 {
    80.0
}

const fn default_ac_max_alive() -> f64 {
    115.0
}

const fn default_death_grace_seconds() -> f64 {
    3.0
}

const fn default_points_per_second() -> f64 {
    1.0
}

const fn default_safe_min() -> f64 {
    10.0
}

const fn default_safe_max() -> f64 {
    60.0
}

const fn default_seconds_per_multiplier_step() -> f64 {
    30.0
}

const fn default_max_multiplier() -> u32 {
    4
}

const fn default_pulse_cost() -> u64 {
    20
}

const fn default_pulse_temp_drop() -> f64 {
    10.0
}

const fn default_pulse_effect_duration() -> f64 {
    1.5
}

const fn default_flower_score_threshold() -> u64 {
    100
}

const fn default_thorns_temp_threshold() -> f64 {
    80.0
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_seconds() -> f64 {
    0.05
}

const fn default_max_seconds() -> f64 {
    600.0
}

const fn default_max_restarts() -> u32 {
    3
}

const fn default_autopilot() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_owned()
}
