//! Simulation core for Cactus Orbit.
//!
//! This crate owns the interacting state machines and the coordinator that
//! advances them: an orbit clock drives a window, the window drives the
//! plant's temperature, and the temperature drives the score multiplier.
//! An upgrade ledger and a cooling pulse feed back into the loop.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `cactus-config.yaml` into
//!   strongly-typed, validated structs.
//! - [`hub`] -- [`NotificationHub`], the synchronous publish/subscribe layer.
//! - [`orbit`] -- Sunlit/Eclipse timer.
//! - [`window`] -- Window state machine with the dawn auto-open trial.
//! - [`thermal`] -- Temperature integration and grace-period death.
//! - [`score`] -- Point accrual and the safe-streak multiplier.
//! - [`upgrades`] -- Purchase ledger and the derived fail chance.
//! - [`pulse`] -- Cooling pulse readiness gate.
//! - [`simulation`] -- [`Simulation`], which routes facts between the
//!   components and exposes the command surface.
//!
//! [`NotificationHub`]: hub::NotificationHub
//! [`Simulation`]: simulation::Simulation

pub mod config;
pub mod hub;
pub mod orbit;
pub mod pulse;
pub mod score;
pub mod simulation;
pub mod thermal;
pub mod upgrades;
pub mod window;

pub use config::{ConfigError, SimulationConfig};
pub use hub::{NotificationHub, SubscriptionId};
pub use simulation::{Simulation, SimulationSnapshot};
pub use thermal::DeathCause;
