//! Shared type definitions for the Cactus Orbit simulation.
//!
//! This crate holds the value types that cross component boundaries: the
//! facts published on the notification hub and the commands external
//! collaborators send back into the core.
//!
//! # Modules
//!
//! - [`enums`] -- Orbit phase, window state, and hub topics
//! - [`notification`] -- The published facts ([`Notification`]) and window status payload
//! - [`command`] -- Commands accepted by the simulation core

pub mod command;
pub mod enums;
pub mod notification;

// Re-export all public types at crate root for convenience.
pub use command::Command;
pub use enums::{OrbitPhase, Topic, WindowState};
pub use notification::{Notification, WindowStatus};
