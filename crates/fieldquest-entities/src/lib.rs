//! NPC motion, the survival resource, and the player inventory for the
//! FieldQuest adventure engine.
//!
//! This crate contains the per-entity logic layer: everything that mutates
//! player or NPC state without touching I/O or timers. It sits between
//! `fieldquest-types` (the data structures) and `fieldquest-core` (which
//! decides when each controller runs).
//!
//! # Modules
//!
//! - [`config`] -- Tunable motion and survival parameters ([`MotionConfig`], [`SurvivalConfig`])
//! - [`error`] -- Error types ([`EntityError`])
//! - [`inventory`] -- Bounded item counts on the player
//! - [`motion`] -- Guard/flee/rest/caught state machine ([`MotionController`])
//! - [`survival`] -- Warmth decay and freeze/thaw ([`SurvivalController`])

pub mod config;
pub mod error;
pub mod inventory;
pub mod motion;
pub mod survival;

// Re-export primary types at crate root for convenience.
pub use config::{MotionConfig, SurvivalConfig};
pub use error::EntityError;
pub use inventory::{grant_items, remove_item};
pub use motion::{MotionController, Transition};
pub use survival::{MAX_LEVEL, SurvivalController, SurvivalOutcome};
