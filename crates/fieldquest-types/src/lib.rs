//! Shared type definitions for the FieldQuest adventure engine.
//!
//! This crate is the single source of truth for the data exchanged between
//! the simulation core and its collaborators (map rendering, notifications,
//! result persistence). Types flow to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for checkpoints and NPCs
//! - [`enums`] -- NPC states, transition causes, checkpoint status
//! - [`structs`] -- Positions, checkpoints, player, NPCs, snapshots
//! - [`events`] -- Game events and scoring deltas

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    CheckpointRequirement, CheckpointStatus, InteractionOutcome, NpcState, TransitionCause,
};
pub use events::{GameEvent, ScoreDelta};
pub use ids::{CheckpointId, NpcId};
pub use structs::{
    ChannelGains, Checkpoint, EntitySnapshot, EventSetup, GeoPoint, Interaction, NpcEntity,
    PlayerSnapshot, PlayerState, PositionSample, WhiteoutState,
};
