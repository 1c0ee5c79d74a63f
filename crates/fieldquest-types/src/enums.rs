//! Enumeration types for the FieldQuest adventure engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// NPC state machine
// ---------------------------------------------------------------------------

/// Behavioural state of a non-player entity.
///
/// `Guarding` is the initial state and `Caught` is terminal: once caught,
/// an entity is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum NpcState {
    /// Stationary at its spawn point, watching for the player.
    #[default]
    Guarding,
    /// Running away from the player.
    Fleeing,
    /// Catching its breath; stationary until the rest timer expires.
    Resting,
    /// Caught by the player. Terminal.
    Caught,
}

impl NpcState {
    /// Whether the entity can still change state.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Caught)
    }
}

/// Why an NPC changed state. Reported to the caller for UI messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TransitionCause {
    /// Guarding entity noticed the player inside its detection radius.
    Spotted,
    /// Fleeing entity put more than the lost threshold between itself and
    /// the player.
    Escaped,
    /// The sprint timer ran out.
    TimedOut,
    /// The rest timer ran out and the entity is running again.
    Recovered,
    /// The player got within the catch radius.
    Caught,
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// Whether a checkpoint must be visited to finish the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CheckpointRequirement {
    /// Required for completion.
    #[default]
    Mandatory,
    /// Bonus checkpoint.
    Optional,
}

/// Detection progress of a single checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CheckpointStatus {
    /// Player has not been inside the radius yet.
    #[default]
    Unvisited,
    /// Player entered the radius; waiting for the quiz or challenge result.
    AwaitingInteraction,
    /// Completed. One-shot: never leaves this state.
    Visited,
}

/// Result of a quiz or challenge, reported by the external UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum InteractionOutcome {
    /// Answered correctly or challenge completed: full points.
    Correct,
    /// Wrong answer or challenge failed: checkpoint closes with no points.
    Incorrect,
}
