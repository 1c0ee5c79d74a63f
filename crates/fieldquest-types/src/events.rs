//! Discrete game events and scoring deltas produced by the simulation.
//!
//! Events feed the notification layer; score deltas feed result
//! persistence. Both serialize as plain JSON objects so the web client can
//! consume them through the generated `TypeScript` bindings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{CheckpointId, NpcId};
use crate::structs::Interaction;

/// A discrete, user-visible occurrence.
///
/// Serialized adjacently tagged: `{"type": "caught", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GameEvent {
    /// A guarding entity noticed the player and started to flee.
    Spotted {
        /// The entity.
        npc_id: NpcId,
        /// Its display name.
        name: String,
    },
    /// The player caught an entity. Emitted once per entity.
    Caught {
        /// The entity.
        npc_id: NpcId,
        /// Its display name.
        name: String,
    },
    /// A fleeing entity escaped beyond the lost threshold and stopped to rest.
    Lost {
        /// The entity.
        npc_id: NpcId,
        /// Its display name.
        name: String,
    },
    /// A fleeing entity ran out of sprint time and stopped to rest.
    Rested {
        /// The entity.
        npc_id: NpcId,
        /// Its display name.
        name: String,
    },
    /// A resting entity started running again.
    Recovered {
        /// The entity.
        npc_id: NpcId,
        /// Its display name.
        name: String,
    },
    /// The player's warmth ran out.
    Frozen {
        /// Seconds added to the elapsed-time score.
        penalty_seconds: u64,
        /// Whether an inventory item was lost.
        item_lost: bool,
        /// Items left after the loss.
        inventory: u32,
        /// When the player thaws.
        thaw_at: DateTime<Utc>,
    },
    /// The freeze ended.
    Thawed {
        /// Warmth restored by the thaw.
        resource_level: f64,
    },
    /// A checkpoint was completed.
    CheckpointReached {
        /// The checkpoint.
        checkpoint_id: CheckpointId,
        /// Its display name.
        name: String,
        /// Points awarded (zero after a failed interaction).
        points: u32,
    },
    /// The player entered a checkpoint that needs a quiz or challenge first.
    InteractionRequired {
        /// The checkpoint.
        checkpoint_id: CheckpointId,
        /// Its display name.
        name: String,
        /// What the UI should present.
        interaction: Interaction,
    },
    /// Visibility dropped; rendering should fog the map.
    WhiteoutStarted {
        /// When the whiteout lifts.
        ends_at: DateTime<Utc>,
    },
    /// Visibility restored.
    WhiteoutEnded,
    /// Location access failed; entity motion is paused.
    LocationUnavailable {
        /// Human-readable reason.
        reason: String,
    },
    /// Location fixes are arriving again.
    LocationRestored,
}

/// Points earned at a checkpoint, for result persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScoreDelta {
    /// The completed checkpoint.
    pub checkpoint_id: CheckpointId,
    /// Points added to the banked score.
    pub points_earned: u32,
    /// When the points were earned.
    pub timestamp: DateTime<Utc>,
}
