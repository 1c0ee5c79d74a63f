//! Core data structs: positions, checkpoints, the player, NPCs, audio and
//! weather state, and the render snapshots handed to the map layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{CheckpointRequirement, NpcState};
use crate::ids::{CheckpointId, NpcId};

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl GeoPoint {
    /// Create a point without range validation.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// One fix from the device location sensor.
///
/// Samples are pushed at the sensor's own cadence and may arrive out of
/// order; only samples newer than the last applied one are used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PositionSample {
    /// Reported position.
    #[serde(flatten)]
    pub position: GeoPoint,
    /// Horizontal accuracy radius in meters, if reported.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// Heading in degrees clockwise from north, if reported.
    #[serde(default)]
    pub heading_deg: Option<f64>,
    /// When the sensor took the fix.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// Optional activity attached to a checkpoint.
///
/// A checkpoint with an interaction does not award points on arrival;
/// points follow the outcome reported by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Interaction {
    /// Plain check-in.
    #[default]
    None,
    /// Multiple-choice question.
    Quiz {
        /// Question text.
        question: String,
        /// Answer choices in display order.
        choices: Vec<String>,
        /// Index into `choices` of the correct answer.
        answer_index: u32,
    },
    /// Free-form task confirmed by the participant.
    Challenge {
        /// Task description.
        prompt: String,
    },
}

impl Interaction {
    /// Whether arriving at the checkpoint requires a UI interaction first.
    pub const fn is_required(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A checkpoint as supplied by the event configuration.
///
/// Read-only to the simulation; detection progress is tracked separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Checkpoint {
    /// Stable identifier.
    pub id: CheckpointId,
    /// Display name. Also matched against heat-source tags.
    pub name: String,
    /// Placed position, or `None` while the organiser has not placed it yet.
    #[serde(default)]
    pub position: Option<GeoPoint>,
    /// Trigger radius in meters.
    pub radius_m: f64,
    /// Mandatory or optional.
    #[serde(default, rename = "type")]
    pub requirement: CheckpointRequirement,
    /// Points awarded on completion.
    #[serde(default)]
    pub points: u32,
    /// Inventory items granted on completion.
    #[serde(default)]
    pub items: u32,
    /// Quiz or challenge attached to this checkpoint.
    #[serde(default)]
    pub interaction: Interaction,
    /// Free-form tags (`heat`, `creature`, `threat`, ...).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Position in a sequential route. `None` means free order.
    #[serde(default)]
    pub order: Option<u32>,
}

impl Checkpoint {
    /// Whether any tag or name word matches one of `wanted`, ignoring case.
    pub fn matches_any_tag(&self, wanted: &[String]) -> bool {
        let name_lower = self.name.to_lowercase();
        wanted.iter().any(|want| {
            let want = want.to_lowercase();
            self.tags.iter().any(|tag| tag.to_lowercase() == want)
                || name_lower
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|word| word == want)
        })
    }
}

/// Static description of an event handed over at mode start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventSetup {
    /// Start location. Acts as a heat source when set.
    #[serde(default)]
    pub start: Option<GeoPoint>,
    /// All checkpoints of the event.
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Mutable participant state for the duration of the adventure mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerState {
    /// Last applied position. `None` until the first fix arrives.
    pub position: Option<GeoPoint>,
    /// Last reported heading in degrees.
    pub heading_deg: Option<f64>,
    /// Survival resource ("warmth"), always in `[0, 100]`.
    pub resource_level: f64,
    /// Whether the player is frozen and waiting to thaw.
    pub frozen: bool,
    /// Items currently carried.
    pub inventory: u32,
    /// Maximum number of items the player can carry.
    pub inventory_capacity: u32,
    /// Points banked from completed checkpoints.
    pub banked_score: u32,
}

// ---------------------------------------------------------------------------
// NPCs
// ---------------------------------------------------------------------------

/// A non-player entity the participant can chase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NpcEntity {
    /// Stable identifier.
    pub id: NpcId,
    /// Display name.
    pub name: String,
    /// Checkpoint this entity was spawned from.
    pub checkpoint_id: Option<CheckpointId>,
    /// Current position.
    pub position: GeoPoint,
    /// Where the entity started and where rubber-band steering pulls it back to.
    pub spawn: GeoPoint,
    /// Behavioural state.
    pub state: NpcState,
    /// When a timed transition (sprint over, rest over) becomes due.
    pub next_state_change_at: Option<DateTime<Utc>>,
    /// Distance to the player computed on the last motion tick.
    pub distance_to_player: Option<f64>,
}

// ---------------------------------------------------------------------------
// Audio and weather
// ---------------------------------------------------------------------------

/// Gain values for the three logical audio channels, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChannelGains {
    /// Low ambient drone.
    pub drone: f64,
    /// Tension layer for mid-range threats.
    pub tension: f64,
    /// Danger layer for close threats.
    pub danger: f64,
}

impl ChannelGains {
    /// All channels muted.
    pub const SILENT: Self = Self {
        drone: 0.0,
        tension: 0.0,
        danger: 0.0,
    };

    /// Clamp every channel into `[0, 1]`. NaN becomes 0.
    pub fn clamped(self) -> Self {
        Self {
            drone: clamp_unit(self.drone),
            tension: clamp_unit(self.tension),
            danger: clamp_unit(self.danger),
        }
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Whiteout weather flag exposed to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WhiteoutState {
    /// Whether a whiteout is in progress.
    pub active: bool,
    /// When the current whiteout started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the current whiteout will end.
    pub ends_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Per-tick render data for one NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntitySnapshot {
    /// NPC identifier.
    pub id: NpcId,
    /// Display name.
    pub name: String,
    /// Current position.
    pub position: GeoPoint,
    /// Current state.
    pub state: NpcState,
}

impl From<&NpcEntity> for EntitySnapshot {
    fn from(npc: &NpcEntity) -> Self {
        Self {
            id: npc.id,
            name: npc.name.clone(),
            position: npc.position,
            state: npc.state,
        }
    }
}

/// Per-tick view of the player for the HUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerSnapshot {
    /// Last applied position.
    pub position: Option<GeoPoint>,
    /// Survival resource level.
    pub resource_level: f64,
    /// Frozen flag.
    pub frozen: bool,
    /// Items carried.
    pub inventory: u32,
    /// Banked points.
    pub banked_score: u32,
    /// Wall-clock seconds since start plus accumulated penalties.
    pub elapsed_seconds: f64,
}
