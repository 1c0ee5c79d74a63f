//! Tunable parameters for NPC motion and the survival resource.
//!
//! The flee thresholds and steering weight were tuned by play-testing, not
//! derived; every one of them is a config field so organisers can adjust
//! the feel of an event without a rebuild. Both structs deserialize from
//! the `motion` and `survival` sections of `fieldquest-config.yaml`.

use serde::Deserialize;
use tracing::warn;

use crate::error::EntityError;

/// NPC motion parameters. Distances in meters, times in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotionConfig {
    /// A guarding entity starts fleeing when the player is closer than this (default: 60).
    #[serde(default = "default_detection_radius_m")]
    pub detection_radius_m: f64,

    /// A fleeing or resting entity is caught when the player is closer than this (default: 8).
    #[serde(default = "default_catch_radius_m")]
    pub catch_radius_m: f64,

    /// A fleeing entity considers itself escaped beyond this distance (default: 90).
    #[serde(default = "default_lost_radius_m")]
    pub lost_radius_m: f64,

    /// Beyond this distance from spawn the entity is steered back (default: 250).
    #[serde(default = "default_boundary_radius_m")]
    pub boundary_radius_m: f64,

    /// Weight of the return-to-spawn term relative to the flee direction (default: 2.5).
    #[serde(default = "default_steering_weight")]
    pub steering_weight: f64,

    /// Flee speed in meters per second (default: 3.0).
    #[serde(default = "default_flee_speed_mps")]
    pub flee_speed_mps: f64,

    /// Sprint length before the entity has to rest (default: 8).
    #[serde(default = "default_sprint_seconds")]
    pub sprint_seconds: f64,

    /// Rest length before the entity runs again (default: 6).
    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: f64,

    /// Largest time step integrated in one tick (default: 1.0).
    #[serde(default = "default_max_step_seconds")]
    pub max_step_seconds: f64,

    /// Checkpoint tags that spawn an NPC (default: `["creature"]`).
    #[serde(default = "default_npc_tags")]
    pub npc_tags: Vec<String>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            detection_radius_m: default_detection_radius_m(),
            catch_radius_m: default_catch_radius_m(),
            lost_radius_m: default_lost_radius_m(),
            boundary_radius_m: default_boundary_radius_m(),
            steering_weight: default_steering_weight(),
            flee_speed_mps: default_flee_speed_mps(),
            sprint_seconds: default_sprint_seconds(),
            rest_seconds: default_rest_seconds(),
            max_step_seconds: default_max_step_seconds(),
            npc_tags: default_npc_tags(),
        }
    }
}

impl MotionConfig {
    /// Reject non-positive values and a catch radius that swallows the
    /// detection radius.
    pub fn validate(&self) -> Result<(), EntityError> {
        for (name, value) in [
            ("detection_radius_m", self.detection_radius_m),
            ("catch_radius_m", self.catch_radius_m),
            ("lost_radius_m", self.lost_radius_m),
            ("boundary_radius_m", self.boundary_radius_m),
            ("flee_speed_mps", self.flee_speed_mps),
            ("sprint_seconds", self.sprint_seconds),
            ("rest_seconds", self.rest_seconds),
            ("max_step_seconds", self.max_step_seconds),
        ] {
            require_positive(name, value)?;
        }
        if !self.steering_weight.is_finite() || self.steering_weight < 0.0 {
            return Err(EntityError::InvalidConfig {
                reason: format!("steering_weight must be >= 0 (got {})", self.steering_weight),
            });
        }
        if self.catch_radius_m >= self.detection_radius_m {
            return Err(EntityError::InvalidConfig {
                reason: format!(
                    "catch_radius_m ({}) must be smaller than detection_radius_m ({})",
                    self.catch_radius_m, self.detection_radius_m
                ),
            });
        }
        if self.lost_radius_m <= self.detection_radius_m {
            warn!(
                lost_radius_m = self.lost_radius_m,
                detection_radius_m = self.detection_radius_m,
                "lost radius inside detection radius: entities will rest right after being spotted"
            );
        }
        Ok(())
    }
}

/// Survival resource parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurvivalConfig {
    /// Level lost per second away from heat (default: 1).
    #[serde(default = "default_decay_per_second")]
    pub decay_per_second: f64,

    /// Level gained per second at a heat source (default: 15).
    #[serde(default = "default_regen_per_second")]
    pub regen_per_second: f64,

    /// Heat radius around the start location in meters (default: 30).
    #[serde(default = "default_heat_radius_m")]
    pub heat_radius_m: f64,

    /// Checkpoint tags or name words that mark a heat source.
    #[serde(default = "default_heat_tags")]
    pub heat_tags: Vec<String>,

    /// Seconds added to the elapsed-time score on each freeze (default: 60).
    #[serde(default = "default_freeze_penalty_seconds")]
    pub freeze_penalty_seconds: u64,

    /// How long a freeze lasts (default: 8).
    #[serde(default = "default_freeze_duration_seconds")]
    pub freeze_duration_seconds: f64,

    /// Level restored when the player thaws (default: 10).
    #[serde(default = "default_thaw_grace_level")]
    pub thaw_grace_level: f64,

    /// Probability of losing one item on freeze; 1.0 always loses one (default: 1.0).
    #[serde(default = "default_item_loss_chance")]
    pub item_loss_chance: f64,

    /// Maximum items the player can carry (default: 5).
    #[serde(default = "default_inventory_capacity")]
    pub inventory_capacity: u32,

    /// Level at mode start (default: 100).
    #[serde(default = "default_starting_level")]
    pub starting_level: f64,
}

impl Default for SurvivalConfig {
    fn default() -> Self {
        Self {
            decay_per_second: default_decay_per_second(),
            regen_per_second: default_regen_per_second(),
            heat_radius_m: default_heat_radius_m(),
            heat_tags: default_heat_tags(),
            freeze_penalty_seconds: default_freeze_penalty_seconds(),
            freeze_duration_seconds: default_freeze_duration_seconds(),
            thaw_grace_level: default_thaw_grace_level(),
            item_loss_chance: default_item_loss_chance(),
            inventory_capacity: default_inventory_capacity(),
            starting_level: default_starting_level(),
        }
    }
}

impl SurvivalConfig {
    /// Reject negative rates, out-of-range levels, and probabilities outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), EntityError> {
        for (name, value) in [
            ("decay_per_second", self.decay_per_second),
            ("regen_per_second", self.regen_per_second),
            ("heat_radius_m", self.heat_radius_m),
            ("freeze_duration_seconds", self.freeze_duration_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EntityError::InvalidConfig {
                    reason: format!("{name} must be >= 0 (got {value})"),
                });
            }
        }
        for (name, value) in [
            ("thaw_grace_level", self.thaw_grace_level),
            ("starting_level", self.starting_level),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(EntityError::InvalidConfig {
                    reason: format!("{name} must be within 0..=100 (got {value})"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.item_loss_chance) {
            return Err(EntityError::InvalidConfig {
                reason: format!(
                    "item_loss_chance must be within 0..=1 (got {})",
                    self.item_loss_chance
                ),
            });
        }
        Ok(())
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), EntityError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EntityError::InvalidConfig {
            reason: format!("{name} must be > 0 (got {value})"),
        })
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde's `default = "..."` attribute)
// ---------------------------------------------------------------------------

const fn default_detection_radius_m() -> f64 {
    60.0
}

const fn default_catch_radius_m() -> f64 {
    8.0
}

const fn default_lost_radius_m() -> f64 {
    90.0
}

const fn default_boundary_radius_m() -> f64 {
    250.0
}

const fn default_steering_weight() -> f64 {
    2.5
}

const fn default_flee_speed_mps() -> f64 {
    3.0
}

const fn default_sprint_seconds() -> f64 {
    8.0
}

const fn default_rest_seconds() -> f64 {
    6.0
}

const fn default_max_step_seconds() -> f64 {
    1.0
}

fn default_npc_tags() -> Vec<String> {
    vec![String::from("creature")]
}

const fn default_decay_per_second() -> f64 {
    1.0
}

const fn default_regen_per_second() -> f64 {
    15.0
}

const fn default_heat_radius_m() -> f64 {
    30.0
}

fn default_heat_tags() -> Vec<String> {
    vec![
        String::from("heat"),
        String::from("campfire"),
        String::from("shelter"),
    ]
}

const fn default_freeze_penalty_seconds() -> u64 {
    60
}

const fn default_freeze_duration_seconds() -> f64 {
    8.0
}

const fn default_thaw_grace_level() -> f64 {
    10.0
}

const fn default_item_loss_chance() -> f64 {
    1.0
}

const fn default_inventory_capacity() -> u32 {
    5
}

const fn default_starting_level() -> f64 {
    100.0
}
