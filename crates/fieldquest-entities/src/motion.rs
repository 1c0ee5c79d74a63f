//! NPC state machine and flee physics.
//!
//! Every entity runs the same four-state machine:
//!
//! ```text
//!   Guarding --spotted--> Fleeing --escaped/timed out--> Resting
//!                          ^   |                           |
//!                          |   +---------caught------+     |
//!                          +------recovered----------|-----+
//!                                                    v
//!                                                 Caught (terminal)
//! ```
//!
//! # Order of operations per step
//!
//! 1. Skip caught entities entirely
//! 2. Clamp the time step to `max_step_seconds`
//! 3. Record the distance to the player
//! 4. Evaluate at most one transition (caught > escaped > sprint timer)
//! 5. Integrate movement if the entity is fleeing
//!
//! A resting entity only recovers while the player is within the lost
//! radius. Otherwise it keeps resting, so an abandoned chase stays quiet.
//!
//! Movement is `position + direction * speed * dt` through the flat-earth
//! conversion in [`fieldquest_world::geo`], so entities never teleport.

use chrono::{DateTime, Utc};
use fieldquest_types::{
    Checkpoint, GameEvent, GeoPoint, NpcEntity, NpcId, NpcState, TransitionCause,
};
use fieldquest_world::{LocalVector, deadline_after, distance_meters, local_offset, offset_by};
use tracing::{debug, warn};

use crate::config::MotionConfig;
use crate::error::EntityError;

/// A state change of one entity, reported to the caller for UI messaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The entity.
    pub npc_id: NpcId,
    /// Its display name.
    pub name: String,
    /// State before the step.
    pub from: NpcState,
    /// State after the step.
    pub to: NpcState,
    /// Why the state changed.
    pub cause: TransitionCause,
}

impl Transition {
    /// The user-visible event for this transition.
    pub fn to_event(&self) -> GameEvent {
        let npc_id = self.npc_id;
        let name = self.name.clone();
        match self.cause {
            TransitionCause::Spotted => GameEvent::Spotted { npc_id, name },
            TransitionCause::Escaped => GameEvent::Lost { npc_id, name },
            TransitionCause::TimedOut => GameEvent::Rested { npc_id, name },
            TransitionCause::Recovered => GameEvent::Recovered { npc_id, name },
            TransitionCause::Caught => GameEvent::Caught { npc_id, name },
        }
    }
}

/// Drives every NPC of a session.
#[derive(Debug, Clone)]
pub struct MotionController {
    config: MotionConfig,
}

impl MotionController {
    /// Create a controller after validating `config`.
    pub fn new(config: MotionConfig) -> Result<Self, EntityError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub const fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Spawn one guarding NPC per placed checkpoint tagged with an NPC tag.
    pub fn spawn_npcs(&self, checkpoints: &[Checkpoint]) -> Vec<NpcEntity> {
        checkpoints
            .iter()
            .filter(|cp| cp.matches_any_tag(&self.config.npc_tags))
            .filter_map(|cp| {
                let Some(position) = cp.position.filter(GeoPoint::is_valid) else {
                    warn!(checkpoint = %cp.id, name = %cp.name, "creature checkpoint not placed, no NPC spawned");
                    return None;
                };
                Some(NpcEntity {
                    id: NpcId::new(),
                    name: cp.name.clone(),
                    checkpoint_id: Some(cp.id),
                    position,
                    spawn: position,
                    state: NpcState::Guarding,
                    next_state_change_at: None,
                    distance_to_player: None,
                })
            })
            .collect()
    }

    /// Advance every NPC by `dt` seconds.
    ///
    /// Without a player fix nothing moves and nothing transitions.
    pub fn step_all(
        &self,
        npcs: &mut [NpcEntity],
        player: Option<GeoPoint>,
        now: DateTime<Utc>,
        dt: f64,
    ) -> Vec<Transition> {
        let Some(player) = player else {
            return Vec::new();
        };
        npcs.iter_mut()
            .filter_map(|npc| self.step(npc, player, now, dt))
            .collect()
    }

    /// Advance one NPC by `dt` seconds. Returns the transition, if any.
    pub fn step(
        &self,
        npc: &mut NpcEntity,
        player: GeoPoint,
        now: DateTime<Utc>,
        dt: f64,
    ) -> Option<Transition> {
        if !npc.state.is_active() {
            return None;
        }

        let dt = self.clamp_step(dt);
        let distance = distance_meters(npc.position, player);
        npc.distance_to_player = Some(distance);

        let transition = self.evaluate(npc, distance, now);

        if npc.state == NpcState::Fleeing && dt > 0.0 {
            let velocity = self.flee_direction(npc, player).scaled(self.config.flee_speed_mps * dt);
            npc.position = offset_by(npc.position, velocity);
        }

        transition
    }

    /// Sanitise and cap a time step.
    fn clamp_step(&self, dt: f64) -> f64 {
        if dt.is_nan() || dt <= 0.0 {
            return 0.0;
        }
        if dt > self.config.max_step_seconds {
            debug!(dt, cap = self.config.max_step_seconds, "motion step clamped");
        }
        dt.min(self.config.max_step_seconds)
    }

    /// Apply at most one transition to `npc` given the current distance.
    fn evaluate(
        &self,
        npc: &mut NpcEntity,
        distance: f64,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        let timer_due = npc.next_state_change_at.is_some_and(|at| now >= at);

        let (to, cause) = match npc.state {
            NpcState::Guarding if distance < self.config.detection_radius_m => {
                (NpcState::Fleeing, TransitionCause::Spotted)
            }
            NpcState::Fleeing | NpcState::Resting if distance < self.config.catch_radius_m => {
                (NpcState::Caught, TransitionCause::Caught)
            }
            NpcState::Fleeing if distance > self.config.lost_radius_m => {
                (NpcState::Resting, TransitionCause::Escaped)
            }
            NpcState::Fleeing if timer_due => (NpcState::Resting, TransitionCause::TimedOut),
            NpcState::Resting if timer_due && distance <= self.config.lost_radius_m => {
                (NpcState::Fleeing, TransitionCause::Recovered)
            }
            _ => return None,
        };

        let from = npc.state;
        npc.state = to;
        npc.next_state_change_at = match to {
            NpcState::Fleeing => Some(deadline_after(now, self.config.sprint_seconds)),
            NpcState::Resting => Some(deadline_after(now, self.config.rest_seconds)),
            NpcState::Guarding | NpcState::Caught => None,
        };

        debug!(npc = %npc.id, name = %npc.name, ?from, ?to, ?cause, distance, "npc transition");

        Some(Transition {
            npc_id: npc.id,
            name: npc.name.clone(),
            from,
            to,
            cause,
        })
    }

    /// Unit direction away from the player, bent back toward spawn once the
    /// entity is outside the boundary radius.
    fn flee_direction(&self, npc: &NpcEntity, player: GeoPoint) -> LocalVector {
        let away = local_offset(player, npc.position).normalized();
        let from_spawn = local_offset(npc.spawn, npc.position);
        if from_spawn.length() <= self.config.boundary_radius_m {
            return away;
        }
        let home = local_offset(npc.position, npc.spawn).normalized();
        (away + home.scaled(self.config.steering_weight)).normalized()
    }
}
