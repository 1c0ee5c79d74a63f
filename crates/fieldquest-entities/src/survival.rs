//! Warmth decay, regeneration, and the freeze/thaw cycle.
//!
//! # Order of operations per tick
//!
//! 1. If frozen, thaw once the deadline has passed, otherwise do nothing
//! 2. Regenerate at a heat source or decay away from one, clamped to `[0, 100]`
//! 3. On a crossing from above zero to zero: freeze, lose an item, and
//!    schedule the thaw
//!
//! While frozen the level is held; only the player is affected, NPCs and
//! weather keep running.

use chrono::{DateTime, Utc};
use fieldquest_types::{EventSetup, GameEvent, PlayerState};
use fieldquest_world::{Zone, deadline_after};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::config::SurvivalConfig;
use crate::error::EntityError;
use crate::inventory::remove_item;

/// Upper bound of the survival resource.
pub const MAX_LEVEL: f64 = 100.0;

/// Freeze or thaw produced by a survival tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurvivalOutcome {
    /// The level hit zero.
    Frozen {
        /// Seconds to add to the elapsed-time score.
        penalty_seconds: u64,
        /// Whether an item was lost.
        item_lost: bool,
        /// Items left.
        inventory: u32,
        /// When the player thaws.
        thaw_at: DateTime<Utc>,
    },
    /// The freeze ended and the grace level was restored.
    Thawed {
        /// Level after thawing.
        resource_level: f64,
    },
}

impl SurvivalOutcome {
    /// The user-visible event for this outcome.
    pub fn to_event(&self) -> GameEvent {
        match *self {
            Self::Frozen {
                penalty_seconds,
                item_lost,
                inventory,
                thaw_at,
            } => GameEvent::Frozen {
                penalty_seconds,
                item_lost,
                inventory,
                thaw_at,
            },
            Self::Thawed { resource_level } => GameEvent::Thawed { resource_level },
        }
    }
}

/// Owns the survival parameters, the item-loss RNG, and the thaw deadline.
#[derive(Debug, Clone)]
pub struct SurvivalController {
    config: SurvivalConfig,
    rng: StdRng,
    thaw_at: Option<DateTime<Utc>>,
}

impl SurvivalController {
    /// Create a controller after validating `config`. `seed` drives item loss.
    pub fn new(config: SurvivalConfig, seed: u64) -> Result<Self, EntityError> {
        config.validate()?;
        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            thaw_at: None,
        })
    }

    /// The active configuration.
    pub const fn config(&self) -> &SurvivalConfig {
        &self.config
    }

    /// Fresh player state at mode start.
    pub const fn initial_player(&self) -> PlayerState {
        PlayerState {
            position: None,
            heading_deg: None,
            resource_level: self.config.starting_level,
            frozen: false,
            inventory: 0,
            inventory_capacity: self.config.inventory_capacity,
            banked_score: 0,
        }
    }

    /// Heat zones for an event: the start location plus every placed
    /// checkpoint matching a heat tag.
    pub fn heat_zones(&self, setup: &EventSetup) -> Vec<Zone> {
        let start = setup
            .start
            .map(|center| Zone::new(center, self.config.heat_radius_m));
        let checkpoints = setup
            .checkpoints
            .iter()
            .filter(|cp| cp.matches_any_tag(&self.config.heat_tags))
            .filter_map(|cp| {
                if cp.position.is_none() {
                    warn!(checkpoint = %cp.id, name = %cp.name, "heat source not placed, ignored");
                }
                cp.position.map(|center| Zone::new(center, cp.radius_m))
            });
        start.into_iter().chain(checkpoints).collect()
    }

    /// Pending thaw deadline, if frozen.
    pub const fn thaw_at(&self) -> Option<DateTime<Utc>> {
        self.thaw_at
    }

    /// Whether the thaw deadline has passed.
    pub fn thaw_due(&self, now: DateTime<Utc>) -> bool {
        self.thaw_at.is_some_and(|at| now >= at)
    }

    /// Advance the player's warmth by `dt` seconds.
    pub fn tick(
        &mut self,
        player: &mut PlayerState,
        at_heat: bool,
        now: DateTime<Utc>,
        dt: f64,
    ) -> Option<SurvivalOutcome> {
        if player.frozen {
            return self.try_thaw(player, now);
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let before = player.resource_level;
        let after = if at_heat {
            before + self.config.regen_per_second * dt
        } else {
            before - self.config.decay_per_second * dt
        };
        player.resource_level = after.clamp(0.0, MAX_LEVEL);

        if before > 0.0 && player.resource_level <= 0.0 {
            return Some(self.freeze(player, now));
        }
        None
    }

    fn freeze(&mut self, player: &mut PlayerState, now: DateTime<Utc>) -> SurvivalOutcome {
        player.resource_level = 0.0;
        player.frozen = true;
        let item_lost = self.roll_item_loss() && remove_item(player);
        let thaw_at = deadline_after(now, self.config.freeze_duration_seconds);
        self.thaw_at = Some(thaw_at);

        info!(
            item_lost,
            inventory = player.inventory,
            penalty_seconds = self.config.freeze_penalty_seconds,
            %thaw_at,
            "player frozen"
        );

        SurvivalOutcome::Frozen {
            penalty_seconds: self.config.freeze_penalty_seconds,
            item_lost,
            inventory: player.inventory,
            thaw_at,
        }
    }

    fn try_thaw(&mut self, player: &mut PlayerState, now: DateTime<Utc>) -> Option<SurvivalOutcome> {
        if !self.thaw_due(now) {
            return None;
        }
        self.thaw_at = None;
        player.frozen = false;
        player.resource_level = player
            .resource_level
            .max(self.config.thaw_grace_level)
            .clamp(0.0, MAX_LEVEL);
        info!(resource_level = player.resource_level, "player thawed");
        Some(SurvivalOutcome::Thawed {
            resource_level: player.resource_level,
        })
    }

    fn roll_item_loss(&mut self) -> bool {
        let chance = self.config.item_loss_chance;
        if chance >= 1.0 {
            true
        } else if chance > 0.0 {
            self.rng.random_bool(chance)
        } else {
            false
        }
    }
}
