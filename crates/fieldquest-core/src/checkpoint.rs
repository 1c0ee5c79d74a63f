//! Checkpoint check-in detection.
//!
//! Each placed checkpoint is a [`Zone`]; entering it checks the player in.
//! A plain checkpoint completes on entry. One with a quiz or challenge
//! moves to [`CheckpointStatus::AwaitingInteraction`] and completes only
//! when the UI reports the outcome through
//! [`CheckpointDetector::resolve_interaction`].
//!
//! Checkpoints with an `order` form a sequential route: one becomes
//! eligible only after every placed checkpoint with a lower order is
//! visited. Checkpoints without an order can be taken at any time.
//!
//! A checkpoint without a valid position is ignored entirely: it is never
//! entered, never gates the route, and never counts toward completion.

use chrono::{DateTime, Utc};
use fieldquest_types::{
    Checkpoint, CheckpointId, CheckpointRequirement, CheckpointStatus, GameEvent, GeoPoint,
    InteractionOutcome, ScoreDelta,
};
use fieldquest_world::Zone;
use tracing::{debug, info, warn};

use crate::tick::SimulationError;

/// A completed checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The checkpoint.
    pub checkpoint_id: CheckpointId,
    /// Its display name.
    pub name: String,
    /// Points awarded (zero after a failed interaction).
    pub points: u32,
    /// Inventory items granted.
    pub items: u32,
    /// When it completed.
    pub completed_at: DateTime<Utc>,
}

impl Completion {
    /// The `checkpoint_reached` event.
    pub fn to_event(&self) -> GameEvent {
        GameEvent::CheckpointReached {
            checkpoint_id: self.checkpoint_id,
            name: self.name.clone(),
            points: self.points,
        }
    }

    /// The scoring delta for result persistence.
    pub const fn score_delta(&self) -> ScoreDelta {
        ScoreDelta {
            checkpoint_id: self.checkpoint_id,
            points_earned: self.points,
            timestamp: self.completed_at,
        }
    }
}

/// Result of entering a checkpoint zone.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckIn {
    /// The checkpoint completed.
    Completed(Completion),
    /// The UI must run the quiz or challenge first.
    InteractionRequired(GameEvent),
}

#[derive(Debug, Clone)]
struct Tracked {
    checkpoint: Checkpoint,
    zone: Option<Zone>,
    status: CheckpointStatus,
}

/// Tracks the visited state of every checkpoint in an event.
#[derive(Debug, Clone, Default)]
pub struct CheckpointDetector {
    tracked: Vec<Tracked>,
}

impl CheckpointDetector {
    /// Start tracking `checkpoints`, all unvisited.
    pub fn new(checkpoints: Vec<Checkpoint>) -> Self {
        let mut tracked: Vec<Tracked> = checkpoints
            .into_iter()
            .map(|checkpoint| {
                let zone = checkpoint
                    .position
                    .filter(GeoPoint::is_valid)
                    .map(|center| Zone::new(center, checkpoint.radius_m));
                if zone.is_none() {
                    warn!(checkpoint = %checkpoint.id, name = %checkpoint.name, "checkpoint has no position, skipped for detection");
                }
                Tracked {
                    checkpoint,
                    zone,
                    status: CheckpointStatus::Unvisited,
                }
            })
            .collect();
        // Sequential checkpoints first so one sample can walk a dense route.
        tracked.sort_by_key(|t| t.checkpoint.order.unwrap_or(u32::MAX));
        Self { tracked }
    }

    /// Check the player in at every eligible checkpoint containing `player`.
    pub fn detect(&mut self, player: GeoPoint, now: DateTime<Utc>) -> Vec<CheckIn> {
        let mut check_ins = Vec::new();
        for index in 0..self.tracked.len() {
            let entered = self.tracked.get(index).is_some_and(|tracked| {
                tracked.status == CheckpointStatus::Unvisited
                    && tracked.zone.is_some_and(|zone| zone.contains(player))
                    && self.is_unlocked(&tracked.checkpoint)
            });
            if !entered {
                continue;
            }
            let Some(tracked) = self.tracked.get_mut(index) else {
                continue;
            };
            if tracked.checkpoint.interaction.is_required() {
                tracked.status = CheckpointStatus::AwaitingInteraction;
                info!(checkpoint = %tracked.checkpoint.id, name = %tracked.checkpoint.name, "interaction required");
                check_ins.push(CheckIn::InteractionRequired(GameEvent::InteractionRequired {
                    checkpoint_id: tracked.checkpoint.id,
                    name: tracked.checkpoint.name.clone(),
                    interaction: tracked.checkpoint.interaction.clone(),
                }));
            } else {
                let points = tracked.checkpoint.points;
                check_ins.push(CheckIn::Completed(complete(tracked, points, now)));
            }
        }
        check_ins
    }

    /// Close a checkpoint that is waiting for a quiz or challenge result.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownCheckpoint`] for an unknown id and
    /// [`SimulationError::NoPendingInteraction`] if the checkpoint is not
    /// awaiting an interaction.
    pub fn resolve_interaction(
        &mut self,
        checkpoint_id: CheckpointId,
        outcome: InteractionOutcome,
        now: DateTime<Utc>,
    ) -> Result<Completion, SimulationError> {
        let tracked = self
            .tracked
            .iter_mut()
            .find(|t| t.checkpoint.id == checkpoint_id)
            .ok_or(SimulationError::UnknownCheckpoint { checkpoint_id })?;
        if tracked.status != CheckpointStatus::AwaitingInteraction {
            return Err(SimulationError::NoPendingInteraction { checkpoint_id });
        }
        let points = match outcome {
            InteractionOutcome::Correct => tracked.checkpoint.points,
            InteractionOutcome::Incorrect => 0,
        };
        debug!(checkpoint = %checkpoint_id, ?outcome, points, "interaction resolved");
        Ok(complete(tracked, points, now))
    }

    /// Status of one checkpoint.
    pub fn status(&self, checkpoint_id: CheckpointId) -> Option<CheckpointStatus> {
        self.tracked
            .iter()
            .find(|t| t.checkpoint.id == checkpoint_id)
            .map(|t| t.status)
    }

    /// Number of mandatory checkpoints.
    pub fn mandatory_total(&self) -> usize {
        self.mandatory().count()
    }

    /// Mandatory checkpoints not yet visited.
    pub fn mandatory_remaining(&self) -> usize {
        self.mandatory()
            .filter(|t| t.status != CheckpointStatus::Visited)
            .count()
    }

    /// Whether every mandatory checkpoint is visited. True when there are none.
    pub fn all_mandatory_visited(&self) -> bool {
        self.mandatory_remaining() == 0
    }

    fn mandatory(&self) -> impl Iterator<Item = &Tracked> {
        self.tracked.iter().filter(|t| {
            t.zone.is_some() && t.checkpoint.requirement == CheckpointRequirement::Mandatory
        })
    }

    /// Whether every placed, lower-ordered checkpoint is visited.
    fn is_unlocked(&self, checkpoint: &Checkpoint) -> bool {
        let Some(order) = checkpoint.order else {
            return true;
        };
        self.tracked.iter().all(|t| {
            t.zone.is_none()
                || t.checkpoint.order.is_none_or(|other| other >= order)
                || t.status == CheckpointStatus::Visited
        })
    }
}

fn complete(tracked: &mut Tracked, points: u32, now: DateTime<Utc>) -> Completion {
    tracked.status = CheckpointStatus::Visited;
    info!(checkpoint = %tracked.checkpoint.id, name = %tracked.checkpoint.name, points, "checkpoint reached");
    Completion {
        checkpoint_id: tracked.checkpoint.id,
        name: tracked.checkpoint.name.clone(),
        points,
        items: tracked.checkpoint.items,
        completed_at: now,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fieldquest_types::Interaction;
    use fieldquest_world::{LocalVector, offset_by};

    use super::*;

    const ORIGIN: GeoPoint = GeoPoint::new(59.3293, 18.0686);

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn north(meters: f64) -> GeoPoint {
        offset_by(ORIGIN, LocalVector::new(0.0, meters))
    }

    fn checkpoint(name: &str, position: Option<GeoPoint>) -> Checkpoint {
        Checkpoint {
            id: CheckpointId::new(),
            name: name.to_owned(),
            position,
            radius_m: 25.0,
            requirement: CheckpointRequirement::Mandatory,
            points: 10,
            items: 1,
            interaction: Interaction::None,
            tags: Vec::new(),
            order: None,
        }
    }

    fn quiz() -> Interaction {
        Interaction::Quiz {
            question: "Year the tower was built?".to_owned(),
            choices: vec!["1890".to_owned(), "1920".to_owned()],
            answer_index: 0,
        }
    }

    #[test]
    fn plain_checkpoint_completes_once() {
        let cp = checkpoint("Bridge", Some(north(100.0)));
        let id = cp.id;
        let mut detector = CheckpointDetector::new(vec![cp]);

        assert!(detector.detect(north(60.0), t0()).is_empty());
        let check_ins = detector.detect(north(80.0), t0());
        assert_eq!(check_ins.len(), 1);
        let CheckIn::Completed(completion) = &check_ins[0] else {
            panic!("expected completion");
        };
        assert_eq!(completion.points, 10);
        assert_eq!(completion.score_delta().points_earned, 10);
        assert_eq!(detector.status(id), Some(CheckpointStatus::Visited));

        // Duplicate check-in is a no-op.
        assert!(detector.detect(north(100.0), t0()).is_empty());
        assert!(detector.all_mandatory_visited());
    }

    #[test]
    fn quiz_waits_for_outcome() {
        let mut cp = checkpoint("Tower", Some(north(0.0)));
        cp.interaction = quiz();
        let id = cp.id;
        let mut detector = CheckpointDetector::new(vec![cp]);

        let check_ins = detector.detect(north(10.0), t0());
        assert!(matches!(
            check_ins.as_slice(),
            [CheckIn::InteractionRequired(GameEvent::InteractionRequired { .. })]
        ));
        assert_eq!(detector.status(id), Some(CheckpointStatus::AwaitingInteraction));
        assert!(!detector.all_mandatory_visited());

        // Standing inside does not re-emit.
        assert!(detector.detect(north(5.0), t0()).is_empty());

        let completion = detector
            .resolve_interaction(id, InteractionOutcome::Correct, t0())
            .unwrap();
        assert_eq!(completion.points, 10);
        assert_eq!(detector.status(id), Some(CheckpointStatus::Visited));
        assert!(matches!(
            detector.resolve_interaction(id, InteractionOutcome::Correct, t0()),
            Err(SimulationError::NoPendingInteraction { .. })
        ));
    }

    #[test]
    fn wrong_answer_visits_with_zero_points() {
        let mut cp = checkpoint("Tower", Some(north(0.0)));
        cp.interaction = Interaction::Challenge {
            prompt: "Ring the bell".to_owned(),
        };
        let id = cp.id;
        let mut detector = CheckpointDetector::new(vec![cp]);
        let _ = detector.detect(north(0.0), t0());
        let completion = detector
            .resolve_interaction(id, InteractionOutcome::Incorrect, t0())
            .unwrap();
        assert_eq!(completion.points, 0);
        assert!(matches!(completion.to_event(), GameEvent::CheckpointReached { points: 0, .. }));
        assert_eq!(detector.status(id), Some(CheckpointStatus::Visited));
    }

    #[test]
    fn resolving_unknown_or_unentered_checkpoint_fails() {
        let cp = checkpoint("Tower", Some(north(0.0)));
        let id = cp.id;
        let mut detector = CheckpointDetector::new(vec![cp]);
        assert!(matches!(
            detector.resolve_interaction(CheckpointId::new(), InteractionOutcome::Correct, t0()),
            Err(SimulationError::UnknownCheckpoint { .. })
        ));
        assert!(matches!(
            detector.resolve_interaction(id, InteractionOutcome::Correct, t0()),
            Err(SimulationError::NoPendingInteraction { .. })
        ));
    }

    #[test]
    fn sequential_checkpoints_unlock_in_order() {
        let mut first = checkpoint("First", Some(north(0.0)));
        first.order = Some(1);
        let mut second = checkpoint("Second", Some(north(200.0)));
        second.order = Some(2);
        let free = checkpoint("Free", Some(north(400.0)));
        let (first_id, second_id) = (first.id, second.id);
        let mut detector = CheckpointDetector::new(vec![second, free, first]);

        // Second is locked until first is visited.
        assert!(detector.detect(north(200.0), t0()).is_empty());
        assert_eq!(detector.status(second_id), Some(CheckpointStatus::Unvisited));

        // Free order needs nothing.
        assert_eq!(detector.detect(north(400.0), t0()).len(), 1);

        assert_eq!(detector.detect(north(0.0), t0()).len(), 1);
        assert_eq!(detector.status(first_id), Some(CheckpointStatus::Visited));
        assert_eq!(detector.detect(north(200.0), t0()).len(), 1);
        assert!(detector.all_mandatory_visited());
    }

    #[test]
    fn unplaced_checkpoint_is_never_entered() {
        let hidden = checkpoint("Hidden", None);
        let mandatory = checkpoint("Gate", Some(north(0.0)));
        let mut detector = CheckpointDetector::new(vec![hidden, mandatory]);
        assert_eq!(detector.mandatory_total(), 1);
        assert_eq!(detector.detect(north(0.0), t0()).len(), 1);
        assert_eq!(detector.mandatory_remaining(), 0);
        assert!(detector.all_mandatory_visited());
    }

    #[test]
    fn unplaced_checkpoint_does_not_lock_the_route() {
        let mut unplaced = checkpoint("Lost marker", None);
        unplaced.order = Some(1);
        let mut second = checkpoint("Second", Some(north(200.0)));
        second.order = Some(2);
        let mut third = checkpoint("Third", Some(north(400.0)));
        third.order = Some(3);
        let (second_id, third_id) = (second.id, third.id);
        let mut detector = CheckpointDetector::new(vec![third, unplaced, second]);

        // Third still waits for second.
        assert!(detector.detect(north(400.0), t0()).is_empty());

        assert_eq!(detector.detect(north(200.0), t0()).len(), 1);
        assert_eq!(detector.status(second_id), Some(CheckpointStatus::Visited));
        assert_eq!(detector.detect(north(400.0), t0()).len(), 1);
        assert_eq!(detector.status(third_id), Some(CheckpointStatus::Visited));
        assert!(detector.all_mandatory_visited());
    }
}
