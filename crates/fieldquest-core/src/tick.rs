//! The simulation: one struct that owns every controller and is advanced by
//! explicit calls.
//!
//! Two kinds of input drive it:
//!
//! 1. **Position samples** via [`Simulation::apply_position`]: update the
//!    player, run checkpoint detection, and remix audio immediately.
//!
//! 2. **Ticks** via [`Simulation::tick`], called at the motion rate:
//!    - **Weather** -- flip the whiteout flag when its deadline passes.
//!    - **Checkpoints** -- re-run detection at the last fix, so a route
//!      unlocked between fixes is picked up by a stationary player.
//!    - **Motion** -- step every NPC when the motion cadence is due and a
//!      location is available.
//!    - **Survival** -- decay or regenerate warmth when the survival
//!      cadence is due, and thaw the player as soon as the deadline passes.
//!    - **Audio** -- remix for the new NPC positions.
//!    - **Report** -- snapshot entities, player, gains, and drain events.
//!
//! Location failures, interaction results, and audio toggles arrive through
//! their own methods; their events are queued and reported by the next tick.
//!
//! Nothing here reads the wall clock. Every operation takes `now`, so a
//! session is deterministic given its inputs and seed.

use chrono::{DateTime, Utc};
use fieldquest_entities::{
    EntityError, MotionController, SurvivalController, SurvivalOutcome, grant_items,
};
use fieldquest_types::{
    ChannelGains, CheckpointId, CheckpointStatus, EntitySnapshot, EventSetup, GameEvent, GeoPoint,
    InteractionOutcome, NpcEntity, PlayerSnapshot, PlayerState, PositionSample, ScoreDelta,
    WhiteoutState,
};
use fieldquest_world::{
    WhiteoutChange, WhiteoutCycle, WorldError, Zone, inside_any, nearest_distance,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audio::{AudioEngine, AudioMixer};
use crate::checkpoint::{CheckIn, CheckpointDetector, Completion};
use crate::clock::{ClockError, SimulationClock};
use crate::config::{ConfigError, SimulationConfig};
use crate::position::{LocationError, PositionReport, SampleDisposition};

/// Offset between the item-loss and weather RNG streams.
const WEATHER_SEED_OFFSET: u64 = 0x5EED;

/// Errors from building or driving a [`Simulation`].
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The configuration is invalid.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A clock could not be built.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// An entity controller rejected its configuration.
    #[error("entity error: {source}")]
    Entity {
        /// The underlying entity error.
        #[from]
        source: EntityError,
    },

    /// A world component rejected its configuration.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// No checkpoint with this id exists in the event.
    #[error("unknown checkpoint {checkpoint_id}")]
    UnknownCheckpoint {
        /// The requested checkpoint.
        checkpoint_id: CheckpointId,
    },

    /// The checkpoint is not waiting for a quiz or challenge result.
    #[error("checkpoint {checkpoint_id} has no pending interaction")]
    NoPendingInteraction {
        /// The requested checkpoint.
        checkpoint_id: CheckpointId,
    },
}

/// Everything the map, HUD, and notification layers need after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// Sequence number of this tick, starting at 1.
    pub tick: u64,
    /// The `now` the tick ran at.
    pub at: DateTime<Utc>,
    /// Render data for every NPC.
    pub entities: Vec<EntitySnapshot>,
    /// Smoothed audio gains.
    pub gains: ChannelGains,
    /// Events since the previous tick.
    pub events: Vec<GameEvent>,
    /// Points banked since the previous tick.
    pub score_deltas: Vec<ScoreDelta>,
    /// Weather flag.
    pub whiteout: WhiteoutState,
    /// Wall-clock seconds since start plus penalties.
    pub elapsed_seconds: f64,
    /// HUD view of the player.
    pub player: PlayerSnapshot,
    /// Whether location fixes are currently arriving.
    pub location_available: bool,
}

/// A running adventure-mode session.
#[derive(Debug)]
pub struct Simulation {
    player: PlayerState,
    npcs: Vec<NpcEntity>,
    motion: MotionController,
    survival: SurvivalController,
    weather: WhiteoutCycle,
    checkpoints: CheckpointDetector,
    mixer: AudioMixer,
    clock: SimulationClock,
    heat_zones: Vec<Zone>,
    threat_points: Vec<GeoPoint>,
    location_available: bool,
    last_sample_at: Option<DateTime<Utc>>,
    pending_events: Vec<GameEvent>,
    pending_scores: Vec<ScoreDelta>,
    ticks: u64,
}

impl Simulation {
    /// Build a session from configuration and the event description.
    ///
    /// Spawns NPCs, derives heat and threat zones, and opens the audio
    /// engine best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if any configuration section is invalid.
    pub fn new(
        config: &SimulationConfig,
        setup: EventSetup,
        started_at: DateTime<Utc>,
        audio_engine: Box<dyn AudioEngine>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let seed = config.session.seed;

        let motion = MotionController::new(config.motion.clone())?;
        let survival = SurvivalController::new(config.survival.clone(), seed)?;
        let weather = WhiteoutCycle::new(
            config.weather.clone(),
            seed.wrapping_add(WEATHER_SEED_OFFSET),
        );
        let clock = SimulationClock::new(&config.session, started_at)?;

        let npcs = motion.spawn_npcs(&setup.checkpoints);
        let heat_zones = survival.heat_zones(&setup);
        let threat_points: Vec<GeoPoint> = setup
            .checkpoints
            .iter()
            .filter(|cp| cp.matches_any_tag(&config.audio.threat_tags))
            .filter_map(|cp| cp.position)
            .collect();

        let player = survival.initial_player();
        let checkpoints = CheckpointDetector::new(setup.checkpoints);

        let mut mixer = AudioMixer::new(config.audio.clone(), audio_engine);
        mixer.initialise();

        info!(
            npcs = npcs.len(),
            heat_zones = heat_zones.len(),
            threats = threat_points.len(),
            mandatory = checkpoints.mandatory_total(),
            seed,
            "simulation ready"
        );

        Ok(Self {
            player,
            npcs,
            motion,
            survival,
            weather,
            checkpoints,
            mixer,
            clock,
            heat_zones,
            threat_points,
            location_available: true,
            last_sample_at: None,
            pending_events: Vec::new(),
            pending_scores: Vec::new(),
            ticks: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Apply a location fix.
    ///
    /// Samples not newer than the last applied one, and samples with
    /// invalid coordinates, are ignored.
    pub fn apply_position(&mut self, sample: PositionSample) -> PositionReport {
        if self
            .last_sample_at
            .is_some_and(|last| sample.timestamp <= last)
        {
            debug!(timestamp = %sample.timestamp, "stale position sample ignored");
            return PositionReport::ignored(SampleDisposition::Stale, self.mixer.gains());
        }
        if !sample.position.is_valid() {
            warn!(
                lat = sample.position.lat,
                lng = sample.position.lng,
                "invalid position sample ignored"
            );
            return PositionReport::ignored(SampleDisposition::Invalid, self.mixer.gains());
        }

        self.last_sample_at = Some(sample.timestamp);
        self.player.position = Some(sample.position);
        if sample.heading_deg.is_some() {
            self.player.heading_deg = sample.heading_deg;
        }

        let mut events = Vec::new();
        let mut score_deltas = Vec::new();

        if !self.location_available {
            self.location_available = true;
            info!("location restored");
            events.push(GameEvent::LocationRestored);
        }

        self.detect_checkpoints(
            sample.position,
            sample.timestamp,
            &mut events,
            &mut score_deltas,
        );

        let gains = self.remix(sample.timestamp);
        PositionReport {
            disposition: SampleDisposition::Applied,
            events,
            score_deltas,
            gains,
        }
    }

    /// Record a location sensor failure. Entity motion pauses until the
    /// next valid fix; the outage is reported once.
    pub fn report_location_error(&mut self, error: LocationError) {
        if self.location_available {
            self.location_available = false;
            warn!(%error, "location lost, entity motion paused");
            self.pending_events.push(GameEvent::LocationUnavailable {
                reason: error.to_string(),
            });
        } else {
            debug!(%error, "location still unavailable");
        }
    }

    /// Close a checkpoint waiting for a quiz or challenge result.
    ///
    /// Returns the points awarded. The `checkpoint_reached` event and the
    /// score delta are reported by the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownCheckpoint`] or
    /// [`SimulationError::NoPendingInteraction`].
    pub fn resolve_interaction(
        &mut self,
        checkpoint_id: CheckpointId,
        outcome: InteractionOutcome,
        now: DateTime<Utc>,
    ) -> Result<u32, SimulationError> {
        let completion = self
            .checkpoints
            .resolve_interaction(checkpoint_id, outcome, now)?;
        let (event, delta) = self.bank(&completion);
        self.pending_events.push(event);
        self.pending_scores.push(delta);
        Ok(completion.points)
    }

    /// Enable or disable audio output. Gains keep tracking either way.
    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.mixer.set_enabled(enabled);
    }

    /// Retry a suspended audio engine, best effort.
    pub fn resume_audio(&mut self) {
        self.mixer.resume();
    }

    /// Release the audio engine. Called once when the session ends.
    pub fn shutdown(&mut self) {
        self.mixer.shutdown();
        info!(
            ticks = self.ticks,
            banked_score = self.player.banked_score,
            penalty_seconds = self.clock.penalty_seconds(),
            "simulation shut down"
        );
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance every time-driven subsystem to `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickSummary {
        self.ticks = self.ticks.saturating_add(1);
        let mut events = std::mem::take(&mut self.pending_events);
        let mut score_deltas = std::mem::take(&mut self.pending_scores);

        // --- Weather ---
        if let Some(change) = self.weather.poll(now) {
            events.push(match change {
                WhiteoutChange::Started { ends_at } => GameEvent::WhiteoutStarted { ends_at },
                WhiteoutChange::Ended => GameEvent::WhiteoutEnded,
            });
        }

        // --- Checkpoints ---
        if self.location_available {
            if let Some(position) = self.player.position {
                self.detect_checkpoints(position, now, &mut events, &mut score_deltas);
            }
        }

        // --- Motion ---
        if self.location_available && self.player.position.is_some() {
            if let Some(dt) = self.clock.poll_motion(now) {
                let transitions =
                    self.motion
                        .step_all(&mut self.npcs, self.player.position, now, dt);
                events.extend(transitions.iter().map(|t| t.to_event()));
            }
        }

        // --- Survival ---
        if let Some(position) = self.player.position {
            let due = self.clock.poll_survival(now);
            if due.is_some() || self.survival.thaw_due(now) {
                let at_heat = inside_any(&self.heat_zones, position);
                let outcome =
                    self.survival
                        .tick(&mut self.player, at_heat, now, due.unwrap_or(0.0));
                if let Some(outcome) = outcome {
                    if let SurvivalOutcome::Frozen {
                        penalty_seconds, ..
                    } = outcome
                    {
                        self.clock.add_penalty(penalty_seconds);
                    }
                    events.push(outcome.to_event());
                }
            }
        }

        // --- Audio ---
        let gains = self.remix(now);

        TickSummary {
            tick: self.ticks,
            at: now,
            entities: self.npcs.iter().map(EntitySnapshot::from).collect(),
            gains,
            events,
            score_deltas,
            whiteout: self.weather.state(),
            elapsed_seconds: self.clock.elapsed_seconds(now),
            player: self.player_snapshot(now),
            location_available: self.location_available,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current player state.
    pub const fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Every NPC, caught ones included.
    pub fn npcs(&self) -> &[NpcEntity] {
        &self.npcs
    }

    /// Status of one checkpoint.
    pub fn checkpoint_status(&self, checkpoint_id: CheckpointId) -> Option<CheckpointStatus> {
        self.checkpoints.status(checkpoint_id)
    }

    /// Mandatory checkpoints not yet visited.
    pub fn mandatory_remaining(&self) -> usize {
        self.checkpoints.mandatory_remaining()
    }

    /// Whether the event has mandatory checkpoints and all are visited.
    pub fn is_complete(&self) -> bool {
        self.checkpoints.mandatory_total() > 0 && self.checkpoints.all_mandatory_visited()
    }

    /// Whether location fixes are currently arriving.
    pub const fn location_available(&self) -> bool {
        self.location_available
    }

    /// Whether audio output is enabled.
    pub const fn audio_enabled(&self) -> bool {
        self.mixer.is_enabled()
    }

    /// Smoothed audio gains.
    pub const fn gains(&self) -> ChannelGains {
        self.mixer.gains()
    }

    /// Session clock.
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Ticks run so far.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// HUD view of the player at `now`.
    pub fn player_snapshot(&self, now: DateTime<Utc>) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.player.position,
            resource_level: self.player.resource_level,
            frozen: self.player.frozen,
            inventory: self.player.inventory,
            banked_score: self.player.banked_score,
            elapsed_seconds: self.clock.elapsed_seconds(now),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Check the player in at `position` and bank whatever completes.
    fn detect_checkpoints(
        &mut self,
        position: GeoPoint,
        now: DateTime<Utc>,
        events: &mut Vec<GameEvent>,
        score_deltas: &mut Vec<ScoreDelta>,
    ) {
        for check_in in self.checkpoints.detect(position, now) {
            match check_in {
                CheckIn::Completed(completion) => {
                    let (event, delta) = self.bank(&completion);
                    events.push(event);
                    score_deltas.push(delta);
                }
                CheckIn::InteractionRequired(event) => events.push(event),
            }
        }
    }

    /// Add a completion's points and items to the player.
    fn bank(&mut self, completion: &Completion) -> (GameEvent, ScoreDelta) {
        self.player.banked_score = self.player.banked_score.saturating_add(completion.points);
        let granted = grant_items(&mut self.player, completion.items);
        if granted < completion.items {
            debug!(
                checkpoint = %completion.checkpoint_id,
                granted,
                offered = completion.items,
                "inventory full"
            );
        }
        (completion.to_event(), completion.score_delta())
    }

    /// Distance from the player to the nearest active NPC or static threat.
    fn nearest_threat(&self) -> Option<f64> {
        let player = self.player.position?;
        let npcs = self
            .npcs
            .iter()
            .filter(|npc| npc.state.is_active())
            .map(|npc| npc.position);
        nearest_distance(player, npcs.chain(self.threat_points.iter().copied()))
    }

    fn remix(&mut self, now: DateTime<Utc>) -> ChannelGains {
        let nearest = self.nearest_threat();
        self.mixer.mix(nearest, now)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use fieldquest_types::{Checkpoint, CheckpointRequirement, Interaction, NpcState};
    use fieldquest_world::{LocalVector, offset_by};

    use super::*;
    use crate::audio::NullAudioEngine;

    const START: GeoPoint = GeoPoint::new(59.3293, 18.0686);

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn north(meters: f64) -> GeoPoint {
        offset_by(START, LocalVector::new(0.0, meters))
    }

    fn sample(position: GeoPoint, at: DateTime<Utc>) -> PositionSample {
        PositionSample {
            position,
            accuracy_m: Some(5.0),
            heading_deg: None,
            timestamp: at,
        }
    }

    fn creature(at: GeoPoint) -> Checkpoint {
        Checkpoint {
            id: CheckpointId::new(),
            name: "Fox".to_owned(),
            position: Some(at),
            radius_m: 10.0,
            requirement: CheckpointRequirement::Optional,
            points: 0,
            items: 0,
            interaction: Interaction::None,
            tags: vec!["creature".to_owned()],
            order: None,
        }
    }

    fn simulation(checkpoints: Vec<Checkpoint>) -> Simulation {
        simulation_with(&SimulationConfig::default(), checkpoints)
    }

    fn simulation_with(config: &SimulationConfig, checkpoints: Vec<Checkpoint>) -> Simulation {
        let setup = EventSetup {
            start: None,
            checkpoints,
        };
        Simulation::new(config, setup, t0(), Box::new(NullAudioEngine::new())).unwrap()
    }

    fn landmark(name: &str, at: GeoPoint, order: u32) -> Checkpoint {
        Checkpoint {
            id: CheckpointId::new(),
            name: name.to_owned(),
            position: Some(at),
            radius_m: 25.0,
            requirement: CheckpointRequirement::Mandatory,
            points: 10,
            items: 0,
            interaction: Interaction::None,
            tags: Vec::new(),
            order: Some(order),
        }
    }

    #[test]
    fn stale_and_invalid_samples_are_ignored() {
        let mut sim = simulation(Vec::new());
        let later = t0() + TimeDelta::seconds(5);
        assert!(sim.apply_position(sample(north(0.0), later)).is_applied());

        let stale = sim.apply_position(sample(north(50.0), t0()));
        assert_eq!(stale.disposition, SampleDisposition::Stale);
        assert_eq!(sim.player().position, Some(north(0.0)));

        let invalid = sim.apply_position(sample(GeoPoint::new(f64::NAN, 0.0), later + TimeDelta::seconds(1)));
        assert_eq!(invalid.disposition, SampleDisposition::Invalid);
    }

    #[test]
    fn no_motion_or_survival_before_first_fix() {
        let mut sim = simulation(vec![creature(north(0.0))]);
        for i in 0..20 {
            let summary = sim.tick(t0() + TimeDelta::seconds(i));
            assert!(summary.events.is_empty());
        }
        assert_eq!(sim.npcs()[0].state, NpcState::Guarding);
        assert!((sim.player().resource_level - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn location_outage_pauses_motion_and_reports_once() {
        let mut sim = simulation(vec![creature(north(0.0))]);
        let _ = sim.apply_position(sample(north(-30.0), t0()));
        let _ = sim.tick(t0());
        assert_eq!(sim.npcs()[0].state, NpcState::Fleeing);

        sim.report_location_error(LocationError::Timeout);
        sim.report_location_error(LocationError::Timeout);
        let summary = sim.tick(t0() + TimeDelta::seconds(1));
        let outages = summary
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LocationUnavailable { .. }))
            .count();
        assert_eq!(outages, 1);
        assert!(!summary.location_available);

        let frozen_at = sim.npcs()[0].position;
        for i in 2..6 {
            let _ = sim.tick(t0() + TimeDelta::seconds(i));
        }
        assert_eq!(sim.npcs()[0].position, frozen_at);

        let report = sim.apply_position(sample(north(-30.0), t0() + TimeDelta::seconds(6)));
        assert!(report.events.contains(&GameEvent::LocationRestored));
        assert!(sim.location_available());
    }

    #[test]
    fn threats_drive_audio() {
        let mut sim = simulation(vec![creature(north(0.0))]);
        let _ = sim.apply_position(sample(north(-100.0), t0()));
        let _ = sim.apply_position(sample(north(-20.0), t0() + TimeDelta::seconds(1)));
        let report = sim.apply_position(sample(north(-20.0), t0() + TimeDelta::seconds(3)));
        assert!(report.gains.danger > 0.0);
        assert!(report.gains.danger <= 1.0);
    }

    #[test]
    fn summary_serializes_events_adjacently_tagged() {
        let mut sim = simulation(vec![creature(north(0.0))]);
        let _ = sim.apply_position(sample(north(-30.0), t0()));
        let summary = sim.tick(t0());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["tick"], 1);
        assert_eq!(json["events"][0]["type"], "spotted");
        assert_eq!(json["events"][0]["payload"]["name"], "Fox");
        assert_eq!(json["entities"][0]["state"], "fleeing");
        assert_eq!(json["location_available"], true);
    }

    #[test]
    fn caught_npc_stops_counting_as_threat() {
        let mut sim = simulation(vec![creature(north(0.0))]);
        let _ = sim.apply_position(sample(north(-50.0), t0()));
        let _ = sim.tick(t0());
        let fox = sim.npcs()[0].position;
        let _ = sim.apply_position(sample(fox, t0() + TimeDelta::seconds(1)));
        let summary = sim.tick(t0() + TimeDelta::seconds(1));
        assert!(summary.events.iter().any(|e| matches!(e, GameEvent::Caught { .. })));
        assert_eq!(summary.entities[0].state, NpcState::Caught);
        assert!(sim.nearest_threat().is_none());
    }

    #[test]
    fn tick_checks_in_a_stationary_player() {
        // Two overlapping checkpoints: the quiz unlocks the second.
        let mut quiz = landmark("Well", north(0.0), 1);
        quiz.interaction = Interaction::Challenge {
            prompt: "Draw water".to_owned(),
        };
        let bench = landmark("Bench", north(10.0), 2);
        let (quiz_id, bench_id) = (quiz.id, bench.id);
        let mut sim = simulation(vec![quiz, bench]);

        let report = sim.apply_position(sample(north(5.0), t0()));
        assert_eq!(report.events.len(), 1);
        assert_eq!(sim.checkpoint_status(bench_id), Some(CheckpointStatus::Unvisited));

        let _ = sim
            .resolve_interaction(quiz_id, InteractionOutcome::Correct, t0() + TimeDelta::seconds(2))
            .unwrap();

        // No new fix: the next tick alone completes the bench.
        let summary = sim.tick(t0() + TimeDelta::seconds(3));
        let reached: Vec<CheckpointId> = summary
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CheckpointReached { checkpoint_id, .. } => Some(*checkpoint_id),
                _ => None,
            })
            .collect();
        assert_eq!(reached, vec![quiz_id, bench_id]);
        assert_eq!(summary.score_deltas.len(), 2);
        assert_eq!(sim.checkpoint_status(bench_id), Some(CheckpointStatus::Visited));
        assert!(sim.is_complete());

        // Nothing is banked twice.
        assert!(sim.tick(t0() + TimeDelta::seconds(4)).events.is_empty());
        assert_eq!(sim.player().banked_score, 20);
    }

    #[test]
    fn slow_survival_rate_keeps_full_decay() {
        let mut config = SimulationConfig::default();
        config.session.survival_hz = 0.5;
        let mut sim = simulation_with(&config, Vec::new());
        let _ = sim.apply_position(sample(north(500.0), t0()));
        for second in 0..=50 {
            let _ = sim.tick(t0() + TimeDelta::seconds(second));
        }
        assert!((sim.player().resource_level - 50.0).abs() < 1e-9);
    }

    #[test]
    fn whiteout_reaches_the_summary() {
        let mut config = SimulationConfig::default();
        config.weather.enabled = true;
        config.weather.calm_min_seconds = 5.0;
        config.weather.calm_max_seconds = 5.0;
        config.weather.whiteout_min_seconds = 3.0;
        config.weather.whiteout_max_seconds = 3.0;
        let mut sim = simulation_with(&config, Vec::new());

        let mut summaries = Vec::new();
        for second in 0..=8 {
            summaries.push(sim.tick(t0() + TimeDelta::seconds(second)));
        }

        assert!(!summaries[4].whiteout.active);
        assert_eq!(
            summaries[5].events,
            vec![GameEvent::WhiteoutStarted {
                ends_at: t0() + TimeDelta::seconds(8)
            }]
        );
        assert!(summaries[5].whiteout.active);
        assert!(summaries[7].whiteout.active);
        assert_eq!(summaries[8].events, vec![GameEvent::WhiteoutEnded]);
        assert!(!summaries[8].whiteout.active);
        let flips = summaries.iter().map(|s| s.events.len()).sum::<usize>();
        assert_eq!(flips, 2);
    }
}
