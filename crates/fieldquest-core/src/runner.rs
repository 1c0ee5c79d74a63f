//! Session loop runner.
//!
//! [`run_session`] is the top-level async function that drives one
//! session. It multiplexes three inputs:
//!
//! - **Stop requests** from [`SessionControl`] end the session cleanly.
//! - **A periodic timer** at the motion rate runs [`Simulation::tick`]
//!   after applying queued control requests.
//! - **The position stream** feeds [`Simulation::apply_position`] and
//!   [`Simulation::report_location_error`] as updates arrive.
//!
//! The session also ends when the stream closes or every mandatory
//! checkpoint has been visited. The audio engine is shut down on every
//! exit path.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clock::TimeSource;
use crate::control::SessionControl;
use crate::position::{PositionReport, PositionUpdate};
use crate::tick::{Simulation, TickSummary};

/// Errors that can occur before the session loop starts.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The motion period cannot drive a timer.
    #[error("invalid tick interval: {reason}")]
    InvalidInterval {
        /// Explanation of what is wrong with the interval.
        reason: String,
    },
}

/// Reason why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// A stop was requested through [`SessionControl`].
    Stopped,
    /// The position source closed.
    PositionStreamClosed,
    /// Every mandatory checkpoint has been visited.
    AllMandatoryVisited,
}

/// Result of a session run.
#[derive(Debug)]
pub struct SessionResult {
    /// The reason the session ended.
    pub end_reason: SessionEndReason,
    /// Total ticks executed.
    pub ticks: u64,
    /// Position samples that were applied (stale and invalid ones excluded).
    pub samples_applied: u64,
    /// The last tick summary, if any tick ran.
    pub final_summary: Option<TickSummary>,
}

/// Observer hooks invoked by the session loop.
pub trait SessionCallback: Send {
    /// Called after every tick.
    fn on_tick(&mut self, summary: &TickSummary);

    /// Called after every position sample, applied or not.
    fn on_position(&mut self, report: &PositionReport);
}

/// A callback that ignores everything.
pub struct NoOpCallback;

impl SessionCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}

    fn on_position(&mut self, _report: &PositionReport) {}
}

/// Run a session until it is stopped, its position stream closes, or all
/// mandatory checkpoints are visited.
///
/// # Arguments
///
/// * `sim` - The session state
/// * `positions` - Location fixes and sensor failures, in arrival order
/// * `control` - Shared control state (stop, audio toggle, interactions)
/// * `callback` - Observer hooks for ticks and position reports
/// * `time` - Source of `now` for every simulation call
///
/// # Errors
///
/// Returns [`RunnerError`] if the configured motion rate cannot drive a
/// timer. Nothing fails once the loop is running.
pub async fn run_session<S>(
    sim: &mut Simulation,
    mut positions: S,
    control: &Arc<SessionControl>,
    callback: &mut dyn SessionCallback,
    time: &dyn TimeSource,
) -> Result<SessionResult, RunnerError>
where
    S: Stream<Item = PositionUpdate> + Unpin,
{
    let period = sim
        .clock()
        .motion_period()
        .to_std()
        .map_err(|e| RunnerError::InvalidInterval {
            reason: e.to_string(),
        })?;
    if period.is_zero() {
        return Err(RunnerError::InvalidInterval {
            reason: "motion period is zero".to_owned(),
        });
    }

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_summary: Option<TickSummary> = None;
    let mut samples_applied: u64 = 0;

    info!(
        period_ms = period.as_millis(),
        mandatory_remaining = sim.mandatory_remaining(),
        "Session starting"
    );

    let end_reason = loop {
        tokio::select! {
            biased;

            () = control.stopped() => {
                info!("Session stop requested");
                break SessionEndReason::Stopped;
            }

            _ = ticker.tick() => {
                apply_controls(sim, control, time).await;
                let summary = sim.tick(time.now());
                callback.on_tick(&summary);
                last_summary = Some(summary);
                if sim.is_complete() {
                    break SessionEndReason::AllMandatoryVisited;
                }
            }

            update = positions.next() => {
                match update {
                    Some(PositionUpdate::Sample(sample)) => {
                        let report = sim.apply_position(sample);
                        if report.is_applied() {
                            samples_applied = samples_applied.saturating_add(1);
                        }
                        callback.on_position(&report);
                        if sim.is_complete() {
                            // One last tick so observers see the final state.
                            let summary = sim.tick(time.now());
                            callback.on_tick(&summary);
                            last_summary = Some(summary);
                            break SessionEndReason::AllMandatoryVisited;
                        }
                    }
                    Some(PositionUpdate::Error(error)) => {
                        sim.report_location_error(error);
                    }
                    None => {
                        info!("Position stream closed");
                        break SessionEndReason::PositionStreamClosed;
                    }
                }
            }
        }
    };

    sim.shutdown();

    Ok(SessionResult {
        end_reason,
        ticks: sim.ticks(),
        samples_applied,
        final_summary: last_summary,
    })
}

/// Apply audio toggles, resume requests, and queued interaction results.
async fn apply_controls(sim: &mut Simulation, control: &SessionControl, time: &dyn TimeSource) {
    if let Some(enabled) = control.take_audio_change() {
        sim.set_audio_enabled(enabled);
    }
    if control.take_audio_resume() {
        sim.resume_audio();
    }
    for submission in control.drain_interactions().await {
        match sim.resolve_interaction(submission.checkpoint_id, submission.outcome, time.now()) {
            Ok(points) => debug!(
                checkpoint = %submission.checkpoint_id,
                points,
                "Interaction resolved"
            ),
            Err(e) => warn!(
                checkpoint = %submission.checkpoint_id,
                error = %e,
                "Interaction result rejected"
            ),
        }
    }
}

/// Log the session end sequence.
pub fn log_session_end(result: &SessionResult) {
    info!(
        reason = ?result.end_reason,
        ticks = result.ticks,
        samples_applied = result.samples_applied,
        "Session ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            banked_score = summary.player.banked_score,
            elapsed_seconds = summary.elapsed_seconds,
            inventory = summary.player.inventory,
            "Final tick summary"
        );
    } else {
        warn!("Session ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, TimeDelta, Utc};
    use fieldquest_types::{
        Checkpoint, CheckpointId, CheckpointRequirement, EventSetup, GameEvent, GeoPoint,
        Interaction, InteractionOutcome, PositionSample,
    };
    use futures::stream;

    use super::*;
    use crate::audio::NullAudioEngine;
    use crate::config::SimulationConfig;

    const START: GeoPoint = GeoPoint::new(59.3293, 18.0686);

    /// Wall clock that follows tokio's (pausable) clock.
    struct TokioTime {
        origin: tokio::time::Instant,
        at: DateTime<Utc>,
    }

    impl TokioTime {
        fn new() -> Self {
            Self {
                origin: tokio::time::Instant::now(),
                at: t0(),
            }
        }
    }

    impl TimeSource for TokioTime {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap();
            self.at + elapsed
        }
    }

    #[derive(Default)]
    struct Recorder {
        ticks: u64,
        events: Vec<GameEvent>,
    }

    impl SessionCallback for Recorder {
        fn on_tick(&mut self, summary: &TickSummary) {
            self.ticks += 1;
            self.events.extend(summary.events.iter().cloned());
        }

        fn on_position(&mut self, report: &PositionReport) {
            self.events.extend(report.events.iter().cloned());
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn mandatory(interaction: Interaction) -> Checkpoint {
        Checkpoint {
            id: CheckpointId::new(),
            name: "Summit".to_owned(),
            position: Some(START),
            radius_m: 20.0,
            requirement: CheckpointRequirement::Mandatory,
            points: 50,
            items: 0,
            interaction,
            tags: Vec::new(),
            order: None,
        }
    }

    fn simulation(checkpoints: Vec<Checkpoint>) -> Simulation {
        Simulation::new(
            &SimulationConfig::default(),
            EventSetup {
                start: None,
                checkpoints,
            },
            t0(),
            Box::new(NullAudioEngine::new()),
        )
        .unwrap()
    }

    fn at_start(seconds: i64) -> PositionUpdate {
        PositionUpdate::Sample(PositionSample {
            position: START,
            accuracy_m: Some(4.0),
            heading_deg: None,
            timestamp: t0() + TimeDelta::seconds(seconds),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_start() {
        let mut sim = simulation(Vec::new());
        let control = Arc::new(SessionControl::default());
        control.request_stop();

        let result = run_session(
            &mut sim,
            stream::pending(),
            &control,
            &mut NoOpCallback,
            &TokioTime::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Stopped);
        assert_eq!(result.ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_stream_ends_session() {
        let mut sim = simulation(Vec::new());
        let control = Arc::new(SessionControl::default());

        let result = run_session(
            &mut sim,
            stream::iter(Vec::<PositionUpdate>::new()),
            &control,
            &mut NoOpCallback,
            &TokioTime::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::PositionStreamClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_running() {
        let mut sim = simulation(Vec::new());
        let control = Arc::new(SessionControl::default());
        let stopper = {
            let control = Arc::clone(&control);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                control.request_stop();
            })
        };
        let mut recorder = Recorder::default();

        let result = run_session(
            &mut sim,
            stream::pending(),
            &control,
            &mut recorder,
            &TokioTime::new(),
        )
        .await
        .unwrap();
        stopper.await.unwrap();

        assert_eq!(result.end_reason, SessionEndReason::Stopped);
        assert!(result.ticks >= 5);
        assert_eq!(recorder.ticks, result.ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn visiting_every_mandatory_checkpoint_completes() {
        let mut sim = simulation(vec![mandatory(Interaction::None)]);
        let control = Arc::new(SessionControl::default());
        let mut recorder = Recorder::default();

        let positions = stream::iter(vec![at_start(1)]).chain(stream::pending());
        let result = run_session(&mut sim, positions, &control, &mut recorder, &TokioTime::new())
            .await
            .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::AllMandatoryVisited);
        assert_eq!(result.samples_applied, 1);
        assert_eq!(result.final_summary.unwrap().player.banked_score, 50);
        assert!(
            recorder
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::CheckpointReached { points: 50, .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn queued_interaction_is_applied_on_tick() {
        let checkpoint = mandatory(Interaction::Challenge {
            prompt: "Build a snowman".to_owned(),
        });
        let id = checkpoint.id;
        let mut sim = simulation(vec![checkpoint]);
        let control = Arc::new(SessionControl::default());
        let submitter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                control
                    .submit_interaction(id, InteractionOutcome::Correct)
                    .await;
            })
        };
        let mut recorder = Recorder::default();

        let positions = stream::iter(vec![at_start(0)]).chain(stream::pending());
        let result = run_session(&mut sim, positions, &control, &mut recorder, &TokioTime::new())
            .await
            .unwrap();
        submitter.await.unwrap();

        assert_eq!(result.end_reason, SessionEndReason::AllMandatoryVisited);
        let required = recorder
            .events
            .iter()
            .position(|e| matches!(e, GameEvent::InteractionRequired { .. }))
            .unwrap();
        let reached = recorder
            .events
            .iter()
            .position(|e| matches!(e, GameEvent::CheckpointReached { .. }))
            .unwrap();
        assert!(required < reached);
        assert_eq!(sim.player().banked_score, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn audio_toggle_reaches_simulation() {
        let mut sim = simulation(Vec::new());
        let control = Arc::new(SessionControl::new(true));
        assert!(sim.audio_enabled());
        control.set_audio_enabled(false);

        apply_controls(&mut sim, &control, &TokioTime::new()).await;
        assert!(!sim.audio_enabled());
        assert_eq!(control.take_audio_change(), None);
    }
}
