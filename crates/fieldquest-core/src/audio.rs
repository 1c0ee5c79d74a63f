//! Proximity audio: distance to the nearest threat drives three gain channels.
//!
//! The mixer owns the smoothed gains and an injected [`AudioEngine`] that
//! actually plays them. Mixing never fails: when the engine is missing,
//! suspended, or broken the gains are still computed and the output is
//! dropped. Engine failures are logged once per failure streak.
//!
//! # Bands
//!
//! | Distance              | drone       | tension     | danger      |
//! |-----------------------|-------------|-------------|-------------|
//! | `< danger_radius`     | 0.3         | 0.6         | 1.0 -> 0.4  |
//! | `< tension_radius`    | 0.4 -> 0.1  | 0.8 -> 0.0  | 0           |
//! | beyond / no threat    | 0           | 0           | 0           |

use chrono::{DateTime, Utc};
use fieldquest_types::ChannelGains;
use fieldquest_world::seconds_between;
use tracing::{debug, info, warn};

use crate::config::AudioConfig;

/// Errors reported by an [`AudioEngine`]. Never propagated past the mixer.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// The output device could not be opened.
    #[error("audio init failed: {reason}")]
    Init {
        /// Description of the failure.
        reason: String,
    },

    /// The platform refused to resume playback (autoplay policy, focus loss).
    #[error("audio resume failed: {reason}")]
    Resume {
        /// Description of the failure.
        reason: String,
    },

    /// Pushing gains to the output failed.
    #[error("audio output failed: {reason}")]
    Output {
        /// Description of the failure.
        reason: String,
    },
}

/// Lifecycle state of an audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioEngineState {
    /// `init` has not been called.
    #[default]
    Uninitialised,
    /// Initialised but not playing (awaiting a user gesture).
    Suspended,
    /// Playing.
    Running,
    /// No audio device; gains are dropped.
    Unavailable,
    /// Shut down. Terminal.
    Closed,
}

/// A sink for channel gains.
pub trait AudioEngine: Send {
    /// Open the output. May leave the engine suspended.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Init`] if no output is available.
    fn init(&mut self) -> Result<(), AudioError>;

    /// Resume a suspended output.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Resume`] if the platform refuses.
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Push new channel gains.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Output`] if the output rejected the update.
    fn apply(&mut self, gains: &ChannelGains) -> Result<(), AudioError>;

    /// Release the output.
    fn shutdown(&mut self);

    /// Current lifecycle state.
    fn state(&self) -> AudioEngineState;
}

/// Headless engine that accepts and discards everything.
#[derive(Debug, Clone, Default)]
pub struct NullAudioEngine {
    state: AudioEngineState,
    last_applied: Option<ChannelGains>,
}

impl NullAudioEngine {
    /// Create an uninitialised engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last gains pushed while running.
    pub const fn last_applied(&self) -> Option<ChannelGains> {
        self.last_applied
    }
}

impl AudioEngine for NullAudioEngine {
    fn init(&mut self) -> Result<(), AudioError> {
        if self.state != AudioEngineState::Closed {
            self.state = AudioEngineState::Running;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.init()
    }

    fn apply(&mut self, gains: &ChannelGains) -> Result<(), AudioError> {
        self.last_applied = Some(*gains);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.state = AudioEngineState::Closed;
    }

    fn state(&self) -> AudioEngineState {
        self.state
    }
}

/// Target gains for the nearest threat distance.
pub fn target_gains(config: &AudioConfig, nearest_threat_m: Option<f64>) -> ChannelGains {
    let Some(distance) = nearest_threat_m.filter(|d| d.is_finite() && *d >= 0.0) else {
        return ChannelGains::SILENT;
    };
    let danger_edge = config.danger_radius_m;
    let tension_edge = config.tension_radius_m;

    let gains = if distance < danger_edge {
        // 0 at the edge, 1 at the threat.
        let closeness = 1.0 - distance / danger_edge;
        ChannelGains {
            drone: 0.3,
            tension: 0.6,
            danger: 0.6f64.mul_add(closeness, 0.4),
        }
    } else if distance < tension_edge {
        let closeness = 1.0 - (distance - danger_edge) / (tension_edge - danger_edge);
        ChannelGains {
            drone: 0.3f64.mul_add(closeness, 0.1),
            tension: 0.8 * closeness,
            danger: 0.0,
        }
    } else {
        ChannelGains::SILENT
    };
    gains.clamped()
}

/// Move `current` toward `target` by one exponential smoothing step.
pub fn smooth(current: ChannelGains, target: ChannelGains, dt: f64, tau: f64) -> ChannelGains {
    let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
    let alpha = if tau > 0.0 {
        1.0 - (-dt / tau).exp()
    } else {
        1.0
    };
    let step = |from: f64, to: f64| (to - from).mul_add(alpha, from);
    ChannelGains {
        drone: step(current.drone, target.drone),
        tension: step(current.tension, target.tension),
        danger: step(current.danger, target.danger),
    }
    .clamped()
}

/// Smoothed three-channel mixer with an injected output.
pub struct AudioMixer {
    config: AudioConfig,
    engine: Box<dyn AudioEngine>,
    enabled: bool,
    target: ChannelGains,
    gains: ChannelGains,
    last_mix_at: Option<DateTime<Utc>>,
    /// Set after a failure has been logged; cleared by the next success.
    failure_logged: bool,
}

impl std::fmt::Debug for AudioMixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioMixer")
            .field("enabled", &self.enabled)
            .field("engine_state", &self.engine.state())
            .field("gains", &self.gains)
            .finish_non_exhaustive()
    }
}

impl AudioMixer {
    /// Create a mixer. The engine is not touched until [`initialise`](Self::initialise).
    pub fn new(config: AudioConfig, engine: Box<dyn AudioEngine>) -> Self {
        let enabled = config.enabled;
        Self {
            config,
            engine,
            enabled,
            target: ChannelGains::SILENT,
            gains: ChannelGains::SILENT,
            last_mix_at: None,
            failure_logged: false,
        }
    }

    /// Open the engine, best effort.
    pub fn initialise(&mut self) {
        let result = self.engine.init();
        self.record("init", result);
        info!(state = ?self.engine.state(), "audio engine initialised");
    }

    /// Retry a suspended engine, best effort. Safe to call repeatedly.
    pub fn resume(&mut self) {
        match self.engine.state() {
            AudioEngineState::Closed => {}
            AudioEngineState::Uninitialised => self.initialise(),
            _ => {
                let result = self.engine.resume();
                self.record("resume", result);
            }
        }
    }

    /// Enable or disable output. Distance tracking continues either way.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!(enabled, "audio output toggled");
        }
        self.enabled = enabled;
        self.push();
    }

    /// Whether output is enabled.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current smoothed gains.
    pub const fn gains(&self) -> ChannelGains {
        self.gains
    }

    /// Current target gains.
    pub const fn target(&self) -> ChannelGains {
        self.target
    }

    /// State of the injected engine.
    pub fn engine_state(&self) -> AudioEngineState {
        self.engine.state()
    }

    /// Recompute the mix for the nearest threat distance at `now`.
    ///
    /// Returns the smoothed gains. A `now` earlier than the previous mix
    /// retargets without advancing the smoothing.
    pub fn mix(&mut self, nearest_threat_m: Option<f64>, now: DateTime<Utc>) -> ChannelGains {
        let dt = match self.last_mix_at {
            Some(last) if now > last => seconds_between(last, now),
            _ => 0.0,
        };
        if self.last_mix_at.is_none_or(|last| now > last) {
            self.last_mix_at = Some(now);
        }
        self.target = target_gains(&self.config, nearest_threat_m);
        self.gains = smooth(self.gains, self.target, dt, self.config.smoothing_tau_seconds);
        self.push();
        self.gains
    }

    /// Release the engine. Further mixes only update internal state.
    pub fn shutdown(&mut self) {
        if self.engine.state() != AudioEngineState::Closed {
            self.engine.shutdown();
            info!("audio engine shut down");
        }
    }

    fn push(&mut self) {
        if self.engine.state() != AudioEngineState::Running {
            return;
        }
        let output = if self.enabled {
            self.gains
        } else {
            ChannelGains::SILENT
        };
        let result = self.engine.apply(&output);
        self.record("apply", result);
    }

    fn record(&mut self, operation: &str, result: Result<(), AudioError>) {
        match result {
            Ok(()) => self.failure_logged = false,
            Err(err) if !self.failure_logged => {
                warn!(operation, error = %err, "audio unavailable, continuing silently");
                self.failure_logged = true;
            }
            Err(err) => debug!(operation, error = %err, "audio still unavailable"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::TimeDelta;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    use super::*;

    /// Counts `WARN` events.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Records pushes into a shared log; can be told to fail.
    struct RecordingEngine {
        state: AudioEngineState,
        fail_apply: bool,
        resume_works: bool,
        pushed: Arc<Mutex<Vec<ChannelGains>>>,
    }

    impl AudioEngine for RecordingEngine {
        fn init(&mut self) -> Result<(), AudioError> {
            self.state = AudioEngineState::Suspended;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), AudioError> {
            if self.resume_works {
                self.state = AudioEngineState::Running;
                Ok(())
            } else {
                Err(AudioError::Resume {
                    reason: "blocked".to_owned(),
                })
            }
        }

        fn apply(&mut self, gains: &ChannelGains) -> Result<(), AudioError> {
            if self.fail_apply {
                return Err(AudioError::Output {
                    reason: "device lost".to_owned(),
                });
            }
            self.pushed.lock().unwrap().push(*gains);
            Ok(())
        }

        fn shutdown(&mut self) {
            self.state = AudioEngineState::Closed;
        }

        fn state(&self) -> AudioEngineState {
            self.state
        }
    }

    fn recording(resume_works: bool, fail_apply: bool) -> (AudioMixer, Arc<Mutex<Vec<ChannelGains>>>) {
        let pushed = Arc::new(Mutex::new(Vec::new()));
        let engine = RecordingEngine {
            state: AudioEngineState::Uninitialised,
            fail_apply,
            resume_works,
            pushed: Arc::clone(&pushed),
        };
        (AudioMixer::new(AudioConfig::default(), Box::new(engine)), pushed)
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn band_edges() {
        let config = AudioConfig::default();
        let at_threat = target_gains(&config, Some(0.0));
        assert!((at_threat.danger - 1.0).abs() < 1e-9);
        assert!((at_threat.tension - 0.6).abs() < 1e-9);
        assert!((at_threat.drone - 0.3).abs() < 1e-9);

        let just_inside = target_gains(&config, Some(39.999));
        assert!((just_inside.danger - 0.4).abs() < 1e-3);

        let tension_start = target_gains(&config, Some(40.0));
        assert!(tension_start.danger.abs() < f64::EPSILON);
        assert!((tension_start.tension - 0.8).abs() < 1e-9);
        assert!((tension_start.drone - 0.4).abs() < 1e-9);

        let mid = target_gains(&config, Some(95.0));
        assert!((mid.tension - 0.4).abs() < 1e-9);

        assert_eq!(target_gains(&config, Some(150.0)), ChannelGains::SILENT);
        assert_eq!(target_gains(&config, None), ChannelGains::SILENT);
    }

    #[test]
    fn smoothing_moves_monotonically_toward_target() {
        let target = ChannelGains {
            drone: 0.3,
            tension: 0.6,
            danger: 1.0,
        };
        let mut gains = ChannelGains::SILENT;
        let mut previous = gains.danger;
        for _ in 0..50 {
            gains = smooth(gains, target, 0.2, 0.5);
            assert!(gains.danger >= previous);
            assert!(gains.danger <= 1.0);
            previous = gains.danger;
        }
        assert!((gains.danger - 1.0).abs() < 1e-3);
    }

    #[test]
    fn one_time_constant_covers_most_of_the_gap() {
        let target = ChannelGains {
            drone: 0.0,
            tension: 0.0,
            danger: 1.0,
        };
        let gains = smooth(ChannelGains::SILENT, target, 0.5, 0.5);
        assert!((gains.danger - (1.0 - (-1.0f64).exp())).abs() < 1e-9);
    }

    #[test]
    fn suspended_engine_drops_output_but_gains_track() {
        let (mut mixer, pushed) = recording(false, false);
        mixer.initialise();
        assert_eq!(mixer.engine_state(), AudioEngineState::Suspended);
        let _ = mixer.mix(Some(10.0), t0());
        let gains = mixer.mix(Some(10.0), t0() + TimeDelta::seconds(1));
        assert!(gains.danger > 0.5);
        assert!(pushed.lock().unwrap().is_empty());

        // Resume fails quietly and can be retried.
        mixer.resume();
        mixer.resume();
        assert_eq!(mixer.engine_state(), AudioEngineState::Suspended);
    }

    #[test]
    fn disabled_mixer_pushes_silence_and_keeps_state() {
        let (mut mixer, pushed) = recording(true, false);
        mixer.initialise();
        mixer.resume();
        assert_eq!(mixer.engine_state(), AudioEngineState::Running);

        let _ = mixer.mix(Some(5.0), t0());
        let _ = mixer.mix(Some(5.0), t0() + TimeDelta::seconds(2));
        mixer.set_enabled(false);
        let gains = mixer.mix(Some(5.0), t0() + TimeDelta::seconds(3));
        assert!(gains.danger > 0.9);

        let log = pushed.lock().unwrap();
        assert_eq!(*log.last().unwrap(), ChannelGains::SILENT);
        assert!(log.iter().any(|g| g.danger > 0.5));
    }

    #[test]
    fn output_failures_never_escape() {
        let (mut mixer, _pushed) = recording(true, true);
        mixer.initialise();
        mixer.resume();
        for i in 0..5 {
            let _ = mixer.mix(Some(20.0), t0() + TimeDelta::seconds(i));
        }
        assert!(mixer.gains().danger > 0.0);
    }

    #[test]
    fn failure_streak_warns_once_and_rearms_after_success() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));

        tracing::subscriber::with_default(subscriber, || {
            let (mut mixer, _pushed) = recording(true, true);
            mixer.initialise();
            mixer.resume();
            for i in 0..5 {
                let _ = mixer.mix(Some(20.0), t0() + TimeDelta::seconds(i));
            }
            assert_eq!(warnings.load(Ordering::SeqCst), 1);

            // A successful resume ends the streak; the next failure warns again.
            mixer.resume();
            for i in 5..8 {
                let _ = mixer.mix(Some(20.0), t0() + TimeDelta::seconds(i));
            }
            assert_eq!(warnings.load(Ordering::SeqCst), 2);
        });
    }

    #[test]
    fn earlier_timestamp_does_not_advance_smoothing() {
        let (mut mixer, _pushed) = recording(true, false);
        let _ = mixer.mix(Some(5.0), t0());
        let _ = mixer.mix(Some(5.0), t0() + TimeDelta::seconds(1));
        let before = mixer.gains();
        assert!(before.danger > 0.0);
        let after = mixer.mix(Some(5.0), t0() - TimeDelta::seconds(3));
        assert_eq!(before, after);
    }

    #[test]
    fn null_engine_runs_after_init_and_closes() {
        let mut engine = NullAudioEngine::new();
        assert_eq!(engine.state(), AudioEngineState::Uninitialised);
        engine.init().unwrap();
        assert_eq!(engine.state(), AudioEngineState::Running);
        engine.apply(&ChannelGains::SILENT).unwrap();
        assert_eq!(engine.last_applied(), Some(ChannelGains::SILENT));
        engine.shutdown();
        assert!(engine.resume().is_ok());
        assert_eq!(engine.state(), AudioEngineState::Closed);
    }
}
