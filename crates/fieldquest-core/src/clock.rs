//! Simulation clock: per-subsystem cadences and the elapsed-time score.
//!
//! There is no tick counter driving game time. Every subsystem keeps a
//! [`Cadence`] that remembers when it last ran; the caller supplies `now`
//! and the cadence answers whether the subsystem is due and with which
//! time step. This keeps the deltas monotonic and bounded no matter how
//! irregularly the host wakes the loop (backgrounded tabs, slow devices).
//!
//! # Design Principles
//!
//! - `now` is always injected, so tests and replays drive a fake clock.
//! - A `now` earlier than the last run is ignored; cadences never move
//!   backwards.
//! - Time steps are clamped to a sanity cap before any integration.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use fieldquest_world::{seconds_between, seconds_to_delta};

use crate::config::SessionConfig;

/// Cadence jitter tolerated when deciding whether a subsystem is due.
const DUE_TOLERANCE_SECONDS: f64 = 0.005;

/// Errors that can occur when building the clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// A rate or step cap is not a positive finite number.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Source of the current wall-clock time.
pub trait TimeSource: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time via [`Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays. Millisecond resolution.
#[derive(Debug)]
pub struct ManualTimeSource {
    millis: AtomicI64,
}

impl ManualTimeSource {
    /// Start the clock at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(at.timestamp_millis()),
        }
    }

    /// Jump to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::Release);
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let _ = self
            .millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |ms| {
                Some(ms.saturating_add(delta.num_milliseconds()))
            });
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::Acquire)).unwrap_or_default()
    }
}

/// Fixed-rate schedule for one subsystem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    /// Seconds between runs.
    interval: f64,
    /// When the subsystem last ran. `None` until primed.
    last_run: Option<DateTime<Utc>>,
}

impl Cadence {
    /// Create a cadence running at `hz` times per second.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `hz` is not positive and finite.
    pub fn from_hz(hz: f64) -> Result<Self, ClockError> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("rate must be > 0 Hz (got {hz})"),
            });
        }
        Ok(Self {
            interval: 1.0 / hz,
            last_run: None,
        })
    }

    /// Seconds between runs.
    pub const fn interval(&self) -> f64 {
        self.interval
    }

    /// When the subsystem last ran.
    pub const fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    /// Whether the subsystem is due at `now`, and with which time step.
    ///
    /// The first poll primes the cadence and returns `Some(0.0)`. Returned
    /// steps are clamped to `max_step` seconds, but never below one
    /// interval, so a slow cadence still integrates its full period.
    pub fn poll(&mut self, now: DateTime<Utc>, max_step: f64) -> Option<f64> {
        let Some(last) = self.last_run else {
            self.last_run = Some(now);
            return Some(0.0);
        };
        if now < last {
            return None;
        }
        let elapsed = seconds_between(last, now);
        if elapsed + DUE_TOLERANCE_SECONDS < self.interval {
            return None;
        }
        self.last_run = Some(now);
        Some(elapsed.min(max_step.max(self.interval)))
    }
}

/// Session time: start instant, penalties, and the subsystem cadences.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    started_at: DateTime<Utc>,
    penalty_seconds: u64,
    max_step_seconds: f64,
    motion: Cadence,
    survival: Cadence,
}

impl SimulationClock {
    /// Build the clock from session settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for non-positive rates or step cap.
    pub fn new(config: &SessionConfig, started_at: DateTime<Utc>) -> Result<Self, ClockError> {
        if !config.max_step_seconds.is_finite() || config.max_step_seconds <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "max_step_seconds must be > 0 (got {})",
                    config.max_step_seconds
                ),
            });
        }
        Ok(Self {
            started_at,
            penalty_seconds: 0,
            max_step_seconds: config.max_step_seconds,
            motion: Cadence::from_hz(config.motion_hz)?,
            survival: Cadence::from_hz(config.survival_hz)?,
        })
    }

    /// When the session started.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Penalty seconds accumulated so far.
    pub const fn penalty_seconds(&self) -> u64 {
        self.penalty_seconds
    }

    /// Add a time penalty to the elapsed-time score.
    pub const fn add_penalty(&mut self, seconds: u64) {
        self.penalty_seconds = self.penalty_seconds.saturating_add(seconds);
    }

    /// Wall-clock seconds since start plus penalties. Never negative.
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let wall = seconds_between(self.started_at, now).max(0.0);
        wall + self.penalty_seconds as f64
    }

    /// Period of the motion cadence, for driving a timer.
    pub fn motion_period(&self) -> TimeDelta {
        seconds_to_delta(self.motion.interval())
    }

    /// Poll the motion cadence.
    pub fn poll_motion(&mut self, now: DateTime<Utc>) -> Option<f64> {
        self.motion.poll(now, self.max_step_seconds)
    }

    /// Poll the survival cadence.
    pub fn poll_survival(&mut self, now: DateTime<Utc>) -> Option<f64> {
        self.survival.poll(now, self.max_step_seconds)
    }
}
