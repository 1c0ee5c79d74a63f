//! Whiteout weather cycle.
//!
//! A whiteout is a purely visual hazard: it never touches the survival
//! math, it only flips a flag the map layer uses to fog the view. The
//! cycle alternates between a calm spell and a whiteout, each with a
//! randomised length.
//!
//! # Scheduling
//!
//! There are no timers. The cycle stores the absolute time of its next
//! flip and [`WhiteoutCycle::poll`] compares it to the `now` supplied by
//! the caller, so a fake clock drives it in tests exactly like the real
//! one does in a session. The RNG is seeded for reproducible runs.

use chrono::{DateTime, Utc};
use fieldquest_types::WhiteoutState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

use crate::error::WorldError;
use crate::timing::deadline_after;

/// Whiteout timing parameters, in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherConfig {
    /// Whether the whiteout cycle runs at all.
    #[serde(default)]
    pub enabled: bool,

    /// Shortest calm spell between whiteouts.
    #[serde(default = "default_calm_min_seconds")]
    pub calm_min_seconds: f64,

    /// Longest calm spell between whiteouts.
    #[serde(default = "default_calm_max_seconds")]
    pub calm_max_seconds: f64,

    /// Shortest whiteout.
    #[serde(default = "default_whiteout_min_seconds")]
    pub whiteout_min_seconds: f64,

    /// Longest whiteout.
    #[serde(default = "default_whiteout_max_seconds")]
    pub whiteout_max_seconds: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            calm_min_seconds: default_calm_min_seconds(),
            calm_max_seconds: default_calm_max_seconds(),
            whiteout_min_seconds: default_whiteout_min_seconds(),
            whiteout_max_seconds: default_whiteout_max_seconds(),
        }
    }
}

impl WeatherConfig {
    /// Check that every interval is positive and ordered.
    pub fn validate(&self) -> Result<(), WorldError> {
        check_range("calm", self.calm_min_seconds, self.calm_max_seconds)?;
        check_range(
            "whiteout",
            self.whiteout_min_seconds,
            self.whiteout_max_seconds,
        )
    }
}

fn check_range(label: &str, min: f64, max: f64) -> Result<(), WorldError> {
    if !(min.is_finite() && max.is_finite()) || min <= 0.0 || max < min {
        return Err(WorldError::InvalidConfig {
            reason: format!("{label} interval must satisfy 0 < min <= max (got {min}..{max})"),
        });
    }
    Ok(())
}

const fn default_calm_min_seconds() -> f64 {
    90.0
}

const fn default_calm_max_seconds() -> f64 {
    240.0
}

const fn default_whiteout_min_seconds() -> f64 {
    15.0
}

const fn default_whiteout_max_seconds() -> f64 {
    40.0
}

/// A flip of the whiteout flag reported by [`WhiteoutCycle::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteoutChange {
    /// A whiteout began and will end at `ends_at`.
    Started {
        /// Scheduled end of the whiteout.
        ends_at: DateTime<Utc>,
    },
    /// The whiteout lifted.
    Ended,
}

/// Deadline-driven whiteout cycle.
#[derive(Debug, Clone)]
pub struct WhiteoutCycle {
    /// Timing parameters.
    config: WeatherConfig,
    /// Seeded RNG for interval lengths.
    rng: StdRng,
    /// Current flag and timestamps.
    state: WhiteoutState,
    /// Absolute time of the next flip. `None` until the first poll.
    next_change_at: Option<DateTime<Utc>>,
}

impl WhiteoutCycle {
    /// Create a cycle. Nothing is scheduled until the first [`poll`](Self::poll).
    pub fn new(config: WeatherConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            state: WhiteoutState::default(),
            next_change_at: None,
        }
    }

    /// Advance the cycle to `now`.
    ///
    /// The first call schedules the initial calm spell. Afterwards at most
    /// one flip happens per call, so a long gap (backgrounded device)
    /// never produces a burst of events.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<WhiteoutChange> {
        if !self.config.enabled {
            return None;
        }

        let Some(due) = self.next_change_at else {
            let calm = self.draw(self.config.calm_min_seconds, self.config.calm_max_seconds);
            self.next_change_at = Some(deadline_after(now, calm));
            return None;
        };

        if now < due {
            return None;
        }

        if self.state.active {
            let calm = self.draw(self.config.calm_min_seconds, self.config.calm_max_seconds);
            self.state = WhiteoutState {
                active: false,
                started_at: None,
                ends_at: None,
            };
            self.next_change_at = Some(deadline_after(now, calm));
            debug!(calm_seconds = calm, "whiteout lifted");
            Some(WhiteoutChange::Ended)
        } else {
            let length = self.draw(
                self.config.whiteout_min_seconds,
                self.config.whiteout_max_seconds,
            );
            let ends_at = deadline_after(now, length);
            self.state = WhiteoutState {
                active: true,
                started_at: Some(now),
                ends_at: Some(ends_at),
            };
            self.next_change_at = Some(ends_at);
            debug!(whiteout_seconds = length, "whiteout started");
            Some(WhiteoutChange::Started { ends_at })
        }
    }

    /// Current weather flag and timestamps.
    pub const fn state(&self) -> WhiteoutState {
        self.state
    }

    /// Whether a whiteout is in progress.
    pub const fn is_active(&self) -> bool {
        self.state.active
    }

    /// When the next flip is due, if scheduled.
    pub const fn next_change_at(&self) -> Option<DateTime<Utc>> {
        self.next_change_at
    }

    fn draw(&mut self, min: f64, max: f64) -> f64 {
        if max > min {
            self.rng.random_range(min..=max)
        } else {
            min
        }
    }
}
