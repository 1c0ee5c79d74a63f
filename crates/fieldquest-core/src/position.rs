//! Inputs from the location sensor and what the simulation made of them.

use fieldquest_types::{ChannelGains, GameEvent, PositionSample, ScoreDelta};

/// Why the location sensor could not deliver a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The participant denied location access.
    #[error("location permission denied")]
    PermissionDenied,
    /// The device has no fix (indoors, no GPS).
    #[error("location unavailable")]
    Unavailable,
    /// The sensor did not answer in time.
    #[error("location request timed out")]
    Timeout,
}

/// One item from the push-based location stream.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionUpdate {
    /// A new fix.
    Sample(PositionSample),
    /// The sensor reported a failure.
    Error(LocationError),
}

impl From<PositionSample> for PositionUpdate {
    fn from(sample: PositionSample) -> Self {
        Self::Sample(sample)
    }
}

impl From<LocationError> for PositionUpdate {
    fn from(err: LocationError) -> Self {
        Self::Error(err)
    }
}

/// What happened to a submitted sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDisposition {
    /// The sample updated the player.
    Applied,
    /// Not newer than the last applied sample; ignored.
    Stale,
    /// Non-finite or out-of-range coordinates; ignored.
    Invalid,
}

/// Result of [`Simulation::apply_position`](crate::tick::Simulation::apply_position).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    /// Whether the sample was used.
    pub disposition: SampleDisposition,
    /// Events raised by this sample (check-ins, location restored).
    pub events: Vec<GameEvent>,
    /// Points banked by this sample.
    pub score_deltas: Vec<ScoreDelta>,
    /// Audio gains after mixing.
    pub gains: ChannelGains,
}

impl PositionReport {
    /// A report for a sample that was not used.
    pub const fn ignored(disposition: SampleDisposition, gains: ChannelGains) -> Self {
        Self {
            disposition,
            events: Vec::new(),
            score_deltas: Vec::new(),
            gains,
        }
    }

    /// Whether the sample updated the player.
    pub fn is_applied(&self) -> bool {
        self.disposition == SampleDisposition::Applied
    }
}
