//! Recorded GPS tracks and their replay.
//!
//! A track is a JSON-lines file. Each line is either a fix
//! (`{"lat": .., "lng": .., "accuracy_m": .., "timestamp": ..}`) or a
//! sensor failure (`{"error": "timeout", "timestamp": ..}`). Blank lines
//! and lines starting with `#` are skipped.
//!
//! [`spawn_replay`] feeds the records into a channel at the recorded pace,
//! scaled by a speed factor, and re-stamps every fix with the wall clock
//! at the moment it is emitted so the session sees a live feed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use fieldquest_core::{LocationError, PositionUpdate};
use fieldquest_types::PositionSample;
use futures::SinkExt;
use futures::channel::mpsc;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::EngineError;

/// Capacity of the replay channel.
const REPLAY_BUFFER: usize = 64;

/// Sensor failure as written in a track file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TrackFault {
    PermissionDenied,
    Unavailable,
    Timeout,
}

impl From<TrackFault> for LocationError {
    fn from(fault: TrackFault) -> Self {
        match fault {
            TrackFault::PermissionDenied => Self::PermissionDenied,
            TrackFault::Unavailable => Self::Unavailable,
            TrackFault::Timeout => Self::Timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TrackLine {
    Fault {
        error: TrackFault,
        timestamp: DateTime<Utc>,
    },
    Fix(PositionSample),
}

/// One line of a track with its recorded time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    /// When the update was recorded.
    pub recorded_at: DateTime<Utc>,
    /// The update itself.
    pub update: PositionUpdate,
}

/// Parse a JSON-lines track. Records keep file order.
///
/// # Errors
///
/// Returns [`EngineError::Track`] naming the first line that does not parse.
pub fn parse_track(text: &str) -> Result<Vec<TrackRecord>, EngineError> {
    let mut records = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed: TrackLine = serde_json::from_str(line).map_err(|e| EngineError::Track {
            line: index.saturating_add(1),
            message: e.to_string(),
        })?;
        records.push(match parsed {
            TrackLine::Fault { error, timestamp } => TrackRecord {
                recorded_at: timestamp,
                update: PositionUpdate::Error(error.into()),
            },
            TrackLine::Fix(sample) => TrackRecord {
                recorded_at: sample.timestamp,
                update: PositionUpdate::Sample(sample),
            },
        });
    }
    Ok(records)
}

/// Pause between two records at the given replay speed.
fn replay_delay(previous: DateTime<Utc>, next: DateTime<Utc>, speed: f64) -> Duration {
    let recorded = next
        .signed_duration_since(previous)
        .to_std()
        .unwrap_or(Duration::ZERO);
    Duration::try_from_secs_f64(recorded.as_secs_f64() / speed).unwrap_or(Duration::ZERO)
}

/// Spawn a task that feeds `records` into a channel at recorded pace.
///
/// The receiver closes after the last record, which ends the session.
pub fn spawn_replay(
    records: Vec<TrackRecord>,
    speed: f64,
) -> (mpsc::Receiver<PositionUpdate>, JoinHandle<()>) {
    let (mut sender, receiver) = mpsc::channel(REPLAY_BUFFER);
    let handle = tokio::spawn(async move {
        let total = records.len();
        let mut previous: Option<DateTime<Utc>> = None;
        for record in records {
            if let Some(prev) = previous {
                tokio::time::sleep(replay_delay(prev, record.recorded_at, speed)).await;
            }
            previous = Some(record.recorded_at);

            let update = match record.update {
                PositionUpdate::Sample(sample) => PositionUpdate::Sample(PositionSample {
                    timestamp: Utc::now(),
                    ..sample
                }),
                fault @ PositionUpdate::Error(_) => fault,
            };
            if sender.send(update).await.is_err() {
                debug!("Session stopped listening, replay abandoned");
                return;
            }
        }
        info!(records = total, "Track replay finished");
    });
    (receiver, handle)
}
