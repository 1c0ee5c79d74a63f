//! Session callback that reports everything through `tracing`.
//!
//! Discrete events are logged at `info`, every tick summary is emitted as
//! JSON at `debug` so a log pipeline can rebuild the map view.

use fieldquest_core::{PositionReport, SampleDisposition, SessionCallback, TickSummary};
use fieldquest_types::GameEvent;
use tracing::{debug, info, warn};

/// Callback that logs events and keeps running totals.
#[derive(Debug, Default)]
pub struct LogCallback {
    events: u64,
    ignored_samples: u64,
}

impl LogCallback {
    /// Create a callback with zeroed totals.
    pub const fn new() -> Self {
        Self {
            events: 0,
            ignored_samples: 0,
        }
    }

    /// Events logged so far.
    pub const fn events(&self) -> u64 {
        self.events
    }

    /// Samples the simulation ignored as stale or invalid.
    pub const fn ignored_samples(&self) -> u64 {
        self.ignored_samples
    }

    fn log_events(&mut self, events: &[GameEvent]) {
        for event in events {
            self.events = self.events.saturating_add(1);
            match serde_json::to_string(event) {
                Ok(json) => info!(event = %json, "Game event"),
                Err(e) => warn!(error = %e, ?event, "failed to serialize game event"),
            }
        }
    }
}

impl SessionCallback for LogCallback {
    fn on_tick(&mut self, summary: &TickSummary) {
        self.log_events(&summary.events);
        for delta in &summary.score_deltas {
            info!(
                checkpoint = %delta.checkpoint_id,
                points = delta.points_earned,
                "Points banked"
            );
        }
        match serde_json::to_string(summary) {
            Ok(json) => debug!(tick = summary.tick, summary = %json, "Tick"),
            Err(e) => warn!(tick = summary.tick, error = %e, "failed to serialize tick summary"),
        }
    }

    fn on_position(&mut self, report: &PositionReport) {
        if report.disposition != SampleDisposition::Applied {
            self.ignored_samples = self.ignored_samples.saturating_add(1);
            debug!(disposition = ?report.disposition, "Position sample ignored");
        }
        self.log_events(&report.events);
        for delta in &report.score_deltas {
            info!(
                checkpoint = %delta.checkpoint_id,
                points = delta.points_earned,
                "Points banked"
            );
        }
    }
}
