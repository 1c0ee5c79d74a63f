//! Shared session control state.
//!
//! The session loop owns the [`Simulation`](crate::tick::Simulation)
//! exclusively. Everything else (UI handlers, the signal handler, the
//! quiz screen) talks to it through a [`SessionControl`] wrapped in
//! [`Arc`](std::sync::Arc). Requests are picked up at the next tick.
//!
//! Flags are atomics so the loop reads them without locking; the
//! interaction queue sits behind a tokio [`Mutex`].

use std::sync::atomic::{AtomicBool, Ordering};

use fieldquest_types::{CheckpointId, InteractionOutcome};
use tokio::sync::{Mutex, Notify};

/// A quiz or challenge result waiting to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionSubmission {
    /// The checkpoint the result belongs to.
    pub checkpoint_id: CheckpointId,
    /// Whether the player answered correctly.
    pub outcome: InteractionOutcome,
}

/// Shared control handle for one running session.
#[derive(Debug)]
pub struct SessionControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the session loop when a stop is requested.
    stop_notify: Notify,

    /// Desired audio output state.
    audio_enabled: AtomicBool,

    /// Set when `audio_enabled` changed since the loop last looked.
    audio_changed: AtomicBool,

    /// Set when the UI asked to retry a suspended audio engine.
    audio_resume_requested: AtomicBool,

    /// Interaction results awaiting the next tick.
    interactions: Mutex<Vec<InteractionSubmission>>,
}

impl SessionControl {
    /// Create control state. `audio_enabled` is the initial toggle value.
    pub fn new(audio_enabled: bool) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            audio_enabled: AtomicBool::new(audio_enabled),
            audio_changed: AtomicBool::new(false),
            audio_resume_requested: AtomicBool::new(false),
            interactions: Mutex::new(Vec::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean session stop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested. Returns immediately if it already was.
    pub async fn stopped(&self) {
        loop {
            let notified = self.stop_notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    // -----------------------------------------------------------------------
    // Audio
    // -----------------------------------------------------------------------

    /// Flip the audio toggle.
    pub fn set_audio_enabled(&self, enabled: bool) {
        let previous = self.audio_enabled.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            self.audio_changed.store(true, Ordering::Release);
        }
    }

    /// Current audio toggle value.
    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled.load(Ordering::Acquire)
    }

    /// The new toggle value, if it changed since the last call.
    pub fn take_audio_change(&self) -> Option<bool> {
        self.audio_changed
            .swap(false, Ordering::AcqRel)
            .then(|| self.audio_enabled())
    }

    /// Ask the loop to retry a suspended audio engine. Call this from a
    /// user gesture handler.
    pub fn request_audio_resume(&self) {
        self.audio_resume_requested.store(true, Ordering::Release);
    }

    /// Whether a resume was requested since the last call.
    pub fn take_audio_resume(&self) -> bool {
        self.audio_resume_requested.swap(false, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Interactions
    // -----------------------------------------------------------------------

    /// Queue a quiz or challenge result for the next tick.
    pub async fn submit_interaction(&self, checkpoint_id: CheckpointId, outcome: InteractionOutcome) {
        let mut queue = self.interactions.lock().await;
        queue.push(InteractionSubmission {
            checkpoint_id,
            outcome,
        });
    }

    /// Drain all queued interaction results, oldest first.
    pub async fn drain_interactions(&self) -> Vec<InteractionSubmission> {
        let mut queue = self.interactions.lock().await;
        std::mem::take(&mut *queue)
    }
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new(true)
    }
}
