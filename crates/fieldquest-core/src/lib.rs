//! Simulation clock, checkpoint detection, audio mixing, and the session
//! loop for the FieldQuest adventure engine.
//!
//! A [`Simulation`] owns the player, the NPCs, and every controller. It is
//! advanced by position samples and by ticks; [`run_session`] wires both to
//! a timer and a position stream.
//!
//! # Modules
//!
//! - [`audio`] -- Three-channel proximity mixer over an [`AudioEngine`].
//! - [`checkpoint`] -- Checkpoint entry detection and interaction gating.
//! - [`clock`] -- Per-subsystem cadences and the elapsed-time score.
//! - [`config`] -- Configuration loading from `fieldquest-config.yaml`.
//! - [`control`] -- Shared control state for a running session.
//! - [`position`] -- Position updates, location errors, sample reports.
//! - [`runner`] -- The async session loop.
//! - [`tick`] -- The [`Simulation`] itself.
//!
//! [`AudioEngine`]: audio::AudioEngine

pub mod audio;
pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod control;
pub mod position;
pub mod runner;
pub mod tick;

pub use audio::{AudioEngine, AudioEngineState, AudioError, AudioMixer, NullAudioEngine};
pub use checkpoint::{CheckIn, CheckpointDetector, Completion};
pub use clock::{ManualTimeSource, SimulationClock, SystemTimeSource, TimeSource};
pub use config::{ConfigError, SimulationConfig};
pub use control::{InteractionSubmission, SessionControl};
pub use position::{LocationError, PositionReport, PositionUpdate, SampleDisposition};
pub use runner::{
    NoOpCallback, RunnerError, SessionCallback, SessionEndReason, SessionResult, log_session_end,
    run_session,
};
pub use tick::{Simulation, SimulationError, TickSummary};
