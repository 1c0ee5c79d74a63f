//! Replay binary for the FieldQuest adventure engine.
//!
//! Wires a recorded GPS track into a live session: loads configuration,
//! the event description, and the track, then runs the session loop
//! until the track ends, every mandatory checkpoint is visited, or the
//! process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `fieldquest-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the event (`FIELDQUEST_EVENT`) and track (`FIELDQUEST_TRACK`)
//! 4. Build the simulation with a headless audio engine
//! 5. Start the track replay and the Ctrl-C handler
//! 6. Run the session loop
//! 7. Log the result

mod error;
mod log_callback;
mod track;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use fieldquest_core::{
    NullAudioEngine, SessionControl, Simulation, SimulationConfig, SystemTimeSource,
    log_session_end, run_session,
};
use fieldquest_types::EventSetup;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_callback::LogCallback;

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "FIELDQUEST_CONFIG";
/// Environment variable naming the event description (JSON).
const EVENT_ENV: &str = "FIELDQUEST_EVENT";
/// Environment variable naming the GPS track (JSON lines).
const TRACK_ENV: &str = "FIELDQUEST_TRACK";
/// Environment variable scaling the replay pace.
const SPEED_ENV: &str = "FIELDQUEST_REPLAY_SPEED";

/// Application entry point for the replay binary.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging depends on it, so report afterwards.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!("fieldquest-engine starting");
    match config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        motion_hz = config.session.motion_hz,
        survival_hz = config.session.survival_hz,
        seed = config.session.seed,
        audio = config.audio.enabled,
        whiteout = config.weather.enabled,
        "Session settings"
    );

    // 3. Load inputs.
    let event_path = env_path(EVENT_ENV, "event.json");
    let setup = load_event(&event_path).map_err(|source| EngineError::Input { source })?;
    info!(
        path = %event_path.display(),
        checkpoints = setup.checkpoints.len(),
        has_start = setup.start.is_some(),
        "Event loaded"
    );

    let track_path = env_path(TRACK_ENV, "track.jsonl");
    let text = std::fs::read_to_string(&track_path)
        .with_context(|| format!("reading track {}", track_path.display()))
        .map_err(|source| EngineError::Input { source })?;
    let records = track::parse_track(&text)?;
    let speed = replay_speed()?;
    info!(
        path = %track_path.display(),
        records = records.len(),
        speed,
        "Track loaded"
    );

    // 4. Build the simulation.
    let mut sim = Simulation::new(
        &config,
        setup,
        Utc::now(),
        Box::new(NullAudioEngine::new()),
    )?;

    // 5. Start the replay and the stop handler.
    let control = Arc::new(SessionControl::new(config.audio.enabled));
    let (positions, replay) = track::spawn_replay(records, speed);
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping session");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run the session.
    let mut callback = LogCallback::new();
    let result = run_session(
        &mut sim,
        positions,
        &control,
        &mut callback,
        &SystemTimeSource,
    )
    .await?;
    replay.abort();

    // 7. Log results.
    log_session_end(&result);
    info!(
        end_reason = ?result.end_reason,
        banked_score = sim.player().banked_score,
        mandatory_remaining = sim.mandatory_remaining(),
        events = callback.events(),
        ignored_samples = callback.ignored_samples(),
        "fieldquest-engine shutdown complete"
    );

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &SimulationConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the session configuration.
///
/// Looks for `FIELDQUEST_CONFIG`, defaulting to `fieldquest-config.yaml`
/// in the current working directory. Returns the path actually read.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let config_path = env_path(CONFIG_ENV, "fieldquest-config.yaml");
    if config_path.exists() {
        let config = SimulationConfig::from_file(&config_path)?;
        Ok((config, Some(config_path)))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok((config, None))
    }
}

/// Load the event description.
fn load_event(path: &Path) -> anyhow::Result<EventSetup> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading event {}", path.display()))?;
    let setup = serde_json::from_str(&text)
        .with_context(|| format!("parsing event {}", path.display()))?;
    Ok(setup)
}

/// Read the replay speed factor. Defaults to real time.
fn replay_speed() -> Result<f64, EngineError> {
    parse_speed(std::env::var(SPEED_ENV).ok().as_deref())
}

fn parse_speed(raw: Option<&str>) -> Result<f64, EngineError> {
    let Some(raw) = raw else {
        return Ok(1.0);
    };
    let speed: f64 = raw.trim().parse().map_err(|e| EngineError::Setting {
        name: SPEED_ENV,
        reason: format!("{e}"),
    })?;
    if !speed.is_finite() || speed <= 0.0 {
        return Err(EngineError::Setting {
            name: SPEED_ENV,
            reason: format!("must be > 0 (got {speed})"),
        });
    }
    Ok(speed)
}

fn env_path(name: &str, default: &str) -> PathBuf {
    std::env::var_os(name).map_or_else(|| PathBuf::from(default), PathBuf::from)
}
