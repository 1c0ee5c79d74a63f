//! Error types for the replay binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the session run.

use fieldquest_core::{ConfigError, RunnerError, SimulationError};

/// Top-level error for the replay binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The simulation could not be built.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimulationError,
    },

    /// The session runner failed to start.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: RunnerError,
    },

    /// An input file (event or track) could not be loaded.
    #[error("input error: {source:#}")]
    Input {
        /// The underlying error, with file context.
        source: anyhow::Error,
    },

    /// A track line could not be parsed.
    #[error("track line {line}: {message}")]
    Track {
        /// One-based line number.
        line: usize,
        /// Description of the parse failure.
        message: String,
    },

    /// An environment setting is out of range.
    #[error("invalid setting {name}: {reason}")]
    Setting {
        /// The environment variable.
        name: &'static str,
        /// Explanation of what is wrong.
        reason: String,
    },
}
