//! Configuration loading and typed config structures for a FieldQuest session.
//!
//! The canonical configuration lives in `fieldquest-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure and provides a loader that reads and validates the file.
//! Every section and field is optional; missing values take the defaults
//! documented on each field.

use std::path::Path;

use fieldquest_entities::{EntityError, MotionConfig, SurvivalConfig};
use fieldquest_world::{WeatherConfig, WorldError};
use serde::Deserialize;

/// Environment variable overriding `session.seed`.
pub const SEED_ENV: &str = "FIELDQUEST_SEED";

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "FIELDQUEST_LOG_LEVEL";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl From<EntityError> for ConfigError {
    fn from(err: EntityError) -> Self {
        Self::Invalid {
            reason: err.to_string(),
        }
    }
}

impl From<WorldError> for ConfigError {
    fn from(err: WorldError) -> Self {
        Self::Invalid {
            reason: err.to_string(),
        }
    }
}

/// Top-level session configuration.
///
/// Mirrors the structure of `fieldquest-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Tick rates, step cap, and RNG seed.
    #[serde(default)]
    pub session: SessionConfig,

    /// NPC motion parameters.
    #[serde(default)]
    pub motion: MotionConfig,

    /// Survival resource parameters.
    #[serde(default)]
    pub survival: SurvivalConfig,

    /// Whiteout cycle parameters.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Proximity audio parameters.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `FIELDQUEST_SEED` overrides `session.seed`
    /// - `FIELDQUEST_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides looked up through `lookup`. Unparseable seeds are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup(SEED_ENV).and_then(|raw| raw.trim().parse().ok()) {
            self.session.seed = seed;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.logging.level = level;
        }
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        self.motion.validate()?;
        self.survival.validate()?;
        self.weather.validate()?;
        self.audio.validate()?;
        Ok(())
    }
}

/// Tick rates and reproducibility settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    /// Motion ticks per second (default: 5).
    #[serde(default = "default_motion_hz")]
    pub motion_hz: f64,

    /// Survival ticks per second (default: 1).
    #[serde(default = "default_survival_hz")]
    pub survival_hz: f64,

    /// Largest time step any controller integrates (default: 1.0).
    #[serde(default = "default_max_step_seconds")]
    pub max_step_seconds: f64,

    /// Seed for weather and item-loss randomness (default: 42).
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            motion_hz: default_motion_hz(),
            survival_hz: default_survival_hz(),
            max_step_seconds: default_max_step_seconds(),
            seed: default_seed(),
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("motion_hz", self.motion_hz),
            ("survival_hz", self.survival_hz),
            ("max_step_seconds", self.max_step_seconds),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    reason: format!("session.{name} must be > 0 (got {value})"),
                });
            }
        }
        Ok(())
    }
}

/// Distance bands and smoothing for the proximity audio mix.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioConfig {
    /// Whether audio starts enabled (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Outer edge of the danger band in meters (default: 40).
    #[serde(default = "default_danger_radius_m")]
    pub danger_radius_m: f64,

    /// Outer edge of the tension band in meters (default: 150).
    #[serde(default = "default_tension_radius_m")]
    pub tension_radius_m: f64,

    /// Smoothing time constant in seconds (default: 0.5).
    #[serde(default = "default_smoothing_tau_seconds")]
    pub smoothing_tau_seconds: f64,

    /// Checkpoint tags that mark a static threat.
    #[serde(default = "default_threat_tags")]
    pub threat_tags: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            danger_radius_m: default_danger_radius_m(),
            tension_radius_m: default_tension_radius_m(),
            smoothing_tau_seconds: default_smoothing_tau_seconds(),
            threat_tags: default_threat_tags(),
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.danger_radius_m.is_finite() || self.danger_radius_m <= 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!("audio.danger_radius_m must be > 0 (got {})", self.danger_radius_m),
            });
        }
        if !self.tension_radius_m.is_finite() || self.tension_radius_m <= self.danger_radius_m {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "audio.tension_radius_m ({}) must exceed danger_radius_m ({})",
                    self.tension_radius_m, self.danger_radius_m
                ),
            });
        }
        if !self.smoothing_tau_seconds.is_finite() || self.smoothing_tau_seconds < 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "audio.smoothing_tau_seconds must be >= 0 (got {})",
                    self.smoothing_tau_seconds
                ),
            });
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde's `default = "..."` attribute)
// ---------------------------------------------------------------------------

const fn default_motion_hz() -> f64 {
    5.0
}

const fn default_survival_hz() -> f64 {
    1.0
}

const fn default_max_step_seconds() -> f64 {
    1.0
}

const fn default_seed() -> u64 {
    42
}

const fn default_true() -> bool {
    true
}

const fn default_danger_radius_m() -> f64 {
    40.0
}

const fn default_tension_radius_m() -> f64 {
    150.0
}

const fn default_smoothing_tau_seconds() -> f64 {
    0.5
}

fn default_threat_tags() -> Vec<String> {
    vec!["threat".to_owned(), "danger".to_owned()]
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.seed, 42);
        assert!((config.session.motion_hz - 5.0).abs() < f64::EPSILON);
        assert!(config.audio.enabled);
        assert!(!config.weather.enabled);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
session:
  motion_hz: 10
  survival_hz: 2
  max_step_seconds: 0.5
  seed: 7

motion:
  detection_radius_m: 70
  catch_radius_m: 6
  lost_radius_m: 120
  npc_tags: ["creature", "animal"]

survival:
  decay_per_second: 2
  heat_tags: ["campfire"]
  item_loss_chance: 0.5

weather:
  enabled: true
  calm_min_seconds: 60
  calm_max_seconds: 120

audio:
  enabled: false
  danger_radius_m: 30
  tension_radius_m: 100
  threat_tags: ["wolf"]

logging:
  level: "debug"
  json: true
"#;
        let mut config: SimulationConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_overrides(|_| None);
        assert!(config.validate().is_ok());
        assert_eq!(config.session.seed, 7);
        assert!((config.motion.detection_radius_m - 70.0).abs() < f64::EPSILON);
        assert_eq!(config.motion.npc_tags.len(), 2);
        assert!((config.survival.item_loss_chance - 0.5).abs() < f64::EPSILON);
        assert!(config.weather.enabled);
        assert!(!config.audio.enabled);
        assert_eq!(config.audio.threat_tags, vec!["wolf".to_owned()]);
        assert!(config.logging.json);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config = SimulationConfig::parse("logging:\n  json: true\n").unwrap();
        assert!(config.logging.json);
        assert_eq!(config.audio, AudioConfig::default());
        assert!((config.session.max_step_seconds - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overrides_replace_seed_and_level() {
        let mut config = SimulationConfig::default();
        config.apply_overrides(|key| match key {
            SEED_ENV => Some(" 1234 ".to_owned()),
            LOG_LEVEL_ENV => Some("trace".to_owned()),
            _ => None,
        });
        assert_eq!(config.session.seed, 1234);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn garbage_seed_override_is_ignored() {
        let mut config = SimulationConfig::default();
        config.apply_overrides(|key| (key == SEED_ENV).then(|| "not-a-number".to_owned()));
        assert_eq!(config.session.seed, 42);
    }

    #[test]
    fn inverted_audio_bands_rejected() {
        let mut config = SimulationConfig::default();
        config.audio.tension_radius_m = 20.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn entity_errors_surface_as_invalid() {
        let mut config = SimulationConfig::default();
        config.motion.catch_radius_m = 100.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("fieldquest-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
            assert!(config.unwrap().validate().is_ok());
        }
    }
}
