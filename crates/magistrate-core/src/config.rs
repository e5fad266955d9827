//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `magistrate-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure and a loader that reads and validates the file.

use std::path::Path;

use serde::Deserialize;

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
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `magistrate-config.yaml`. All fields have
/// defaults so a missing or partial file still yields a runnable world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MagistrateConfig {
    /// World-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Time settings.
    #[serde(default)]
    pub time: TimeConfig,

    /// Justice timing parameters.
    #[serde(default)]
    pub justice: JusticeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MagistrateConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// World-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Display name of the world.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for deterministic randomness. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Real milliseconds between ticks when the engine drives the clock.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: None,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

fn default_world_name() -> String {
    String::from("magistrate")
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

/// Time settings. One tick is one second of world time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Number of ticks in one full tick-day.
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            ticks_per_day: default_ticks_per_day(),
        }
    }
}

const fn default_ticks_per_day() -> u64 {
    // A 2-hour real-time day at one tick per second.
    7_200
}

/// Justice timing parameters, applied per jurisdiction at setup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JusticeConfig {
    /// Window within which an identical offense folds into the existing
    /// crime instead of creating a new one.
    #[serde(default = "default_repeat_window")]
    pub repeat_suppression_window_ticks: u64,

    /// Ticks between an arrest and automatic conviction, giving bail and
    /// forgiveness a chance to intervene.
    #[serde(default = "default_post_arrest_delay")]
    pub post_arrest_delay_ticks: u64,

    /// Ticks a convicted offender has to pay a fine before it is overdue.
    #[serde(default = "default_fine_due")]
    pub fine_due_ticks: u64,
}

impl Default for JusticeConfig {
    fn default() -> Self {
        Self {
            repeat_suppression_window_ticks: default_repeat_window(),
            post_arrest_delay_ticks: default_post_arrest_delay(),
            fine_due_ticks: default_fine_due(),
        }
    }
}

const fn default_repeat_window() -> u64 {
    // Ten minutes of world time.
    600
}

const fn default_post_arrest_delay() -> u64 {
    300
}

const fn default_fine_due() -> u64 {
    // One tick-day.
    7_200
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-structured logs instead of human-readable ones.
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

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = MagistrateConfig::parse("{}").unwrap();
        assert_eq!(config.world.name, "magistrate");
        assert_eq!(config.world.tick_interval_ms, 1_000);
        assert_eq!(config.time.ticks_per_day, 7_200);
        assert_eq!(config.justice.repeat_suppression_window_ticks, 600);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let yaml = r"
world:
  name: test-shard
  seed: 42
justice:
  repeat_suppression_window_ticks: 120
";
        let config = MagistrateConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "test-shard");
        assert_eq!(config.world.seed, Some(42));
        assert_eq!(config.justice.repeat_suppression_window_ticks, 120);
        // Untouched sections keep defaults.
        assert_eq!(config.justice.post_arrest_delay_ticks, 300);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(matches!(
            MagistrateConfig::parse("world: ["),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
