//! Configuration management for the ambient engine.
//!
//! Loads configuration from TOML files and provides runtime defaults.

use crate::engine::EngineConfig;
use crate::scoring::BrightnessFalloff;
use crate::types::{ConfigError, EngineKind, ExtractionMode, MonitorIndex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub continuous: ContinuousConfig,

    #[serde(default)]
    pub discrete: DiscreteConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether the engine starts at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Which engine to run
    #[serde(default)]
    pub engine: EngineKind,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: default_log_level(),
            engine: EngineKind::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Monitor to sample (0 = primary)
    #[serde(default)]
    pub monitor_index: MonitorIndex,

    /// Percentage trimmed from each edge before analysis (0-40)
    #[serde(default = "default_crop_percent")]
    pub crop_percent: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            monitor_index: 0,
            crop_percent: default_crop_percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousConfig {
    /// EMA smoothing factor (0.05-0.6)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Representative color strategy
    #[serde(default)]
    pub mode: ExtractionMode,

    /// Ticks per second (1-60)
    #[serde(default = "default_fps_limit")]
    pub fps_limit: u32,

    /// Minimum normalized RGB distance to resend
    #[serde(default = "default_continuous_threshold")]
    pub change_threshold: f64,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            mode: ExtractionMode::default(),
            fps_limit: default_fps_limit(),
            change_threshold: default_continuous_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteConfig {
    /// Seconds between decisions (0.5-5)
    #[serde(default = "default_update_interval")]
    pub update_interval_seconds: f64,

    /// Minimum normalized RGB distance to resend
    #[serde(default = "default_discrete_threshold")]
    pub change_threshold: f64,

    /// Minimum seconds between dispatches, 0 disables (0-5)
    #[serde(default)]
    pub rate_limit_seconds: f64,

    /// Colorful candidates scored per decision
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,
}

impl Default for DiscreteConfig {
    fn default() -> Self {
        Self {
            update_interval_seconds: default_update_interval(),
            change_threshold: default_discrete_threshold(),
            rate_limit_seconds: 0.0,
            candidate_count: default_candidate_count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Edge-band brightness scoring (hard, smooth)
    #[serde(default)]
    pub brightness_falloff: BrightnessFalloff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Reports kept in memory
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Where to write the history on shutdown (.json or .csv)
    #[serde(default)]
    pub export_path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            export_path: None,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_crop_percent() -> f32 {
    crate::engine::DEFAULT_CROP_PERCENT
}

fn default_alpha() -> f64 {
    crate::smoothing::DEFAULT_ALPHA
}

fn default_fps_limit() -> u32 {
    crate::engine::DEFAULT_FPS_LIMIT
}

fn default_continuous_threshold() -> f64 {
    crate::change_detector::CONTINUOUS_THRESHOLD
}

fn default_update_interval() -> f64 {
    1.0
}

fn default_discrete_threshold() -> f64 {
    crate::change_detector::DISCRETE_THRESHOLD
}

fn default_candidate_count() -> usize {
    crate::engine::DEFAULT_CANDIDATE_COUNT
}

fn default_max_entries() -> usize {
    crate::history::DEFAULT_MAX_ENTRIES
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path, falling back to defaults
    pub fn load_from_path(path: PathBuf) -> Self {
        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::try_load_from_path(&path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific path, reporting failures
    pub fn try_load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ambient-engine")
            .join("config.toml")
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(Self::default_config_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Runtime engine settings, clamped to their valid ranges
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            crop_percent: self.capture.crop_percent,
            alpha: self.continuous.alpha,
            mode: self.continuous.mode,
            fps_limit: self.continuous.fps_limit,
            monitor_index: self.capture.monitor_index,
            continuous_change_threshold: self.continuous.change_threshold,
            discrete_change_threshold: self.discrete.change_threshold,
            update_interval: seconds(self.discrete.update_interval_seconds),
            rate_limit: seconds(self.discrete.rate_limit_seconds),
            candidate_count: self.discrete.candidate_count,
            brightness_falloff: self.scoring.brightness_falloff,
        }
        .clamped()
    }
}

/// Non-finite or negative seconds become zero
fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value.min(3600.0))
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.general.enabled);
        assert_eq!(config.general.engine, EngineKind::Continuous);
        assert_eq!(config.capture.crop_percent, 15.0);
        assert_eq!(config.continuous.fps_limit, 12);
        assert_eq!(config.continuous.change_threshold, 0.03);
        assert_eq!(config.discrete.change_threshold, 0.1);
        assert_eq!(config.history.max_entries, 1000);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[general]
log_level = "debug"
engine = "discrete"

[capture]
monitor_index = 1
crop_percent = 25.0

[continuous]
mode = "average"

[discrete]
update_interval_seconds = 2.5
rate_limit_seconds = 1.0

[scoring]
brightness_falloff = "smooth"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(config.general.enabled);
        assert_eq!(config.general.engine, EngineKind::Discrete);
        assert_eq!(config.capture.monitor_index, 1);
        assert_eq!(config.continuous.mode, ExtractionMode::Average);
        assert_eq!(config.continuous.alpha, 0.2);
        assert_eq!(config.discrete.update_interval_seconds, 2.5);
        assert_eq!(config.scoring.brightness_falloff, BrightnessFalloff::Smooth);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ambient").join("config.toml");

        let mut config = Config::default();
        config.general.engine = EngineKind::Discrete;
        config.continuous.alpha = 0.4;
        config.history.export_path = Some(PathBuf::from("/tmp/history.json"));
        config.save_to_path(path.clone()).unwrap();

        let loaded = Config::load_from_path(path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[capture\ncrop_percent = ").unwrap();

        assert!(matches!(Config::try_load_from_path(&path), Err(ConfigError::Parse(_))));
        assert_eq!(Config::load_from_path(path), Config::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_from_path(PathBuf::from("/nonexistent/ambient/config.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_engine_config_clamps() {
        let mut config = Config::default();
        config.capture.crop_percent = 80.0;
        config.continuous.alpha = 2.0;
        config.continuous.fps_limit = 0;
        config.discrete.update_interval_seconds = 30.0;
        config.discrete.rate_limit_seconds = -3.0;

        let engine = config.engine_config();
        assert_eq!(engine.crop_percent, 40.0);
        assert_eq!(engine.alpha, 0.6);
        assert_eq!(engine.fps_limit, 1);
        assert_eq!(engine.update_interval, Duration::from_secs(5));
        assert_eq!(engine.rate_limit, Duration::ZERO);
    }
}
