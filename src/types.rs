//! Core types used throughout the ambient engine.
//!
//! This module defines the operating modes shared by the pipeline stages and
//! the error enums for each failure domain (capture, scoring, dispatch,
//! configuration).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of a monitor as seen by a [`crate::capture::FrameSource`] (0 = primary)
pub type MonitorIndex = usize;

/// Strategy used to derive the single representative color of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Masked arithmetic mean of the surviving pixels
    Average,
    /// Peak of the hue histogram, boosted for vividness
    #[default]
    Accent,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Average => "average",
            ExtractionMode::Accent => "accent",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(ExtractionMode::Average),
            "accent" => Ok(ExtractionMode::Accent),
            other => Err(format!("unknown extraction mode: {}", other)),
        }
    }
}

/// How an engine turns frames into dispatched colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Screen-sync: smoothed representative color every frame, gated by distance
    #[default]
    Continuous,
    /// Smart-ambient: a fresh scored decision every update interval
    Discrete,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Continuous => "continuous",
            EngineKind::Discrete => "discrete",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" | "screen-sync" => Ok(EngineKind::Continuous),
            "discrete" | "smart-ambient" => Ok(EngineKind::Discrete),
            other => Err(format!("unknown engine kind: {}", other)),
        }
    }
}

/// Operating mode requested from a light sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightMode {
    /// Tunable white output
    White,
    /// Full RGB output
    Colour,
}

impl LightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LightMode::White => "white",
            LightMode::Colour => "colour",
        }
    }
}

/// Errors raised while capturing a frame. All of them are retryable.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Monitor not found: {0}")]
    MonitorNotFound(MonitorIndex),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Display capture is not supported on this platform")]
    Unsupported,

    #[error("Capture failed: {0}")]
    Failed(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors raised while scoring a single candidate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),
}

/// Errors reported by a [`crate::dispatch::ColorSink`]
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Light unreachable: {0}")]
    Unreachable(String),

    #[error("Light rejected command: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// Whether resending the same command later can succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            SinkError::Unreachable(_) | SinkError::Io(_) => true,
            SinkError::Rejected(_) => false,
        }
    }
}

/// Errors raised while loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_mode_parse() {
        assert_eq!("average".parse::<ExtractionMode>(), Ok(ExtractionMode::Average));
        assert_eq!("Accent".parse::<ExtractionMode>(), Ok(ExtractionMode::Accent));
        assert!("vivid".parse::<ExtractionMode>().is_err());
    }

    #[test]
    fn test_engine_kind_as_str() {
        assert_eq!(EngineKind::Continuous.as_str(), "continuous");
        assert_eq!(EngineKind::Discrete.as_str(), "discrete");
        assert_eq!("smart-ambient".parse::<EngineKind>(), Ok(EngineKind::Discrete));
    }

    #[test]
    fn test_sink_error_retryable() {
        assert!(SinkError::Unreachable("timeout".into()).is_retryable());
        assert!(!SinkError::Rejected("bad dps".into()).is_retryable());
    }

    #[test]
    fn test_mode_serde_lowercase() {
        let json = serde_json::to_string(&ExtractionMode::Average).unwrap();
        assert_eq!(json, "\"average\"");
        let mode: LightMode = serde_json::from_str("\"colour\"").unwrap();
        assert_eq!(mode, LightMode::Colour);
    }
}
