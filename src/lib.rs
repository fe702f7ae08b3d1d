//! Ambient Engine - Screen-to-light color decision engine
//!
//! This crate samples the screen and drives a smart light's color from it,
//! using one of two engines:
//!
//! - **Continuous**: smooths a representative color every frame and follows
//!   the screen closely (screen-sync)
//! - **Discrete**: periodically scores the dominant colors and applies the
//!   best one, with an explanation of why it won (smart-ambient)
//!
//! # Architecture
//!
//! Each tick captures a frame, crops and downsamples it to a 64x36 grid,
//! extracts candidate colors, scores and selects a winner, smooths it, and
//! passes it through a change gate and rate limiter before handing it to a
//! [`ColorSink`]. Decision reports are kept in a bounded history that can be
//! exported as JSON or CSV.

pub mod capture;
pub mod change_detector;
pub mod color;
pub mod config;
pub mod decision;
pub mod dispatch;
pub mod engine;
pub mod extractor;
pub mod history;
pub mod preprocess;
pub mod scoring;
pub mod smoothing;
pub mod types;

// Re-export commonly used types
pub use capture::{DisplayCapture, Frame, FrameSource, ImageFileSource, StaticFrameSource};
pub use change_detector::ChangeGate;
pub use color::{FloatRgb, Hsv, HueBucket, Rgb};
pub use config::Config;
pub use decision::{ColorCandidate, DecisionReport, DecisionSelector};
pub use dispatch::{ColorSink, DispatchLimiter, LogSink};
pub use engine::{Engine, EngineConfig, EngineEvent};
pub use extractor::{ColorExtractor, DominantColor};
pub use history::{DecisionHistory, HistoryStatistics};
pub use scoring::{AmbientScorer, BrightnessFalloff, ScoreBreakdown};
pub use smoothing::TemporalFilter;
pub use types::{
    CaptureError, ConfigError, EngineKind, ExtractionMode, LightMode, MonitorIndex, ScoringError,
    SinkError,
};
