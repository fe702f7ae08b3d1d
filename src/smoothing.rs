//! Exponential smoothing of the representative color.

use crate::color::{FloatRgb, Rgb};
use crate::types::ExtractionMode;

pub const MIN_ALPHA: f64 = 0.05;
pub const MAX_ALPHA: f64 = 0.6;
pub const DEFAULT_ALPHA: f64 = 0.2;

/// Accent output is smoothed harder than the plain average
const ACCENT_ALPHA_SCALE: f64 = 0.7;

/// EMA over RGB with the first sample used as the seed
#[derive(Debug, Clone)]
pub struct TemporalFilter {
    alpha: f64,
    current: Option<FloatRgb>,
}

impl TemporalFilter {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: clamp_alpha(alpha),
            current: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Set the smoothing factor, clamped to `[0.05, 0.6]`
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = clamp_alpha(alpha);
    }

    /// Weight given to the newest sample under `mode`
    pub fn effective_alpha(&self, mode: ExtractionMode) -> f64 {
        match mode {
            ExtractionMode::Average => self.alpha,
            ExtractionMode::Accent => self.alpha * ACCENT_ALPHA_SCALE,
        }
    }

    /// Fold in a raw sample and return the smoothed color
    pub fn update(&mut self, raw: Rgb, mode: ExtractionMode) -> FloatRgb {
        let raw = raw.to_float();
        let next = match self.current {
            None => raw,
            Some(prev) => raw.mix(&prev, self.effective_alpha(mode)),
        };
        self.current = Some(next);
        next
    }

    pub fn current(&self) -> Option<FloatRgb> {
        self.current
    }

    /// Forget the smoothed value; the next sample seeds again
    pub fn reset(&mut self) {
        self.current = None;
    }
}

impl Default for TemporalFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

fn clamp_alpha(alpha: f64) -> f64 {
    if alpha.is_nan() {
        return DEFAULT_ALPHA;
    }
    alpha.clamp(MIN_ALPHA, MAX_ALPHA)
}
