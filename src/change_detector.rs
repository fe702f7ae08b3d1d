//! Change gating between consecutive dispatches.
//!
//! A color is only worth sending when it differs enough from the last one
//! the light actually accepted. Distance is Euclidean over RGB with each
//! channel normalized to `[0, 1]`.

use crate::color::FloatRgb;
use tracing::trace;

/// Default gate for continuous (screen-sync) mode
pub const CONTINUOUS_THRESHOLD: f64 = 0.03;

/// Default gate for discrete (smart-ambient) mode
pub const DISCRETE_THRESHOLD: f64 = 0.1;

/// Tracks the last dispatched color and decides whether a new one differs enough
#[derive(Debug, Clone)]
pub struct ChangeGate {
    /// Last color the sink accepted
    last_dispatched: Option<FloatRgb>,
    /// Minimum normalized distance that counts as a change
    threshold: f64,
}

impl ChangeGate {
    pub fn new(threshold: f64) -> Self {
        Self {
            last_dispatched: None,
            threshold: clamp_threshold(threshold),
        }
    }

    /// Whether `candidate` should be sent
    ///
    /// Returns `true` if:
    /// - Nothing has been dispatched yet
    /// - The distance to the last dispatched color exceeds the threshold
    ///
    /// Does not record anything; call [`ChangeGate::record_dispatch`] once
    /// the sink accepted the color.
    pub fn should_dispatch(&self, candidate: &FloatRgb) -> bool {
        match &self.last_dispatched {
            Some(last) => {
                let distance = candidate.distance(last);
                trace!("Color distance: {:.4} (threshold: {})", distance, self.threshold);
                distance > self.threshold
            }
            None => {
                trace!("No color dispatched yet, marking as changed");
                true
            }
        }
    }

    /// Record a color the sink accepted
    pub fn record_dispatch(&mut self, color: FloatRgb) {
        self.last_dispatched = Some(color);
    }

    pub fn last_dispatched(&self) -> Option<FloatRgb> {
        self.last_dispatched
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Update the threshold
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = clamp_threshold(threshold);
    }

    /// Forget the last dispatched color
    pub fn reset(&mut self) {
        self.last_dispatched = None;
    }
}

impl Default for ChangeGate {
    fn default() -> Self {
        Self::new(CONTINUOUS_THRESHOLD)
    }
}

fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        return 0.0;
    }
    threshold.clamp(0.0, 1.0)
}
