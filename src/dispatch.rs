//! Light sink interface and dispatch rate limiting.

use crate::color::Rgb;
use crate::types::{LightMode, SinkError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, trace};

/// Longest accepted minimum interval between dispatches
pub const MAX_RATE_LIMIT: Duration = Duration::from_secs(5);

/// Downstream light controller
///
/// Implementations own the transport; the engine only needs to know whether a
/// command was accepted.
#[async_trait::async_trait]
pub trait ColorSink: Send + Sync {
    /// Send an RGB color
    async fn set_color(&self, color: Rgb) -> Result<(), SinkError>;

    /// Switch the light's operating mode
    async fn set_mode(&self, mode: LightMode) -> Result<(), SinkError>;
}

/// Sink that only logs what it would send
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait::async_trait]
impl ColorSink for LogSink {
    async fn set_color(&self, color: Rgb) -> Result<(), SinkError> {
        info!("Light color -> {} (rgb {}, {}, {})", color, color.r, color.g, color.b);
        Ok(())
    }

    async fn set_mode(&self, mode: LightMode) -> Result<(), SinkError> {
        info!("Light mode -> {}", mode.as_str());
        Ok(())
    }
}

/// Enforces a minimum interval between successful dispatches
#[derive(Debug, Clone)]
pub struct DispatchLimiter {
    min_interval: Duration,
    last_dispatch: Option<Instant>,
}

impl DispatchLimiter {
    /// `min_interval` is clamped to 5 s; zero disables limiting
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval: min_interval.min(MAX_RATE_LIMIT),
            last_dispatch: None,
        }
    }

    /// Whether a dispatch at `now` is allowed
    pub fn ready(&self, now: Instant) -> bool {
        if self.min_interval.is_zero() {
            return true;
        }
        match self.last_dispatch {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                trace!("{:?} since last dispatch (limit {:?})", elapsed, self.min_interval);
                elapsed >= self.min_interval
            }
            None => true,
        }
    }

    /// Record a successful dispatch at `now`
    pub fn record(&mut self, now: Instant) {
        self.last_dispatch = Some(now);
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn set_min_interval(&mut self, min_interval: Duration) {
        self.min_interval = min_interval.min(MAX_RATE_LIMIT);
    }

    pub fn reset(&mut self) {
        self.last_dispatch = None;
    }
}

impl Default for DispatchLimiter {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_disabled_limiter_always_ready() {
        let mut limiter = DispatchLimiter::default();
        let now = Instant::now();
        limiter.record(now);
        assert!(limiter.ready(now));
    }

    #[test]
    fn test_drops_attempts_inside_interval() {
        let mut limiter = DispatchLimiter::new(Duration::from_secs(2));
        let start = Instant::now();
        assert!(limiter.ready(start));
        limiter.record(start);
        assert!(!limiter.ready(start + Duration::from_millis(1999)));
        assert!(limiter.ready(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_interval_clamped() {
        let limiter = DispatchLimiter::new(Duration::from_secs(30));
        assert_eq!(limiter.min_interval(), MAX_RATE_LIMIT);
    }

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        let sink = LogSink;
        assert!(sink.set_mode(LightMode::Colour).await.is_ok());
        assert!(sink.set_color(Rgb::new(1, 2, 3)).await.is_ok());
    }

    proptest! {
        #[test]
        fn prop_dispatch_count_bounded(
            limit_ms in 1u64..5000,
            attempts in proptest::collection::vec(0u64..20_000, 1..200),
        ) {
            let mut offsets = attempts;
            offsets.sort_unstable();
            let start = Instant::now();
            let mut limiter = DispatchLimiter::new(Duration::from_millis(limit_ms));

            let mut sent = 0u64;
            for offset in &offsets {
                let now = start + Duration::from_millis(*offset);
                if limiter.ready(now) {
                    limiter.record(now);
                    sent += 1;
                }
            }

            let span = offsets.last().copied().unwrap_or(0) - offsets[0];
            let bound = span.div_ceil(limit_ms) + 1;
            prop_assert!(sent <= bound, "sent {} > bound {}", sent, bound);
        }
    }
}
