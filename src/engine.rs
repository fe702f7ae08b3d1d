//! Engine lifecycle and the per-tick pipeline.
//!
//! An [`Engine`] owns one background task that repeatedly captures a frame,
//! reduces it to the analysis grid, and turns it into a light command:
//!
//! - **Continuous** (screen-sync): the representative color is smoothed every
//!   tick and sent whenever it drifts past the change threshold.
//! - **Discrete** (smart-ambient): every update interval the colorful
//!   dominant colors are scored and the winner is sent when it differs
//!   enough from the last one, subject to an optional rate limit.
//!
//! Settings can be changed while the engine runs; the loop takes a snapshot
//! at the start of every tick.

use crate::capture::FrameSource;
use crate::change_detector::{ChangeGate, CONTINUOUS_THRESHOLD, DISCRETE_THRESHOLD};
use crate::color::Rgb;
use crate::decision::{DecisionReport, DecisionSelector};
use crate::dispatch::{ColorSink, DispatchLimiter, MAX_RATE_LIMIT};
use crate::extractor::{dominant_colors, ColorExtractor, DominantColor};
use crate::history::DecisionHistory;
use crate::preprocess::{crop_and_downsample, MAX_CROP_PERCENT};
use crate::scoring::{AmbientScorer, BrightnessFalloff};
use crate::smoothing::{TemporalFilter, DEFAULT_ALPHA, MAX_ALPHA, MIN_ALPHA};
use crate::types::{EngineKind, ExtractionMode, LightMode, MonitorIndex};
use image::RgbImage;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

pub const DEFAULT_CROP_PERCENT: f32 = 15.0;
pub const DEFAULT_FPS_LIMIT: u32 = 12;
pub const MAX_FPS_LIMIT: u32 = 60;
pub const DEFAULT_CANDIDATE_COUNT: usize = 8;
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(500);
pub const MAX_UPDATE_INTERVAL: Duration = Duration::from_secs(5);

/// Unfiltered colors logged per tick for diagnostics
const DIAGNOSTIC_COLOR_COUNT: usize = 10;

/// How long `stop` waits for the worker before aborting it
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Consecutive failures after which the status report repeats
const FAILURE_REPORT_INTERVAL: u32 = 5;

/// Runtime settings for an engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Percentage trimmed from each frame edge (0-40)
    pub crop_percent: f32,
    /// EMA smoothing factor (0.05-0.6)
    pub alpha: f64,
    pub mode: ExtractionMode,
    /// Continuous ticks per second (1-60)
    pub fps_limit: u32,
    pub monitor_index: MonitorIndex,
    pub continuous_change_threshold: f64,
    pub discrete_change_threshold: f64,
    /// Discrete decision period (0.5-5 s)
    pub update_interval: Duration,
    /// Minimum time between discrete dispatches (0-5 s, 0 = off)
    pub rate_limit: Duration,
    /// Colorful candidates scored per decision
    pub candidate_count: usize,
    pub brightness_falloff: BrightnessFalloff,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            crop_percent: DEFAULT_CROP_PERCENT,
            alpha: DEFAULT_ALPHA,
            mode: ExtractionMode::default(),
            fps_limit: DEFAULT_FPS_LIMIT,
            monitor_index: 0,
            continuous_change_threshold: CONTINUOUS_THRESHOLD,
            discrete_change_threshold: DISCRETE_THRESHOLD,
            update_interval: Duration::from_secs(1),
            rate_limit: Duration::ZERO,
            candidate_count: DEFAULT_CANDIDATE_COUNT,
            brightness_falloff: BrightnessFalloff::default(),
        }
    }
}

impl EngineConfig {
    /// Bring every field into its valid range
    pub fn clamped(mut self) -> Self {
        self.crop_percent = clamp_crop(self.crop_percent);
        self.alpha = clamp_f64(self.alpha, MIN_ALPHA, MAX_ALPHA, DEFAULT_ALPHA);
        self.fps_limit = self.fps_limit.clamp(1, MAX_FPS_LIMIT);
        self.continuous_change_threshold =
            clamp_f64(self.continuous_change_threshold, 0.0, 1.0, CONTINUOUS_THRESHOLD);
        self.discrete_change_threshold =
            clamp_f64(self.discrete_change_threshold, 0.0, 1.0, DISCRETE_THRESHOLD);
        self.update_interval = self.update_interval.clamp(MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL);
        self.rate_limit = self.rate_limit.min(MAX_RATE_LIMIT);
        self.candidate_count = self.candidate_count.max(1);
        self
    }

    /// Target time between ticks for an engine of `kind`
    pub fn tick_period(&self, kind: EngineKind) -> Duration {
        match kind {
            EngineKind::Continuous => Duration::from_secs_f64(1.0 / self.fps_limit.max(1) as f64),
            EngineKind::Discrete => self.update_interval,
        }
    }

    /// Change threshold used by an engine of `kind`
    pub fn change_threshold(&self, kind: EngineKind) -> f64 {
        match kind {
            EngineKind::Continuous => self.continuous_change_threshold,
            EngineKind::Discrete => self.discrete_change_threshold,
        }
    }
}

fn clamp_crop(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, MAX_CROP_PERCENT)
    } else {
        DEFAULT_CROP_PERCENT
    }
}

fn clamp_f64(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds.min(MAX_UPDATE_INTERVAL.as_secs_f64() * 2.0))
    } else {
        Duration::ZERO
    }
}

/// Notifications from a running engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A color the sink accepted
    Color(Rgb),
    /// Human-readable status line
    Status(String),
    /// A new decision report
    Decision(Box<DecisionReport>),
}

/// State shared between the engine handle and its worker
struct SharedState {
    running: AtomicBool,
    cancel: AtomicBool,
    current_color: Mutex<Rgb>,
    last_report: Mutex<Option<DecisionReport>>,
    /// f64 bits of the measured tick rate
    actual_fps: AtomicU64,
}

impl SharedState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            cancel: AtomicBool::new(false),
            current_color: Mutex::new(Rgb::default()),
            last_report: Mutex::new(None),
            actual_fps: AtomicU64::new(0f64.to_bits()),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A spawned worker and the handle that wakes it
struct WorkerHandle {
    task: JoinHandle<()>,
    wake: Arc<Notify>,
}

/// Screen-to-light color engine
pub struct Engine {
    kind: EngineKind,
    source: Arc<dyn FrameSource>,
    sink: Arc<dyn ColorSink>,
    history: Arc<Mutex<DecisionHistory>>,
    config: Arc<RwLock<EngineConfig>>,
    shared: Arc<SharedState>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl Engine {
    pub fn new(
        kind: EngineKind,
        source: Arc<dyn FrameSource>,
        sink: Arc<dyn ColorSink>,
        history: Arc<Mutex<DecisionHistory>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            kind,
            source,
            sink,
            history,
            config: Arc::new(RwLock::new(config.clamped())),
            shared: Arc::new(SharedState::new()),
            worker: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Start the background task
    ///
    /// Returns `true` if the engine is running afterwards (including when it
    /// already was) and `false` when no tokio runtime is available.
    pub fn start(&self, events: mpsc::Sender<EngineEvent>) -> bool {
        let mut running_worker = lock(&self.worker);
        if self.shared.running.load(Ordering::SeqCst) {
            debug!("{} engine already running", self.kind);
            return true;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot start {} engine without a tokio runtime: {}", self.kind, e);
                return false;
            }
        };

        self.shared.cancel.store(false, Ordering::SeqCst);
        self.shared.running.store(true, Ordering::SeqCst);

        let config = self.config();
        let wake = Arc::new(Notify::new());
        let worker = Worker {
            kind: self.kind,
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            history: Arc::clone(&self.history),
            config: Arc::clone(&self.config),
            shared: Arc::clone(&self.shared),
            events,
            wake: Arc::clone(&wake),
            filter: TemporalFilter::new(config.alpha),
            gate: ChangeGate::new(config.change_threshold(self.kind)),
            limiter: DispatchLimiter::new(config.rate_limit),
            capture_failures: FailureTracker::default(),
            selection_failures: FailureTracker::default(),
            sink_failures: FailureTracker::default(),
            monitor_fallback_warned: false,
            last_recorded_winner: None,
        };

        *running_worker = Some(WorkerHandle {
            task: runtime.spawn(worker.run()),
            wake,
        });
        info!("{} engine started", self.kind);
        true
    }

    /// Stop the background task, waiting up to 2 s before aborting it
    pub async fn stop(&self) {
        let worker = lock(&self.worker).take();
        let Some(WorkerHandle { task, wake }) = worker else {
            return;
        };

        self.shared.cancel.store(true, Ordering::SeqCst);
        wake.notify_one();

        let abort = task.abort_handle();
        match tokio::time::timeout(STOP_TIMEOUT, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("{} engine task ended abnormally: {}", self.kind, e),
            Err(_) => {
                warn!("{} engine did not stop within {:?}, aborting", self.kind, STOP_TIMEOUT);
                abort.abort();
            }
        }

        self.shared.running.store(false, Ordering::SeqCst);
        info!("{} engine stopped", self.kind);
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn update_config(&self, apply: impl FnOnce(&mut EngineConfig)) {
        let mut config = self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        apply(&mut config);
        let clamped = EngineConfig::clone(&config).clamped();
        *config = clamped;
    }

    /// Percentage trimmed from each edge, clamped to 0-40
    pub fn set_crop_percent(&self, crop_percent: f32) {
        self.update_config(|c| c.crop_percent = crop_percent);
        info!("Crop set to {}%", clamp_crop(crop_percent));
    }

    /// Smoothing factor, clamped to 0.05-0.6
    pub fn set_alpha(&self, alpha: f64) {
        self.update_config(|c| c.alpha = alpha);
        info!("Smoothing alpha set to {}", self.config().alpha);
    }

    pub fn set_mode(&self, mode: ExtractionMode) {
        self.update_config(|c| c.mode = mode);
        info!("Extraction mode set to {}", mode);
    }

    /// Monitor to sample; out-of-range indices fall back to the primary at capture time
    pub fn set_monitor(&self, monitor_index: MonitorIndex) {
        self.update_config(|c| c.monitor_index = monitor_index);
        info!("Monitor set to {}", monitor_index);
    }

    /// Change threshold for this engine's mode, clamped to 0-1
    pub fn set_change_threshold(&self, threshold: f64) {
        let kind = self.kind;
        self.update_config(|c| match kind {
            EngineKind::Continuous => c.continuous_change_threshold = threshold,
            EngineKind::Discrete => c.discrete_change_threshold = threshold,
        });
        info!("Change threshold set to {}", self.config().change_threshold(kind));
    }

    /// Continuous tick rate, clamped to 1-60
    pub fn set_fps_limit(&self, fps_limit: u32) {
        self.update_config(|c| c.fps_limit = fps_limit);
        info!("FPS limit set to {}", self.config().fps_limit);
    }

    /// Discrete decision period in seconds, clamped to 0.5-5
    pub fn set_update_interval(&self, seconds: f64) {
        let interval = if seconds.is_nan() {
            Duration::from_secs(1)
        } else {
            seconds_to_duration(seconds)
        };
        self.update_config(|c| c.update_interval = interval);
        info!("Update interval set to {:?}", self.config().update_interval);
    }

    /// Minimum seconds between discrete dispatches, clamped to 0-5 (0 disables)
    pub fn set_rate_limit(&self, seconds: f64) {
        self.update_config(|c| c.rate_limit = seconds_to_duration(seconds));
        info!("Rate limit set to {:?}", self.config().rate_limit);
    }

    /// Last smoothed (continuous) or dispatched (discrete) color as `#rrggbb`
    pub fn current_color(&self) -> String {
        lock(&self.shared.current_color).to_hex()
    }

    pub fn last_decision_report(&self) -> Option<DecisionReport> {
        lock(&self.shared.last_report).clone()
    }

    /// Snapshot of the current settings
    pub fn config(&self) -> EngineConfig {
        self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Measured ticks per second
    pub fn actual_fps(&self) -> f64 {
        f64::from_bits(self.shared.actual_fps.load(Ordering::Relaxed))
    }
}

/// Reports the first of a run of failures, then every fifth
#[derive(Debug, Default)]
struct FailureTracker {
    consecutive: u32,
}

impl FailureTracker {
    /// Record a failure; returns whether it should be reported
    fn record(&mut self) -> bool {
        let report = self.consecutive == 0;
        self.consecutive += 1;
        if self.consecutive >= FAILURE_REPORT_INTERVAL {
            self.consecutive = 0;
        }
        report
    }

    fn reset(&mut self) {
        self.consecutive = 0;
    }
}

/// The engine's background task state
struct Worker {
    kind: EngineKind,
    source: Arc<dyn FrameSource>,
    sink: Arc<dyn ColorSink>,
    history: Arc<Mutex<DecisionHistory>>,
    config: Arc<RwLock<EngineConfig>>,
    shared: Arc<SharedState>,
    events: mpsc::Sender<EngineEvent>,
    /// Interrupts the inter-tick sleep of this run only
    wake: Arc<Notify>,
    filter: TemporalFilter,
    gate: ChangeGate,
    limiter: DispatchLimiter,
    capture_failures: FailureTracker,
    selection_failures: FailureTracker,
    sink_failures: FailureTracker,
    monitor_fallback_warned: bool,
    /// Winner of the last report recorded in continuous mode
    last_recorded_winner: Option<Option<String>>,
}

impl Worker {
    async fn run(mut self) {
        let label = match self.kind {
            EngineKind::Continuous => "Screen sync",
            EngineKind::Discrete => "Smart ambient lighting",
        };

        if let Err(e) = self.sink.set_mode(LightMode::Colour).await {
            warn!("Failed to switch light to colour mode: {}", e);
            self.status(format!("Light error: {}", e));
        }
        self.status(format!("{} active", label));

        let mut last_tick: Option<Instant> = None;
        while !self.shared.is_cancelled() {
            let config = self.snapshot();
            let tick_start = Instant::now();

            if let Some(previous) = last_tick {
                let elapsed = tick_start.duration_since(previous).as_secs_f64();
                if elapsed > 0.0 {
                    self.shared.actual_fps.store((1.0 / elapsed).to_bits(), Ordering::Relaxed);
                }
            }
            last_tick = Some(tick_start);

            match self.kind {
                EngineKind::Continuous => self.continuous_tick(&config).await,
                EngineKind::Discrete => self.discrete_tick(&config).await,
            }

            if self.shared.is_cancelled() {
                break;
            }

            let delay = config.tick_period(self.kind).saturating_sub(tick_start.elapsed());
            trace!("Tick took {:?}, sleeping {:?}", tick_start.elapsed(), delay);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.wake.notified() => {}
            }
        }

        self.shared.running.store(false, Ordering::SeqCst);
        self.status(format!("{} stopped", label));
    }

    fn snapshot(&self) -> EngineConfig {
        self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn emit(&self, event: EngineEvent) {
        if let Err(e) = self.events.try_send(event) {
            trace!("Dropped engine event: {}", e);
        }
    }

    fn status(&self, message: impl Into<String>) {
        self.emit(EngineEvent::Status(message.into()));
    }

    /// Capture and downsample one frame off the async runtime
    async fn capture_grid(&mut self, config: &EngineConfig) -> Option<RgbImage> {
        let source = Arc::clone(&self.source);
        let requested = config.monitor_index;
        let crop = config.crop_percent;

        let result = tokio::task::spawn_blocking(move || {
            let index = if requested < source.monitor_count() { requested } else { 0 };
            source
                .capture(index)
                .map(|frame| (index, crop_and_downsample(&frame, crop)))
        })
        .await;

        match result {
            Ok(Ok((index, grid))) => {
                if index != requested && !self.monitor_fallback_warned {
                    warn!("Monitor {} not available, using primary", requested);
                    self.monitor_fallback_warned = true;
                } else if index == requested {
                    self.monitor_fallback_warned = false;
                }
                self.capture_failures.reset();
                Some(grid)
            }
            Ok(Err(e)) => {
                warn!("Capture failed: {}", e);
                if self.capture_failures.record() {
                    self.status(format!("Capture error: {}", e));
                }
                None
            }
            Err(e) => {
                error!("Capture task failed: {}", e);
                None
            }
        }
    }

    fn decide(&self, config: &EngineConfig, candidates: &[DominantColor]) -> DecisionReport {
        DecisionSelector::new(AmbientScorer::new(config.brightness_falloff))
            .decide(candidates.iter().map(|c| (c.hex.as_str(), c.percentage)))
    }

    /// Store a report as the latest and optionally record it
    fn publish_report(&self, report: DecisionReport, record: bool) {
        *lock(&self.shared.last_report) = Some(report.clone());
        if record {
            lock(&self.history).add(report.clone());
            self.emit(EngineEvent::Decision(Box::new(report)));
        }
    }

    /// Send a color; returns whether the sink accepted it
    async fn dispatch(&mut self, color: Rgb) -> bool {
        match self.sink.set_color(color).await {
            Ok(()) => {
                debug!("Dispatched {}", color);
                self.sink_failures.reset();
                self.emit(EngineEvent::Color(color));
                true
            }
            Err(e) => {
                error!("Failed to send {}: {}", color, e);
                if self.sink_failures.record() {
                    self.status(format!("Light error: {}", e));
                }
                false
            }
        }
    }

    async fn continuous_tick(&mut self, config: &EngineConfig) {
        let Some(grid) = self.capture_grid(config).await else {
            return;
        };

        let raw = ColorExtractor::new(config.mode).representative(&grid);
        self.filter.set_alpha(config.alpha);
        let smoothed = self.filter.update(raw, config.mode);
        let color = smoothed.to_rgb();
        *lock(&self.shared.current_color) = color;
        trace!("Raw {} smoothed {}", raw, color);

        let candidates = dominant_colors(&grid, config.candidate_count, true);
        let report = self.decide(config, &candidates);
        let winner = report.winner_hex().map(str::to_string);
        let record = self.last_recorded_winner.as_ref() != Some(&winner);
        if record {
            self.last_recorded_winner = Some(winner);
        }
        self.publish_report(report, record);

        self.gate.set_threshold(config.continuous_change_threshold);
        if self.gate.should_dispatch(&smoothed) && self.dispatch(color).await {
            self.gate.record_dispatch(smoothed);
        }
    }

    async fn discrete_tick(&mut self, config: &EngineConfig) {
        let Some(grid) = self.capture_grid(config).await else {
            return;
        };

        if tracing::enabled!(tracing::Level::TRACE) {
            let all = dominant_colors(&grid, DIAGNOSTIC_COLOR_COUNT, false);
            trace!(
                "Top colors: {}",
                all.iter()
                    .map(|c| format!("{} {:.1}%", c.hex, c.percentage))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let candidates = dominant_colors(&grid, config.candidate_count, true);
        if candidates.is_empty() {
            debug!("No colorful candidates");
            if self.selection_failures.record() {
                self.status("No colors detected on screen");
            }
            return;
        }

        let report = self.decide(config, &candidates);
        let winner = report.winner.clone();
        self.publish_report(report, true);

        let Some(winner) = winner else {
            if self.selection_failures.record() {
                self.status("No suitable colors found - screen mostly grayscale");
            }
            return;
        };
        self.selection_failures.reset();

        let target = winner.rgb.to_float();
        self.gate.set_threshold(config.discrete_change_threshold);
        if !self.gate.should_dispatch(&target) {
            trace!("{} too close to last dispatched color", winner.hex);
            return;
        }

        self.limiter.set_min_interval(config.rate_limit);
        let now = Instant::now();
        if !self.limiter.ready(now) {
            debug!("Rate limit active, dropping {}", winner.hex);
            return;
        }

        if self.dispatch(winner.rgb).await {
            self.gate.record_dispatch(target);
            self.limiter.record(now);
            *lock(&self.shared.current_color) = winner.rgb;
            self.status(format!(
                "Auto-applied: {} ({:.1}% of screen)",
                winner.hex, winner.screen_percentage
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StaticFrameSource;
    use crate::dispatch::LogSink;

    fn engine(kind: EngineKind) -> Engine {
        Engine::new(
            kind,
            Arc::new(StaticFrameSource::solid(64, 36, [200, 30, 30])),
            Arc::new(LogSink),
            Arc::new(Mutex::new(DecisionHistory::default())),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_failure_tracker_reports_first_and_every_fifth() {
        let mut tracker = FailureTracker::default();
        let reported: Vec<usize> = (1..=12).filter(|_| tracker.record()).collect();
        assert_eq!(reported, vec![1, 6, 11]);

        tracker.reset();
        assert!(tracker.record());
    }

    #[test]
    fn test_config_clamps() {
        let config = EngineConfig {
            crop_percent: f32::NAN,
            alpha: 0.01,
            fps_limit: 500,
            discrete_change_threshold: 3.0,
            update_interval: Duration::from_millis(10),
            rate_limit: Duration::from_secs(60),
            candidate_count: 0,
            ..EngineConfig::default()
        }
        .clamped();

        assert_eq!(config.crop_percent, DEFAULT_CROP_PERCENT);
        assert_eq!(config.alpha, MIN_ALPHA);
        assert_eq!(config.fps_limit, MAX_FPS_LIMIT);
        assert_eq!(config.discrete_change_threshold, 1.0);
        assert_eq!(config.update_interval, MIN_UPDATE_INTERVAL);
        assert_eq!(config.rate_limit, MAX_RATE_LIMIT);
        assert_eq!(config.candidate_count, 1);
    }

    #[test]
    fn test_tick_period() {
        let config = EngineConfig {
            fps_limit: 10,
            update_interval: Duration::from_secs(2),
            ..EngineConfig::default()
        };
        assert_eq!(config.tick_period(EngineKind::Continuous), Duration::from_millis(100));
        assert_eq!(config.tick_period(EngineKind::Discrete), Duration::from_secs(2));
    }

    #[test]
    fn test_setters_clamp() {
        let engine = engine(EngineKind::Discrete);
        engine.set_crop_percent(75.0);
        engine.set_alpha(1.0);
        engine.set_update_interval(0.1);
        engine.set_rate_limit(9.0);
        engine.set_change_threshold(0.2);
        engine.set_fps_limit(0);
        engine.set_monitor(3);
        engine.set_mode(ExtractionMode::Average);

        let config = engine.config();
        assert_eq!(config.crop_percent, 40.0);
        assert_eq!(config.alpha, MAX_ALPHA);
        assert_eq!(config.update_interval, MIN_UPDATE_INTERVAL);
        assert_eq!(config.rate_limit, MAX_RATE_LIMIT);
        assert_eq!(config.discrete_change_threshold, 0.2);
        assert_eq!(config.continuous_change_threshold, CONTINUOUS_THRESHOLD);
        assert_eq!(config.fps_limit, 1);
        assert_eq!(config.monitor_index, 3);
        assert_eq!(config.mode, ExtractionMode::Average);
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let engine = engine(EngineKind::Continuous);
        let (tx, _rx) = mpsc::channel(8);
        assert!(!engine.start(tx));
        assert!(!engine.is_running());
        assert_eq!(engine.current_color(), "#000000");
        assert!(engine.last_decision_report().is_none());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let engine = engine(EngineKind::Discrete);
        engine.stop().await;
        assert!(!engine.is_running());
    }
}
