//! Ambient Engine - Main entry point
//!
//! Runs one engine as a daemon until Ctrl-C, logging every color it would
//! send to the light.
//!
//! # Usage
//!
//! ```bash
//! # Follow the primary display with the continuous engine
//! ambient-engine
//!
//! # Pick colors from a still image with the discrete engine
//! ambient-engine --discrete --image wallpaper.png
//! ```

use ambient_engine::{
    Config, DecisionHistory, DisplayCapture, Engine, EngineEvent, EngineKind, FrameSource,
    ImageFileSource, LogSink,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command line overrides
#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    image_path: Option<PathBuf>,
    engine: Option<EngineKind>,
    monitor_index: Option<usize>,
    export_path: Option<PathBuf>,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-v" => {
                println!("Ambient Engine v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--image" => {
                i += 1;
                if i < args.len() {
                    parsed.image_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--export" => {
                i += 1;
                if i < args.len() {
                    parsed.export_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--monitor" => {
                i += 1;
                if i < args.len() {
                    match args[i].parse() {
                        Ok(index) => parsed.monitor_index = Some(index),
                        Err(_) => {
                            eprintln!("Invalid monitor index: {}", args[i]);
                            std::process::exit(1);
                        }
                    }
                }
            }
            "--continuous" => parsed.engine = Some(EngineKind::Continuous),
            "--discrete" => parsed.engine = Some(EngineKind::Discrete),
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Use --help for usage information.");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"Ambient Engine - Screen-to-light color engine

USAGE:
    ambient-engine [OPTIONS]

OPTIONS:
    -h, --help              Show this help message
    -v, --version           Show version
    -c, --config <PATH>     Path to configuration file
    --continuous            Run the screen-sync engine (default)
    --discrete              Run the smart-ambient engine
    --monitor <INDEX>       Monitor to sample (0 = primary)
    --image <PATH>          Sample a still image instead of the display
    --export <PATH>         Write decision history on exit (.json or .csv)

ENGINES:
    - Continuous: smooths the screen's representative color every frame
    - Discrete: scores dominant colors and applies the best one periodically

PERMISSIONS REQUIRED:
    - Screen Recording: System Settings > Privacy & Security > Screen Recording

EXAMPLES:
    ambient-engine                               # Follow the primary display
    ambient-engine --discrete --monitor 1        # Smart ambient on the second display
    ambient-engine --image shot.png --export h.csv
"#
    );
}

fn handle_event(event: EngineEvent) {
    match event {
        EngineEvent::Status(message) => info!("{}", message),
        EngineEvent::Color(color) => debug!("Color sent: {}", color),
        EngineEvent::Decision(report) => {
            info!("Decision: {}", report.summary);
            for candidate in report.runner_ups(2) {
                debug!(
                    "  runner-up {} ({:.1}%): {}",
                    candidate.hex,
                    candidate.screen_percentage,
                    candidate.score_breakdown.summary()
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();

    // Load configuration
    let config_path = args.config_path.clone().unwrap_or_else(Config::default_config_path);
    let config = Config::load_from_path(config_path.clone());

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting Ambient Engine");
    info!("Configuration loaded from {:?}", config_path);

    if !config.general.enabled {
        info!("Engine is disabled in configuration, exiting");
        return Ok(());
    }

    let kind = args.engine.unwrap_or(config.general.engine);
    let mut engine_config = config.engine_config();
    if let Some(index) = args.monitor_index {
        engine_config.monitor_index = index;
    }

    let source: Arc<dyn FrameSource> = match &args.image_path {
        Some(path) => {
            info!("Sampling image {:?}", path);
            Arc::new(ImageFileSource::new(path.clone()))
        }
        None => Arc::new(DisplayCapture::new()),
    };

    let history = Arc::new(Mutex::new(DecisionHistory::new(config.history.max_entries)));
    let engine = Engine::new(kind, source, Arc::new(LogSink), Arc::clone(&history), engine_config);

    // Setup shutdown signal
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(100);
    let event_handle = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            handle_event(event);
        }
    });

    if !engine.start(event_tx) {
        error!("Failed to start {} engine", kind);
        return Ok(());
    }

    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    info!("Shutting down...");
    engine.stop().await;
    drop(engine);
    if tokio::time::timeout(Duration::from_secs(1), event_handle).await.is_err() {
        warn!("Event handler did not finish");
    }

    if let Some(path) = args.export_path.or(config.history.export_path) {
        let history = history.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match history.export(&path) {
            Ok(()) => info!("History written to {:?}", path),
            Err(e) => error!("Failed to export history: {}", e),
        }
    }

    Ok(())
}
