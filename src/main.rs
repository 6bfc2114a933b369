//! Pose gesture tool: replays recorded pose traces and manages calibration.

use anyhow::{Context, Result};
use camera_runner_pose::{
    app::{PoseTrace, ReplayApp, ReplayEvent},
    calibration::{FileThresholdStore, PoseThresholds, ThresholdStore},
    config::{Config, EXAMPLE_CONFIG},
    tuning::DetectionMode,
};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded pose trace through the gesture pipeline
    Replay {
        /// Pose trace (YAML)
        #[arg(short, long)]
        trace: PathBuf,

        /// Detection mode (accuracy, balanced, responsive)
        #[arg(short, long)]
        mode: Option<DetectionMode>,

        /// Path to configuration file (YAML format)
        #[arg(short = 'C', long)]
        config: Option<PathBuf>,

        /// Calibration file; overrides the one named in the configuration
        #[arg(long)]
        calibration: Option<PathBuf>,
    },

    /// Inspect or change stored calibration thresholds
    Calibration {
        #[command(subcommand)]
        action: CalibrationAction,
    },

    /// Print configuration
    Config {
        /// Print the documented example configuration
        #[arg(long)]
        example: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CalibrationAction {
    /// Print the stored thresholds
    Show {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Store new thresholds
    Set {
        #[arg(short, long)]
        file: PathBuf,

        /// Resting wrist height (0.0-1.0, 0 = top of frame)
        #[arg(long)]
        idle: f64,

        /// Wrist height that counts as a jump (0.0-1.0)
        #[arg(long)]
        jump: f64,
    },
    /// Remove stored thresholds
    Clear {
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    info!("Loading configuration from: {}", path.display());
    match Config::from_file(path) {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Invalid config file: {}. Using defaults.", e);
                Config::default()
            }
        },
        Err(e) => {
            warn!("Failed to load config file: {}. Using defaults.", e);
            Config::default()
        }
    }
}

fn replay(
    trace: &Path,
    mode: Option<DetectionMode>,
    config: Option<&Path>,
    calibration: Option<&Path>,
) -> Result<()> {
    let config = load_config(config);
    let thresholds = calibration
        .or(config.calibration.file.as_deref())
        .and_then(|path| FileThresholdStore::new(path).load());

    let trace = PoseTrace::from_file(trace).with_context(|| format!("Failed to load trace {}", trace.display()))?;
    let mut app = ReplayApp::new(&config, mode, thresholds)?;
    let summary = app.run(&trace);

    for event in &summary.events {
        match event {
            ReplayEvent::Gesture { timestamp, gesture } => println!("{timestamp:>10.0}  {gesture}"),
            ReplayEvent::HandsUp { timestamp } => println!("{timestamp:>10.0}  hands-up"),
            ReplayEvent::PumpStarted {
                timestamp,
                speed_multiplier,
            } => println!("{timestamp:>10.0}  pump x{speed_multiplier:.2}"),
            ReplayEvent::PumpStopped { timestamp } => println!("{timestamp:>10.0}  pump stopped"),
            ReplayEvent::PoseStale { timestamp } => println!("{timestamp:>10.0}  pose stale"),
            ReplayEvent::PoseRecovered { timestamp } => println!("{timestamp:>10.0}  pose recovered"),
        }
    }
    println!(
        "frames: {}, poses: {}, jumps: {}, flaps: {}, hands-up: {}, pump frames: {}, max speed: x{:.2}",
        summary.frames,
        summary.poses,
        summary.jumps,
        summary.flaps,
        summary.hands_up,
        summary.pump_frames,
        summary.max_speed_multiplier
    );
    Ok(())
}

fn calibration(action: CalibrationAction) -> Result<()> {
    match action {
        CalibrationAction::Show { file } => match FileThresholdStore::new(&file).load() {
            Some(t) => println!("idleThreshold: {}\njumpThreshold: {}", t.idle_threshold, t.jump_threshold),
            None => println!("No calibration stored in {}", file.display()),
        },
        CalibrationAction::Set { file, idle, jump } => {
            let thresholds = PoseThresholds::new(idle, jump);
            if jump >= idle {
                warn!("Jump threshold {jump} is not above the idle height {idle}; it will be clamped when used");
            }
            FileThresholdStore::new(&file)
                .save(&thresholds)
                .with_context(|| format!("Failed to store calibration in {}", file.display()))?;
        }
        CalibrationAction::Clear { file } => {
            FileThresholdStore::new(&file).clear()?;
            info!("Cleared calibration {}", file.display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    match args.command {
        Command::Replay {
            trace,
            mode,
            config,
            calibration,
        } => replay(&trace, mode, config.as_deref(), calibration.as_deref()),
        Command::Calibration { action } => calibration(action),
        Command::Config { example } => {
            if example {
                print!("{EXAMPLE_CONFIG}");
            } else {
                print!("{}", serde_yaml::to_string(&Config::default())?);
            }
            Ok(())
        }
    }
}
