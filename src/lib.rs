//! Pose gesture library for camera-controlled games.
//!
//! This library turns noisy per-frame skeletal keypoints from external
//! landmark detectors into discrete gestures (jump, flap) and a continuous
//! arm-pumping speed signal, while keeping the detector call rate bounded.
//!
//! The pipeline consists of:
//! 1. A hybrid scheduler choosing between a cheap hand detector and a
//!    full-body detector on a region of interest of each frame
//! 2. Exponential smoothing of the skeleton and Kalman filtering of the
//!    wrist used as a cursor
//! 3. Pure state machines for jump/flap classification and pump cadence
//! 4. Staleness detection and adaptive throughput control around the
//!    detector call
//!
//! # Examples
//!
//! ## Classifying gestures
//!
//! ```no_run
//! use camera_runner_pose::{
//!     calibration::PoseThresholds,
//!     gesture::{update_gesture, Gesture, GestureInput, GestureState},
//!     tuning::DetectionMode,
//! };
//!
//! let tuning = DetectionMode::Balanced.tuning();
//! let thresholds = Some(PoseThresholds::new(0.75, 0.35));
//! let mut state = GestureState::new(0.0);
//!
//! for (wrist_y, timestamp) in [(0.8, 50.0), (0.3, 200.0)] {
//!     let input = GestureInput {
//!         wrist_y,
//!         wrist_x: 320.0,
//!         shoulder_y: 0.5,
//!         thresholds,
//!         has_pose: true,
//!         has_wrist: true,
//!         timestamp,
//!     };
//!     let update = update_gesture(state, &input, &tuning);
//!     if update.gesture == Gesture::Jump {
//!         println!("Jump at {timestamp} ms");
//!     }
//!     state = update.state;
//! }
//! ```
//!
//! ## Processing detections
//!
//! ```no_run
//! use camera_runner_pose::{
//!     detection::Detection,
//!     keypoint::{Keypoint, KeypointName, Skeleton},
//!     pipeline::PoseProcessor,
//!     tuning::DetectionMode,
//! };
//!
//! let mut processor = PoseProcessor::new(DetectionMode::Responsive);
//! let mut skeleton = Skeleton::empty();
//! skeleton.set(Keypoint::new(KeypointName::LeftWrist, 320.0, 400.0, 0.9));
//!
//! let output = processor.ingest(&Detection::new(skeleton), 480, 16.0);
//! println!(
//!     "gesture: {}, pump: {} (x{:.2}), stale: {}",
//!     output.gesture, output.pump_active, output.speed_multiplier, output.is_pose_stale
//! );
//! ```
//!
//! ## Using Filters
//!
//! ```no_run
//! use camera_runner_pose::filters::create_filter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("kalman")?;
//! let (x, y) = filter.apply(320.0, 240.0);
//! println!("Filtered cursor: ({x:.1}, {y:.1})");
//! filter.reset();
//! # Ok(())
//! # }
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Detection modes and their tuning tables
pub mod tuning;

/// Named keypoints and complete skeletons
pub mod keypoint;

/// Skeleton smoothing and cursor filters
pub mod filters;

/// Detector capability traits, ROI cropping and the hybrid scheduler
pub mod detection;

/// Single-in-flight pacing and error deduplication
pub mod throughput;

/// Jump and flap classification
pub mod gesture;

/// Arm-pumping cadence
pub mod pump;

/// Calibrated thresholds and their persistence
pub mod calibration;

/// Pose loss detection
pub mod staleness;

/// Detection on a dedicated thread
pub mod worker;

/// Per-subject processing and the loops that drive it
pub mod pipeline;

/// Configuration management
pub mod config;

/// Offline trace replay
pub mod app;

/// Numeric helpers
pub mod utils;

pub use error::{Error, Result};
