//! Configuration management for the pose gesture pipeline

use crate::{
    constants::{
        BASE_FRAME_INTERVAL_MS, DEFAULT_FLAP_RESET_MS, DEFAULT_JUMP_COOLDOWN_MS, DEFAULT_KALMAN_ESTIMATED_ERROR,
        DEFAULT_KALMAN_MEASUREMENT_NOISE, DEFAULT_KALMAN_PROCESS_NOISE, DEGRADED_FRAME_INTERVAL_MS, EMA_ALPHA,
        FPS_WINDOW_MS, KEYPOINT_PRESENCE_SCORE, MIN_TARGET_FPS, POSE_PRESENCE_SCORE, STALENESS_CHECK_INTERVAL_MS,
        STALE_AFTER_MS,
    },
    filters::{
        create_filter,
        exponential::ExponentialPointFilter,
        kalman::{KalmanParams, KalmanPointFilter},
        PointFilter,
    },
    pipeline::{PoseProcessor, ProcessorSettings},
    throughput::ThroughputSettings,
    tuning::DetectionMode,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detector cadence
    pub detection: DetectionConfig,

    /// Skeleton smoothing
    pub smoothing: SmoothingConfig,

    /// Cursor point filter
    pub cursor: CursorConfig,

    /// Detection loop pacing
    pub throughput: ThroughputConfig,

    /// Pose loss detection
    pub staleness: StalenessConfig,

    /// Gesture timing
    pub gesture: GestureConfig,

    /// Persisted calibration
    pub calibration: CalibrationConfig,
}

/// Detection mode configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Mode name (accuracy, balanced, responsive)
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Weight of the previous skeleton in the moving average (0.0-1.0)
    pub alpha: f64,
}

/// Cursor filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Filter type (none, kalman, exponential)
    pub filter: String,

    /// Kalman process noise
    pub process_noise: f64,

    /// Kalman measurement noise
    pub measurement_noise: f64,

    /// Kalman initial error covariance
    pub estimated_error: f64,

    /// Exponential filter alpha
    pub exponential_alpha: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThroughputConfig {
    /// Minimum spacing between detections at full rate
    pub base_interval_ms: f64,

    /// Spacing once the measured rate drops below `min_fps`
    pub degraded_interval_ms: f64,

    /// Detection rate floor
    pub min_fps: f64,

    /// Rate measurement window
    pub window_ms: f64,

    /// Minimum max-score for a detection to count as a pose (0.0-1.0)
    pub pose_presence_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StalenessConfig {
    pub check_interval_ms: f64,
    pub stale_after_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Flap counter decays after this long without a direction change
    pub flap_reset_ms: f64,

    /// Minimum time between two hands-up jumps
    pub jump_cooldown_ms: f64,

    /// Minimum wrist/shoulder score to count as observed (0.0-1.0)
    pub wrist_presence_score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// YAML file holding idleThreshold/jumpThreshold
    pub file: Option<PathBuf>,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { alpha: EMA_ALPHA }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            filter: "kalman".to_string(),
            process_noise: DEFAULT_KALMAN_PROCESS_NOISE,
            measurement_noise: DEFAULT_KALMAN_MEASUREMENT_NOISE,
            estimated_error: DEFAULT_KALMAN_ESTIMATED_ERROR,
            exponential_alpha: 0.5,
        }
    }
}

impl Default for ThroughputConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: BASE_FRAME_INTERVAL_MS,
            degraded_interval_ms: DEGRADED_FRAME_INTERVAL_MS,
            min_fps: MIN_TARGET_FPS,
            window_ms: FPS_WINDOW_MS,
            pose_presence_score: POSE_PRESENCE_SCORE,
        }
    }
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: STALENESS_CHECK_INTERVAL_MS,
            stale_after_ms: STALE_AFTER_MS,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            flap_reset_ms: DEFAULT_FLAP_RESET_MS,
            jump_cooldown_ms: DEFAULT_JUMP_COOLDOWN_MS,
            wrist_presence_score: KEYPOINT_PRESENCE_SCORE,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Detection mode, falling back to balanced for unknown names
    #[must_use]
    pub fn detection_mode(&self) -> DetectionMode {
        if self.detection.mode.is_empty() {
            return DetectionMode::default();
        }
        DetectionMode::from_name_lossy(&self.detection.mode)
    }

    /// Create the cursor filter from configuration
    pub fn create_filter(&self) -> Result<Box<dyn PointFilter>> {
        match self.cursor.filter.as_str() {
            "kalman" => Ok(Box::new(KalmanPointFilter::try_new(KalmanParams {
                process_noise: self.cursor.process_noise,
                measurement_noise: self.cursor.measurement_noise,
                estimated_error: self.cursor.estimated_error,
            })?)),
            "exponential" => Ok(Box::new(ExponentialPointFilter::try_new(self.cursor.exponential_alpha)?)),
            name => create_filter(name),
        }
    }

    #[must_use]
    pub fn throughput_settings(&self) -> ThroughputSettings {
        ThroughputSettings {
            base_interval_ms: self.throughput.base_interval_ms,
            degraded_interval_ms: self.throughput.degraded_interval_ms,
            min_fps: self.throughput.min_fps,
            window_ms: self.throughput.window_ms,
        }
    }

    #[must_use]
    pub fn processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            smoothing_alpha: self.smoothing.alpha,
            pose_presence_score: self.throughput.pose_presence_score,
            keypoint_presence_score: self.gesture.wrist_presence_score,
            staleness_check_ms: self.staleness.check_interval_ms,
            stale_after_ms: self.staleness.stale_after_ms,
            flap_reset_ms: self.gesture.flap_reset_ms,
            jump_cooldown_ms: self.gesture.jump_cooldown_ms,
        }
    }

    /// Build a pose processor from this configuration
    pub fn create_processor(&self) -> Result<PoseProcessor> {
        Ok(PoseProcessor::with_settings(
            self.processor_settings(),
            self.create_filter()?,
            self.detection_mode(),
        ))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.detection.mode.is_empty() && self.detection.mode.parse::<DetectionMode>().is_err() {
            return Err(Error::ConfigError(format!(
                "Unknown detection mode: {} (expected accuracy, balanced or responsive)",
                self.detection.mode
            )));
        }

        if !(0.0..1.0).contains(&self.smoothing.alpha) {
            return Err(Error::ConfigError("Smoothing alpha must be in [0.0, 1.0)".to_string()));
        }

        // Validate cursor filter parameters
        if self.cursor.process_noise < 0.0 || self.cursor.measurement_noise <= 0.0 || self.cursor.estimated_error < 0.0
        {
            return Err(Error::ConfigError(
                "Kalman noise values must be non-negative and measurement noise positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.cursor.exponential_alpha) {
            return Err(Error::ConfigError("Exponential alpha must be in [0.0, 1.0)".to_string()));
        }
        self.create_filter()?;

        // Validate pacing
        if self.throughput.base_interval_ms < 0.0 || self.throughput.degraded_interval_ms < self.throughput.base_interval_ms
        {
            return Err(Error::ConfigError(
                "Degraded interval must be at least the base interval".to_string(),
            ));
        }
        if self.throughput.window_ms <= 0.0 {
            return Err(Error::ConfigError("FPS window must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.throughput.pose_presence_score)
            || !(0.0..=1.0).contains(&self.gesture.wrist_presence_score)
        {
            return Err(Error::ConfigError(
                "Presence scores must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.staleness.check_interval_ms <= 0.0 || self.staleness.stale_after_ms <= 0.0 {
            return Err(Error::ConfigError(
                "Staleness intervals must be greater than 0".to_string(),
            ));
        }

        if self.gesture.flap_reset_ms < 0.0 || self.gesture.jump_cooldown_ms < 0.0 {
            return Err(Error::ConfigError("Gesture timings must not be negative".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Camera Runner Pose Configuration

# Detection cadence: accuracy, balanced or responsive
detection:
  mode: "balanced"

# Skeleton smoothing (weight of the previous frame)
smoothing:
  alpha: 0.3

# Cursor filter: none, kalman or exponential
cursor:
  filter: "kalman"
  process_noise: 2.0
  measurement_noise: 10.0
  estimated_error: 1.0
  exponential_alpha: 0.5

# Detection loop pacing
throughput:
  base_interval_ms: 16.0
  degraded_interval_ms: 22.0
  min_fps: 45.0
  window_ms: 1000.0
  pose_presence_score: 0.1

# Pose loss detection
staleness:
  check_interval_ms: 500.0
  stale_after_ms: 1000.0

# Gesture timing
gesture:
  flap_reset_ms: 1000.0
  jump_cooldown_ms: 650.0
  wrist_presence_score: 0.05

# Stored calibration thresholds
calibration:
  file: null
"#;
