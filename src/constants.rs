//! Constants used throughout the pipeline

/// Default exponential moving average weight given to the previous skeleton
pub const EMA_ALPHA: f64 = 0.3;

/// Fraction of the frame height (from the top) handed to the detectors
pub const ROI_HEIGHT_FRACTION: f64 = 0.6;

/// Confidence assigned to a wrist taken from the hand detector when the
/// landmark carries no visibility
pub const HAND_WRIST_CONFIDENCE: f32 = 0.9;

/// `maxScore` above which a detection counts as a pose
pub const POSE_PRESENCE_SCORE: f32 = 0.1;

/// Score above which a single keypoint counts as observed
pub const KEYPOINT_PRESENCE_SCORE: f32 = 0.05;

/// Fallback idle margin below the shoulder when uncalibrated
pub const FALLBACK_IDLE_MARGIN: f64 = 0.1;

/// Fallback jump margin above the shoulder when uncalibrated
pub const FALLBACK_JUMP_MARGIN: f64 = 0.05;

/// Minimum gap enforced between calibrated idle and jump thresholds
pub const THRESHOLD_SEPARATION: f64 = 0.05;

/// Minimum elapsed time used for velocity computations (ms)
pub const MIN_VELOCITY_DT_MS: f64 = 1.0;

/// Flap cycle counter decays after this long without a direction flip (ms)
pub const DEFAULT_FLAP_RESET_MS: f64 = 1000.0;

/// Minimum time between two hands-up jumps (ms)
pub const DEFAULT_JUMP_COOLDOWN_MS: f64 = 650.0;

/// Upper bound of the pump speed multiplier
pub const MAX_SPEED_MULTIPLIER: f64 = 2.4;

/// Detection interval at display refresh cadence (ms)
pub const BASE_FRAME_INTERVAL_MS: f64 = 16.0;

/// Detection interval once the device cannot keep up (ms)
pub const DEGRADED_FRAME_INTERVAL_MS: f64 = 22.0;

/// Achieved detections per second below which the interval is widened
pub const MIN_TARGET_FPS: f64 = 45.0;

/// Length of the fps measurement window (ms)
pub const FPS_WINDOW_MS: f64 = 1000.0;

/// Period of the staleness check (ms)
pub const STALENESS_CHECK_INTERVAL_MS: f64 = 500.0;

/// Gap after which the last pose is considered stale (ms)
pub const STALE_AFTER_MS: f64 = 1000.0;

/// Default process noise of the cursor Kalman filter
pub const DEFAULT_KALMAN_PROCESS_NOISE: f64 = 2.0;

/// Default measurement noise of the cursor Kalman filter
pub const DEFAULT_KALMAN_MEASUREMENT_NOISE: f64 = 10.0;

/// Default initial error covariance of the cursor Kalman filter
pub const DEFAULT_KALMAN_ESTIMATED_ERROR: f64 = 1.0;
