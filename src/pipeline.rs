//! Per-subject pose processing and the loops that feed it.
//!
//! [`PoseProcessor`] owns everything downstream of the detector: smoothing,
//! the cursor filter, the gesture and pump state machines, hands-up jumps and
//! staleness. It performs exactly one gesture and one pump transition per
//! ingested detection.
//!
//! Two drivers sit on top of it:
//! - [`PoseTracker`] runs the scheduler synchronously inside each tick;
//! - [`WorkerTracker`] hands frames to a [`DetectionWorker`] thread and
//!   collects its replies on later ticks.
//!
//! Both gate detection through a [`ThroughputController`] so that only one
//! call is ever outstanding.

use crate::{
    calibration::PoseThresholds,
    constants::{
        DEFAULT_FLAP_RESET_MS, DEFAULT_JUMP_COOLDOWN_MS, EMA_ALPHA, KEYPOINT_PRESENCE_SCORE, POSE_PRESENCE_SCORE,
        STALENESS_CHECK_INTERVAL_MS, STALE_AFTER_MS,
    },
    detection::{BodyDetector, Detection, Frame, HandDetector, HybridScheduler},
    filters::{kalman::KalmanPointFilter, smooth_skeleton, PointFilter},
    gesture::{update_gesture, Gesture, GestureInput, GestureState, HandsUpDetector, HandsUpInput},
    keypoint::{normalize_y, KeypointName, Skeleton},
    pump::{update_pump_state, PumpInput, PumpState},
    staleness::StalenessDetector,
    throughput::{ErrorCallback, ErrorReporter, ThroughputController, ThroughputSettings},
    tuning::{DetectionMode, ModeTuning},
    worker::{DetectionWorker, WorkerMessage},
    Result,
};
use log::{debug, info};

/// Everything the consumer sees after one sample
#[derive(Debug, Clone, PartialEq)]
pub struct PoseOutput {
    pub timestamp: f64,
    /// EMA-smoothed skeleton in pixel coordinates
    pub skeleton: Skeleton,
    pub has_pose: bool,
    pub has_wrist: bool,
    pub wrist_normalized_y: f64,
    /// Filtered position of the best wrist, when one is visible
    pub cursor: Option<(f64, f64)>,
    pub gesture: Gesture,
    /// Both hands raised (with cooldown)
    pub jump_active: bool,
    pub pump_active: bool,
    pub speed_multiplier: f64,
    pub is_pose_stale: bool,
    pub fps: u32,
}

/// Tunables of a [`PoseProcessor`] that do not depend on the detection mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorSettings {
    pub smoothing_alpha: f64,
    /// Minimum max-score for a detection to count as a pose
    pub pose_presence_score: f32,
    /// Minimum score for a single wrist or shoulder to count as observed
    pub keypoint_presence_score: f32,
    pub staleness_check_ms: f64,
    pub stale_after_ms: f64,
    pub flap_reset_ms: f64,
    pub jump_cooldown_ms: f64,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            smoothing_alpha: EMA_ALPHA,
            pose_presence_score: POSE_PRESENCE_SCORE,
            keypoint_presence_score: KEYPOINT_PRESENCE_SCORE,
            staleness_check_ms: STALENESS_CHECK_INTERVAL_MS,
            stale_after_ms: STALE_AFTER_MS,
            flap_reset_ms: DEFAULT_FLAP_RESET_MS,
            jump_cooldown_ms: DEFAULT_JUMP_COOLDOWN_MS,
        }
    }
}

/// Detector-agnostic state for one tracked subject
pub struct PoseProcessor {
    settings: ProcessorSettings,
    mode: DetectionMode,
    tuning: ModeTuning,
    thresholds: Option<PoseThresholds>,
    filter: Box<dyn PointFilter>,
    last_smoothed: Option<Skeleton>,
    gesture: GestureState,
    pump: PumpState,
    hands_up: HandsUpDetector,
    staleness: StalenessDetector,
}

impl PoseProcessor {
    /// Processor with default settings and a Kalman cursor filter
    #[must_use]
    pub fn new(mode: DetectionMode) -> Self {
        Self::with_settings(ProcessorSettings::default(), Box::new(KalmanPointFilter::default()), mode)
    }

    #[must_use]
    pub fn with_settings(settings: ProcessorSettings, filter: Box<dyn PointFilter>, mode: DetectionMode) -> Self {
        Self {
            tuning: mode.tuning().with_timing(settings.flap_reset_ms, settings.jump_cooldown_ms),
            mode,
            thresholds: None,
            filter,
            last_smoothed: None,
            gesture: GestureState::default(),
            pump: PumpState::default(),
            hands_up: HandsUpDetector::new(),
            staleness: StalenessDetector::new(settings.staleness_check_ms, settings.stale_after_ms),
            settings,
        }
    }

    /// Feed one detection taken at `timestamp` from a frame `frame_height`
    /// pixels tall.
    pub fn ingest(&mut self, detection: &Detection, frame_height: u32, timestamp: f64) -> PoseOutput {
        let height = f64::from(frame_height.max(1));
        let presence = self.settings.keypoint_presence_score;

        let skeleton = smooth_skeleton(self.last_smoothed.as_ref(), &detection.skeleton, self.settings.smoothing_alpha);
        self.last_smoothed = Some(skeleton.clone());

        self.staleness.mark_pose(timestamp);
        let is_pose_stale = self.staleness.is_stale();
        let has_pose = detection.max_score > self.settings.pose_presence_score;

        let wrist = *skeleton.best_wrist();
        let has_wrist = wrist.score > presence;
        let wrist_normalized_y = if has_wrist { normalize_y(wrist.y, height) } else { 0.0 };
        let cursor = has_wrist.then(|| self.filter.apply(wrist.x, wrist.y));

        let shoulder = skeleton.best_shoulder();
        let shoulder_y = if shoulder.score > presence { normalize_y(shoulder.y, height) } else { 0.0 };

        let gesture = update_gesture(
            std::mem::take(&mut self.gesture),
            &GestureInput {
                wrist_y: wrist_normalized_y,
                wrist_x: wrist.x,
                shoulder_y,
                thresholds: self.thresholds,
                has_pose,
                has_wrist,
                timestamp,
            },
            &self.tuning,
        );
        self.gesture = gesture.state;

        let left_wrist = skeleton.get(KeypointName::LeftWrist);
        let right_wrist = skeleton.get(KeypointName::RightWrist);
        let left_shoulder = skeleton.get(KeypointName::LeftShoulder);
        let right_shoulder = skeleton.get(KeypointName::RightShoulder);
        let has_wrists = left_wrist.score > presence && right_wrist.score > presence;
        let has_shoulders = left_shoulder.score > presence && right_shoulder.score > presence;

        let pump = update_pump_state(
            std::mem::take(&mut self.pump),
            &PumpInput {
                left_wrist_y: normalize_y(left_wrist.y, height),
                right_wrist_y: normalize_y(right_wrist.y, height),
                has_pose,
                has_wrists,
                timestamp,
            },
            &self.tuning,
        );
        self.pump = pump.state;

        let jump_active = self.hands_up.update(
            &HandsUpInput {
                left_wrist_y: left_wrist.y,
                right_wrist_y: right_wrist.y,
                left_shoulder_y: left_shoulder.y,
                right_shoulder_y: right_shoulder.y,
                has_wrists: has_pose && has_wrists,
                has_shoulders,
                frame_height: height,
                timestamp,
            },
            &self.tuning,
        );

        if gesture.gesture != Gesture::Idle {
            debug!("Gesture {} at {:.0} ms", gesture.gesture, timestamp);
        }

        PoseOutput {
            timestamp,
            skeleton,
            has_pose,
            has_wrist,
            wrist_normalized_y,
            cursor,
            gesture: gesture.gesture,
            jump_active,
            pump_active: pump.pump_active,
            speed_multiplier: pump.speed_multiplier,
            is_pose_stale,
            fps: 0,
        }
    }

    /// Run the periodic staleness check without a new sample.
    ///
    /// Going stale drops the gesture and pump state the same way a lost
    /// pose does; the last skeleton stays cached.
    pub fn poll_staleness(&mut self, now_ms: f64) -> bool {
        let was_stale = self.staleness.is_stale();
        let stale = self.staleness.poll(now_ms);
        if stale && !was_stale {
            self.gesture = GestureState::new(now_ms);
            self.pump = PumpState::new(now_ms);
        }
        stale
    }

    #[must_use]
    pub fn is_pose_stale(&self) -> bool {
        self.staleness.is_stale()
    }

    /// Switch tolerances; gesture and pump state carry over
    pub fn set_mode(&mut self, mode: DetectionMode) {
        if mode != self.mode {
            info!("Gesture tuning switched from {} to {}", self.mode, mode);
        }
        self.mode = mode;
        self.tuning = mode
            .tuning()
            .with_timing(self.settings.flap_reset_ms, self.settings.jump_cooldown_ms);
    }

    #[must_use]
    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    #[must_use]
    pub fn tuning(&self) -> &ModeTuning {
        &self.tuning
    }

    /// Use calibrated thresholds, or shoulder-relative fallbacks for `None`
    pub fn set_thresholds(&mut self, thresholds: Option<PoseThresholds>) {
        self.thresholds = thresholds;
    }

    #[must_use]
    pub fn thresholds(&self) -> Option<&PoseThresholds> {
        self.thresholds.as_ref()
    }

    #[must_use]
    pub fn gesture_state(&self) -> &GestureState {
        &self.gesture
    }

    #[must_use]
    pub fn pump_state(&self) -> &PumpState {
        &self.pump
    }

    #[must_use]
    pub fn last_skeleton(&self) -> Option<&Skeleton> {
        self.last_smoothed.as_ref()
    }

    /// Drop all per-subject state so the next sample starts from scratch
    pub fn reset(&mut self) {
        self.filter.reset();
        self.last_smoothed = None;
        self.gesture = GestureState::default();
        self.pump = PumpState::default();
        self.hands_up.reset();
        self.staleness.reset();
    }
}

/// Cooperative driver: detection runs inside [`PoseTracker::tick`]
pub struct PoseTracker<H, B> {
    scheduler: HybridScheduler<H, B>,
    throughput: ThroughputController,
    processor: PoseProcessor,
    reporter: ErrorReporter,
    enabled: bool,
}

impl<H: HandDetector, B: BodyDetector> PoseTracker<H, B> {
    pub fn new(scheduler: HybridScheduler<H, B>, processor: PoseProcessor, settings: ThroughputSettings) -> Self {
        Self {
            scheduler,
            throughput: ThroughputController::new(settings),
            processor,
            reporter: ErrorReporter::default(),
            enabled: true,
        }
    }

    /// Forward distinct detector failures to `callback`
    pub fn set_error_callback(&mut self, callback: ErrorCallback) {
        self.reporter = ErrorReporter::new(Some(callback));
    }

    /// Called once per display tick.
    ///
    /// Returns a new output only when a detection was issued and succeeded on
    /// this tick. Failures are never propagated: an uninitialized detector is
    /// retried on the next tick and other errors are reported once.
    pub fn tick(&mut self, now_ms: f64, frame: &Frame) -> Option<PoseOutput> {
        if !self.enabled {
            return None;
        }
        if !self.throughput.try_begin(now_ms) {
            self.processor.poll_staleness(now_ms);
            return None;
        }

        let result = if self.scheduler.is_ready() {
            self.scheduler.detect(frame)
        } else {
            self.scheduler.initialize().and_then(|()| self.scheduler.detect(frame))
        };
        self.throughput.finish(now_ms);

        match result {
            Ok(detection) => {
                let mut output = self.processor.ingest(&detection, frame.height(), now_ms);
                output.fps = self.throughput.fps();
                Some(output)
            }
            Err(e) if e.is_retryable() => {
                debug!("Detector not ready: {e}");
                self.processor.poll_staleness(now_ms);
                None
            }
            Err(e) => {
                self.reporter.report(&e.to_string());
                self.processor.poll_staleness(now_ms);
                None
            }
        }
    }

    /// Enable or disable tracking.
    ///
    /// Disabling tears down filter state, the detector cache and in-flight
    /// bookkeeping before returning, so re-enabling starts clean.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.processor.reset();
            self.scheduler.reset();
            self.throughput.reset();
            self.reporter.clear();
        }
        info!("Pose tracking {}", if enabled { "enabled" } else { "disabled" });
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Change cadence and tolerances without resetting counters
    pub fn set_mode(&mut self, mode: DetectionMode) {
        self.scheduler.update_mode(mode);
        self.processor.set_mode(mode);
    }

    #[must_use]
    pub fn fps(&self) -> u32 {
        self.throughput.fps()
    }

    #[must_use]
    pub fn throughput(&self) -> &ThroughputController {
        &self.throughput
    }

    #[must_use]
    pub fn scheduler(&self) -> &HybridScheduler<H, B> {
        &self.scheduler
    }

    #[must_use]
    pub fn processor(&self) -> &PoseProcessor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut PoseProcessor {
        &mut self.processor
    }
}

/// Threaded driver: detection runs on a [`DetectionWorker`]
pub struct WorkerTracker {
    worker: DetectionWorker,
    throughput: ThroughputController,
    processor: PoseProcessor,
    reporter: ErrorReporter,
    pending_height: Option<u32>,
    /// A reply requested before the last reset is still on its way
    discard_next: bool,
}

impl WorkerTracker {
    #[must_use]
    pub fn new(worker: DetectionWorker, processor: PoseProcessor, settings: ThroughputSettings) -> Self {
        Self {
            worker,
            throughput: ThroughputController::new(settings),
            processor,
            reporter: ErrorReporter::default(),
            pending_height: None,
            discard_next: false,
        }
    }

    pub fn set_error_callback(&mut self, callback: ErrorCallback) {
        self.reporter = ErrorReporter::new(Some(callback));
    }

    /// Called once per display tick: collect any finished detection, then
    /// submit `frame` if the throughput gate allows it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WorkerDisconnected`] if the worker thread has
    /// gone away.
    pub fn pump_worker(&mut self, now_ms: f64, frame: &Frame) -> Result<Option<PoseOutput>> {
        let mut output = None;
        while let Some(message) = self.worker.try_recv()? {
            if self.discard_next {
                self.discard_next = false;
                debug!("Dropping detection requested before reset");
                continue;
            }
            self.throughput.finish(now_ms);
            let height = self.pending_height.take().unwrap_or_else(|| frame.height());
            match message {
                WorkerMessage::Pose { detection, timestamp } => {
                    let mut next = self.processor.ingest(&detection, height, timestamp);
                    next.fps = self.throughput.fps();
                    output = Some(next);
                }
                WorkerMessage::Error { message, retryable: true } => {
                    debug!("Detector not ready: {message}");
                }
                WorkerMessage::Error { message, retryable: false } => {
                    self.reporter.report(&message);
                }
            }
        }

        if output.is_none() {
            self.processor.poll_staleness(now_ms);
        }

        if !self.discard_next && self.throughput.try_begin(now_ms) {
            self.pending_height = Some(frame.height());
            self.worker.submit(frame.clone(), now_ms)?;
        }

        Ok(output)
    }

    /// Change cadence and tolerances on both sides of the channel
    pub fn set_mode(&mut self, mode: DetectionMode) -> Result<()> {
        self.worker.update_mode(mode)?;
        self.processor.set_mode(mode);
        Ok(())
    }

    /// Clear per-subject and worker-side state.
    ///
    /// A reply still in flight is discarded when it arrives.
    pub fn reset(&mut self) -> Result<()> {
        self.worker.reset()?;
        let mut outstanding = self.throughput.in_flight() || self.discard_next;
        while self.worker.try_recv()?.is_some() {
            outstanding = false;
        }
        self.discard_next = outstanding;
        self.pending_height = None;
        self.throughput.reset();
        self.processor.reset();
        self.reporter.clear();
        Ok(())
    }

    /// Whether a frame has been submitted and its reply not yet collected
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.throughput.in_flight() || self.discard_next
    }

    #[must_use]
    pub fn processor(&self) -> &PoseProcessor {
        &self.processor
    }

    /// Stop the worker thread
    pub fn shutdown(self) {
        self.worker.shutdown();
    }
}
