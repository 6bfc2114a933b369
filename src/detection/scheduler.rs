use super::{skeleton_from_body, BodyDetector, Detection, Frame, HandDetector, RoiCropper};
use crate::{keypoint::Skeleton, tuning::DetectionMode, Error, Result};
use log::{debug, info};

/// Results the scheduler reuses between frames
#[derive(Debug, Clone, Default)]
pub struct DetectorCache {
    /// Output of the last detector invocation, replayed on skipped frames
    pub last_result: Option<Detection>,
    /// Last skeleton produced by the full-body detector
    pub last_full_body: Option<Skeleton>,
    /// Frames seen since the last reset
    pub frame_counter: u64,
}

/// Decides per frame which detector tier to run and fuses their output.
///
/// The cheap hand detector runs on most frames and only refreshes the wrists
/// of the last full-body skeleton; the body detector runs whenever no hands
/// are found or a periodic refresh is due.
pub struct HybridScheduler<H, B> {
    hands: H,
    body: B,
    roi: RoiCropper,
    cache: DetectorCache,
    frame_skip: u32,
    pose_refresh_interval: u32,
}

impl<H: HandDetector, B: BodyDetector> HybridScheduler<H, B> {
    pub fn new(hands: H, body: B, mode: DetectionMode) -> Self {
        let tuning = mode.tuning();
        Self {
            hands,
            body,
            roi: RoiCropper::new(),
            cache: DetectorCache::default(),
            frame_skip: tuning.frame_skip.max(1),
            pose_refresh_interval: tuning.pose_refresh_interval.max(1),
        }
    }

    /// Initialize both back-ends
    ///
    /// # Errors
    ///
    /// Propagates the first initialization failure; the caller may retry.
    pub fn initialize(&mut self) -> Result<()> {
        self.hands.initialize()?;
        self.body.initialize()?;
        info!("Hand and body detectors initialized");
        Ok(())
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.hands.is_ready() && self.body.is_ready()
    }

    /// Switch skip/refresh cadence without touching counters or caches
    pub fn update_mode(&mut self, mode: DetectionMode) {
        let tuning = mode.tuning();
        self.frame_skip = tuning.frame_skip.max(1);
        self.pose_refresh_interval = tuning.pose_refresh_interval.max(1);
        debug!(
            "Scheduler mode {mode}: skip every {}, full refresh every {}",
            self.frame_skip, self.pose_refresh_interval
        );
    }

    /// Drop cached results and restart the frame counter
    pub fn reset(&mut self) {
        self.cache = DetectorCache::default();
    }

    #[must_use]
    pub fn frame_counter(&self) -> u64 {
        self.cache.frame_counter
    }

    #[must_use]
    pub fn cache(&self) -> &DetectorCache {
        &self.cache
    }

    /// Result replayed on skipped frames
    #[must_use]
    pub fn cached_result(&self) -> Option<&Detection> {
        self.cache.last_result.as_ref()
    }

    #[must_use]
    pub fn frame_skip(&self) -> u32 {
        self.frame_skip
    }

    #[must_use]
    pub fn pose_refresh_interval(&self) -> u32 {
        self.pose_refresh_interval
    }

    /// Produce a detection for one frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DetectorUnavailable`] while either back-end is not
    /// ready (counters are left untouched) and propagates inference failures.
    pub fn detect(&mut self, frame: &Frame) -> Result<Detection> {
        if !self.is_ready() {
            return Err(Error::DetectorUnavailable(
                "hand or body detector not initialized".to_string(),
            ));
        }

        let position = self.cache.frame_counter;
        self.cache.frame_counter += 1;
        if position % u64::from(self.frame_skip) != 0 {
            if let Some(cached) = &self.cache.last_result {
                return Ok(cached.clone());
            }
        }

        let roi = self.roi.crop(frame);
        let (width, height) = roi.dimensions();

        let hands = self.hands.detect(roi)?;
        let refresh_due = self.cache.frame_counter % u64::from(self.pose_refresh_interval) == 0;

        let detection = if !hands.is_empty() && !refresh_due {
            let mut skeleton = self.cache.last_full_body.clone().unwrap_or_default();
            for wrist in hands.iter().filter_map(|hand| hand.wrist_keypoint(width, height)) {
                skeleton.set(wrist);
            }
            debug!("Fast path: {} hand(s) on frame {}", hands.len(), position);
            Detection::new(skeleton)
        } else {
            let landmarks = self.body.detect(roi)?.unwrap_or_default();
            let skeleton = skeleton_from_body(&landmarks, width, height);
            self.cache.last_full_body = Some(skeleton.clone());
            debug!("Full-body path on frame {position} (refresh due: {refresh_due})");
            Detection::new(skeleton)
        };

        self.cache.last_result = Some(detection.clone());
        Ok(detection)
    }
}
