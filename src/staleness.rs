//! Detects when pose samples have stopped arriving.

use crate::constants::{STALENESS_CHECK_INTERVAL_MS, STALE_AFTER_MS};
use log::{debug, warn};

/// Periodic check of the time since the last produced pose.
///
/// The check only runs once per `check_interval_ms`; between checks the
/// previous verdict is kept. A new pose clears the flag immediately.
#[derive(Debug, Clone)]
pub struct StalenessDetector {
    check_interval_ms: f64,
    stale_after_ms: f64,
    last_pose_ms: Option<f64>,
    last_check_ms: Option<f64>,
    stale: bool,
}

impl StalenessDetector {
    #[must_use]
    pub fn new(check_interval_ms: f64, stale_after_ms: f64) -> Self {
        Self {
            check_interval_ms,
            stale_after_ms,
            last_pose_ms: None,
            last_check_ms: None,
            stale: false,
        }
    }

    /// Record a successfully produced pose sample
    pub fn mark_pose(&mut self, now_ms: f64) {
        if self.stale {
            debug!("Pose stream resumed at {now_ms:.0} ms");
        }
        self.last_pose_ms = Some(now_ms);
        self.stale = false;
    }

    /// Run the check if it is due and return the current verdict
    pub fn poll(&mut self, now_ms: f64) -> bool {
        let due = self
            .last_check_ms
            .map_or(true, |last| now_ms - last >= self.check_interval_ms);
        if !due {
            return self.stale;
        }
        self.last_check_ms = Some(now_ms);

        let stale = self
            .last_pose_ms
            .is_some_and(|last| now_ms - last > self.stale_after_ms);
        if stale && !self.stale {
            warn!("No pose for more than {} ms", self.stale_after_ms);
        }
        self.stale = stale;
        self.stale
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.check_interval_ms, self.stale_after_ms);
    }
}

impl Default for StalenessDetector {
    fn default() -> Self {
        Self::new(STALENESS_CHECK_INTERVAL_MS, STALE_AFTER_MS)
    }
}
