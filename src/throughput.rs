//! Backpressure around the variable-latency detector call.
//!
//! The controller is driven by the display's frame-request cadence: each tick
//! asks [`ThroughputController::try_begin`] whether a detection may be issued.
//! At most one call is ever outstanding, calls are spaced by the current
//! interval, and the interval widens when the achieved rate drops below the
//! target.

use crate::{
    constants::{BASE_FRAME_INTERVAL_MS, DEGRADED_FRAME_INTERVAL_MS, FPS_WINDOW_MS, MIN_TARGET_FPS},
    utils::safe_cast::f64_to_u32_clamp,
};
use log::{debug, error, warn};

/// Interval and rate settings for a [`ThroughputController`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSettings {
    pub base_interval_ms: f64,
    pub degraded_interval_ms: f64,
    pub min_fps: f64,
    pub window_ms: f64,
}

impl Default for ThroughputSettings {
    fn default() -> Self {
        Self {
            base_interval_ms: BASE_FRAME_INTERVAL_MS,
            degraded_interval_ms: DEGRADED_FRAME_INTERVAL_MS,
            min_fps: MIN_TARGET_FPS,
            window_ms: FPS_WINDOW_MS,
        }
    }
}

/// Single-in-flight scheduling gate with adaptive spacing
#[derive(Debug, Clone)]
pub struct ThroughputController {
    settings: ThroughputSettings,
    in_flight: bool,
    last_issued_ms: Option<f64>,
    interval_ms: f64,
    window_start_ms: Option<f64>,
    window_count: u32,
    fps: u32,
}

impl ThroughputController {
    #[must_use]
    pub fn new(settings: ThroughputSettings) -> Self {
        Self {
            in_flight: false,
            last_issued_ms: None,
            interval_ms: settings.base_interval_ms,
            window_start_ms: None,
            window_count: 0,
            fps: 0,
            settings,
        }
    }

    /// Claim the right to issue a detection at `now_ms`.
    ///
    /// Returns `false` while a call is pending or the interval has not yet
    /// elapsed; the caller simply re-polls on its next tick.
    pub fn try_begin(&mut self, now_ms: f64) -> bool {
        if self.in_flight {
            return false;
        }
        if let Some(last) = self.last_issued_ms {
            if now_ms - last < self.interval_ms {
                return false;
            }
        }
        self.in_flight = true;
        self.last_issued_ms = Some(now_ms);
        self.window_start_ms.get_or_insert(now_ms);
        true
    }

    /// Release the in-flight slot once a call has resolved, successfully or
    /// not, and update the rate measurement.
    pub fn finish(&mut self, now_ms: f64) {
        self.in_flight = false;
        self.window_count += 1;

        let window_start = *self.window_start_ms.get_or_insert(now_ms);
        let elapsed = now_ms - window_start;
        if elapsed > self.settings.window_ms {
            let fps = (f64::from(self.window_count) * 1000.0 / elapsed).round();
            self.fps = f64_to_u32_clamp(fps, 0, u32::MAX);
            let degraded = fps < self.settings.min_fps;
            let next = if degraded {
                self.settings.degraded_interval_ms
            } else {
                self.settings.base_interval_ms
            };
            if (next - self.interval_ms).abs() > f64::EPSILON {
                if degraded {
                    warn!("Detection rate {fps} fps below target, widening interval to {next} ms");
                } else {
                    debug!("Detection rate recovered to {fps} fps, interval back to {next} ms");
                }
            }
            self.interval_ms = next;
            self.window_count = 0;
            self.window_start_ms = Some(now_ms);
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Detections per second measured over the last completed window
    #[must_use]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    #[must_use]
    pub fn current_interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Forget all bookkeeping, including a pending call
    pub fn reset(&mut self) {
        *self = Self::new(self.settings);
    }
}

impl Default for ThroughputController {
    fn default() -> Self {
        Self::new(ThroughputSettings::default())
    }
}

/// Callback invoked with each distinct error message
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Reports detector failures once per distinct consecutive message
pub struct ErrorReporter {
    last_message: Option<String>,
    callback: Option<ErrorCallback>,
}

impl ErrorReporter {
    #[must_use]
    pub fn new(callback: Option<ErrorCallback>) -> Self {
        Self {
            last_message: None,
            callback,
        }
    }

    /// Report `message` unless it repeats the previous one.
    ///
    /// Returns whether the message was forwarded.
    pub fn report(&mut self, message: &str) -> bool {
        if self.last_message.as_deref() == Some(message) {
            return false;
        }
        self.last_message = Some(message.to_string());
        error!("Pose detection error: {message}");
        if let Some(callback) = self.callback.as_mut() {
            callback(message);
        }
        true
    }

    /// Forget the last message so the next one is reported again
    pub fn clear(&mut self) {
        self.last_message = None;
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(None)
    }
}
