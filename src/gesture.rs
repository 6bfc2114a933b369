//! Jump and flap gesture classification.
//!
//! [`update_gesture`] is a pure transition function: it takes the previous
//! [`GestureState`] by value and returns the next one together with the
//! emitted [`Gesture`]. Callers own the state between samples and decide how
//! to publish events.
//!
//! Vertical positions are normalized against the frame height with 0 at the
//! top, so "raising" a hand means its Y value decreases. Timestamps are in
//! milliseconds and must be non-decreasing across calls; out-of-order
//! timestamps are not defended against.

use crate::{
    calibration::{resolve_thresholds, PoseThresholds},
    tuning::ModeTuning,
    utils::{direction, velocity_per_second},
};
use log::debug;
use std::fmt;

/// Discrete event emitted per sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Jump,
    Flap,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Jump => "jump",
            Self::Flap => "flap",
        })
    }
}

/// Phase of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureMode {
    #[default]
    Idle,
    /// Wrist between idle and jump height
    Raising,
    /// Jump fired and the wrist has not come back down yet
    Jump,
    /// Horizontal strokes are being counted
    Flapping,
}

/// Classifier memory carried between samples
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    pub mode: GestureMode,
    pub last_timestamp: f64,
    /// Last time the wrist was strictly below idle height (y past the idle threshold)
    pub last_above_idle_time: Option<f64>,
    pub last_wrist_x: Option<f64>,
    /// Direction of the last stroke fast enough to count (-1, 0 or 1)
    pub last_velocity_sign: i8,
    /// Direction flips counted towards a flap
    pub flap_cycles: u32,
    pub last_flap_time: f64,
}

impl GestureState {
    #[must_use]
    pub fn new(timestamp: f64) -> Self {
        Self {
            mode: GestureMode::Idle,
            last_timestamp: timestamp,
            last_above_idle_time: None,
            last_wrist_x: None,
            last_velocity_sign: 0,
            flap_cycles: 0,
            last_flap_time: timestamp,
        }
    }

    /// State after losing the subject: idle with nothing latched
    fn lost(timestamp: f64) -> Self {
        Self::new(timestamp)
    }
}

impl Default for GestureState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// One pose sample as seen by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureInput {
    /// Normalized wrist height (0 = top of frame)
    pub wrist_y: f64,
    /// Wrist column in pixels
    pub wrist_x: f64,
    /// Normalized shoulder height, used when uncalibrated
    pub shoulder_y: f64,
    pub thresholds: Option<PoseThresholds>,
    pub has_pose: bool,
    pub has_wrist: bool,
    pub timestamp: f64,
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq)]
pub struct GestureUpdate {
    pub state: GestureState,
    pub gesture: Gesture,
}

/// Advance the classifier by one sample.
#[must_use]
pub fn update_gesture(state: GestureState, input: &GestureInput, tuning: &ModeTuning) -> GestureUpdate {
    if !input.has_pose || !input.has_wrist {
        return GestureUpdate {
            state: GestureState::lost(input.timestamp),
            gesture: Gesture::Idle,
        };
    }

    let now = input.timestamp;
    let velocity_x = state
        .last_wrist_x
        .map_or(0.0, |last_x| velocity_per_second(input.wrist_x - last_x, now - state.last_timestamp));

    let mut next = GestureState {
        last_timestamp: now,
        last_wrist_x: Some(input.wrist_x),
        ..state
    };

    if next.flap_cycles > 0 && now - next.last_flap_time > tuning.flap_reset_ms {
        next.flap_cycles = 0;
        next.last_velocity_sign = 0;
    }

    let Some((idle, jump)) = resolve_thresholds(input.thresholds.as_ref(), input.shoulder_y) else {
        next.mode = GestureMode::Idle;
        return GestureUpdate {
            state: next,
            gesture: Gesture::Idle,
        };
    };

    if input.wrist_y > idle {
        next.last_above_idle_time = Some(now);
    }

    let recently_idle = next
        .last_above_idle_time
        .is_some_and(|t| now - t <= tuning.jump_window_ms);

    if input.wrist_y <= jump {
        if state.mode != GestureMode::Jump && recently_idle {
            debug!("Jump: wrist {:.3} crossed {:.3}", input.wrist_y, jump);
            next.mode = GestureMode::Jump;
            next.flap_cycles = 0;
            next.last_velocity_sign = 0;
            return GestureUpdate {
                state: next,
                gesture: Gesture::Jump,
            };
        }
        if state.mode != GestureMode::Jump {
            next.mode = GestureMode::Idle;
        }
        return GestureUpdate {
            state: next,
            gesture: Gesture::Idle,
        };
    }

    if input.wrist_y < idle {
        next.mode = GestureMode::Raising;
        return GestureUpdate {
            state: next,
            gesture: Gesture::Idle,
        };
    }

    let mut gesture = Gesture::Idle;
    if velocity_x.abs() > tuning.flap_velocity_threshold {
        let sign = direction(velocity_x);
        if sign != next.last_velocity_sign {
            if next.last_velocity_sign != 0 {
                next.flap_cycles += 1;
                next.last_flap_time = now;
                if next.flap_cycles >= tuning.flap_cycles {
                    debug!("Flap after {} direction changes", next.flap_cycles);
                    gesture = Gesture::Flap;
                }
            } else {
                next.last_flap_time = now;
            }
            next.last_velocity_sign = sign;
        }
    }

    next.mode = if next.flap_cycles > 0 {
        GestureMode::Flapping
    } else {
        GestureMode::Idle
    };

    GestureUpdate { state: next, gesture }
}

/// Both-wrists-up jump detector with a cooldown.
///
/// Fires when both wrists are raised above their shoulders by a margin of the
/// frame height or, if the shoulders are not visible, above a fixed normalized
/// height.
#[derive(Debug, Clone, Default)]
pub struct HandsUpDetector {
    last_jump_time: Option<f64>,
}

/// Pixel-space wrist and shoulder rows for the hands-up check
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandsUpInput {
    pub left_wrist_y: f64,
    pub right_wrist_y: f64,
    pub left_shoulder_y: f64,
    pub right_shoulder_y: f64,
    pub has_wrists: bool,
    pub has_shoulders: bool,
    pub frame_height: f64,
    pub timestamp: f64,
}

impl HandsUpDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a hands-up jump is active for this sample
    pub fn update(&mut self, input: &HandsUpInput, tuning: &ModeTuning) -> bool {
        if !input.has_wrists {
            return false;
        }

        let height = if input.frame_height > 0.0 { input.frame_height } else { 1.0 };
        let hands_up = if input.has_shoulders {
            let margin = height * tuning.jump_shoulder_margin;
            input.left_wrist_y < input.left_shoulder_y - margin && input.right_wrist_y < input.right_shoulder_y - margin
        } else {
            let left = crate::keypoint::normalize_y(input.left_wrist_y, height);
            let right = crate::keypoint::normalize_y(input.right_wrist_y, height);
            left < tuning.jump_fallback_threshold && right < tuning.jump_fallback_threshold
        };

        let cooled_down = self
            .last_jump_time
            .map_or(true, |t| input.timestamp - t > tuning.jump_cooldown_ms);

        if hands_up && cooled_down {
            self.last_jump_time = Some(input.timestamp);
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.last_jump_time = None;
    }
}
