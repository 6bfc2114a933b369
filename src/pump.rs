//! Arm-pumping cadence as a continuous speed signal.

use crate::{constants::MAX_SPEED_MULTIPLIER, tuning::ModeTuning, utils::velocity_per_second};
use std::collections::VecDeque;

/// Rolling wrist velocity history
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PumpState {
    pub last_timestamp: f64,
    pub last_left_y: Option<f64>,
    pub last_right_y: Option<f64>,
    /// Mean absolute vertical velocity of both wrists per sample, oldest first
    pub velocity_history: VecDeque<f64>,
}

impl PumpState {
    #[must_use]
    pub fn new(timestamp: f64) -> Self {
        Self {
            last_timestamp: timestamp,
            ..Self::default()
        }
    }
}

/// Both wrists' normalized heights for one sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PumpInput {
    pub left_wrist_y: f64,
    pub right_wrist_y: f64,
    pub has_pose: bool,
    pub has_wrists: bool,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PumpUpdate {
    pub state: PumpState,
    pub pump_active: bool,
    /// In `[1, MAX_SPEED_MULTIPLIER]`
    pub speed_multiplier: f64,
    pub average_velocity: f64,
}

/// Advance the cadence detector by one sample.
///
/// The first sample after a reset only records the wrist positions.
#[must_use]
pub fn update_pump_state(state: PumpState, input: &PumpInput, tuning: &ModeTuning) -> PumpUpdate {
    if !input.has_pose || !input.has_wrists {
        return PumpUpdate {
            state: PumpState::new(input.timestamp),
            pump_active: false,
            speed_multiplier: 1.0,
            average_velocity: 0.0,
        };
    }

    let mut next = state;
    if let (Some(left), Some(right)) = (next.last_left_y, next.last_right_y) {
        let dt = input.timestamp - next.last_timestamp;
        let left_velocity = velocity_per_second(input.left_wrist_y - left, dt).abs();
        let right_velocity = velocity_per_second(input.right_wrist_y - right, dt).abs();
        let velocity = (left_velocity + right_velocity) / 2.0;
        if velocity.is_finite() {
            next.velocity_history.push_back(velocity);
        }
        while next.velocity_history.len() > tuning.pump_history_size.max(1) {
            next.velocity_history.pop_front();
        }
    }
    next.last_timestamp = input.timestamp;
    next.last_left_y = Some(input.left_wrist_y);
    next.last_right_y = Some(input.right_wrist_y);

    let average_velocity = if next.velocity_history.is_empty() {
        0.0
    } else {
        next.velocity_history.iter().sum::<f64>() / next.velocity_history.len() as f64
    };

    PumpUpdate {
        state: next,
        pump_active: average_velocity > tuning.pump_threshold,
        speed_multiplier: speed_multiplier(average_velocity, tuning),
        average_velocity,
    }
}

/// Linear ramp from 1 at the threshold up to the cap one `pump_range` beyond it
#[must_use]
pub fn speed_multiplier(average_velocity: f64, tuning: &ModeTuning) -> f64 {
    let range = if tuning.pump_range > 0.0 { tuning.pump_range } else { 1.0 };
    let ramp = ((average_velocity - tuning.pump_threshold) / range).clamp(0.0, 1.0);
    if ramp.is_nan() {
        return 1.0;
    }
    1.0 + ramp * (MAX_SPEED_MULTIPLIER - 1.0)
}
