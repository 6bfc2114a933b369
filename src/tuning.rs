//! Detection mode tuning table.
//!
//! Every threshold the scheduler and the gesture state machines consult lives
//! in one immutable [`ModeTuning`] record selected by [`DetectionMode`].
//! Switching modes swaps the record; it never resets running state.

use crate::{
    constants::{DEFAULT_FLAP_RESET_MS, DEFAULT_JUMP_COOLDOWN_MS},
    Error, Result,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Runtime-selectable trade-off between stability and latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Full-body refresh often, strictest gesture thresholds
    Accuracy,
    /// Default trade-off; skips every other frame
    #[default]
    Balanced,
    /// Lowest latency, most permissive gesture thresholds
    Responsive,
}

impl DetectionMode {
    /// All modes in display order
    pub const ALL: [Self; 3] = [Self::Accuracy, Self::Balanced, Self::Responsive];

    /// Mode name as used in configuration files
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::Balanced => "balanced",
            Self::Responsive => "responsive",
        }
    }

    /// Parse a mode name, falling back to `balanced` for unknown names
    #[must_use]
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("Unknown detection mode '{name}', using balanced");
            Self::Balanced
        })
    }

    /// Tuning record for this mode
    #[must_use]
    pub fn tuning(self) -> ModeTuning {
        match self {
            Self::Accuracy => ModeTuning {
                frame_skip: 1,
                pose_refresh_interval: 6,
                jump_window_ms: 280.0,
                flap_velocity_threshold: 220.0,
                flap_cycles: 3,
                pump_threshold: 1.4,
                pump_range: 2.0,
                pump_history_size: 8,
                jump_shoulder_margin: 0.06,
                jump_fallback_threshold: 0.30,
                flap_reset_ms: DEFAULT_FLAP_RESET_MS,
                jump_cooldown_ms: DEFAULT_JUMP_COOLDOWN_MS,
            },
            Self::Balanced => ModeTuning {
                frame_skip: 2,
                pose_refresh_interval: 10,
                jump_window_ms: 320.0,
                flap_velocity_threshold: 200.0,
                flap_cycles: 3,
                pump_threshold: 1.2,
                pump_range: 2.0,
                pump_history_size: 6,
                jump_shoulder_margin: 0.05,
                jump_fallback_threshold: 0.35,
                flap_reset_ms: DEFAULT_FLAP_RESET_MS,
                jump_cooldown_ms: DEFAULT_JUMP_COOLDOWN_MS,
            },
            Self::Responsive => ModeTuning {
                frame_skip: 1,
                pose_refresh_interval: 12,
                jump_window_ms: 400.0,
                flap_velocity_threshold: 180.0,
                flap_cycles: 2,
                pump_threshold: 1.0,
                pump_range: 2.2,
                pump_history_size: 4,
                jump_shoulder_margin: 0.04,
                jump_fallback_threshold: 0.40,
                flap_reset_ms: DEFAULT_FLAP_RESET_MS,
                jump_cooldown_ms: DEFAULT_JUMP_COOLDOWN_MS,
            },
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "accuracy" => Ok(Self::Accuracy),
            "balanced" => Ok(Self::Balanced),
            "responsive" => Ok(Self::Responsive),
            other => Err(Error::InvalidInput(format!("Unknown detection mode: {other}"))),
        }
    }
}

/// Thresholds for one detection mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeTuning {
    /// Run detection on every n-th frame (1 disables skipping)
    pub frame_skip: u32,
    /// Force a full-body pass when `frame_counter % interval == 0`
    pub pose_refresh_interval: u32,
    /// Maximum time between leaving idle height and crossing the jump line
    pub jump_window_ms: f64,
    /// Horizontal wrist speed (px/s) that counts as a flap stroke
    pub flap_velocity_threshold: f64,
    /// Direction flips required before a flap fires
    pub flap_cycles: u32,
    /// Mean vertical wrist speed (normalized units/s) that counts as pumping
    pub pump_threshold: f64,
    /// Speed above the threshold at which the multiplier saturates
    pub pump_range: f64,
    /// Samples kept in the pump velocity history
    pub pump_history_size: usize,
    /// Wrist-over-shoulder margin for the hands-up jump (fraction of height)
    pub jump_shoulder_margin: f64,
    /// Normalized wrist height for the hands-up jump without shoulders
    pub jump_fallback_threshold: f64,
    /// Flap counter decay (ms)
    pub flap_reset_ms: f64,
    /// Hands-up jump cooldown (ms)
    pub jump_cooldown_ms: f64,
}

impl ModeTuning {
    /// Copy of this record with configured timing constants
    #[must_use]
    pub fn with_timing(mut self, flap_reset_ms: f64, jump_cooldown_ms: f64) -> Self {
        self.flap_reset_ms = flap_reset_ms;
        self.jump_cooldown_ms = jump_cooldown_ms;
        self
    }
}

impl Default for ModeTuning {
    fn default() -> Self {
        DetectionMode::default().tuning()
    }
}
