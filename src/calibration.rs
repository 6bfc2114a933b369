//! Calibrated wrist thresholds and their persistence.

use crate::{
    constants::{FALLBACK_IDLE_MARGIN, FALLBACK_JUMP_MARGIN, THRESHOLD_SEPARATION},
    Error, Result,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-user wrist heights, both normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseThresholds {
    /// Resting wrist height
    pub idle_threshold: f64,
    /// Height a wrist must reach to count as a jump
    pub jump_threshold: f64,
}

impl PoseThresholds {
    #[must_use]
    pub fn new(idle_threshold: f64, jump_threshold: f64) -> Self {
        Self {
            idle_threshold,
            jump_threshold,
        }
    }

    /// Check that both thresholds are finite and inside [0, 1]
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("idleThreshold", self.idle_threshold), ("jumpThreshold", self.jump_threshold)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::Calibration(format!("{name} must be between 0.0 and 1.0, got {value}")));
            }
        }
        Ok(())
    }
}

/// Idle and jump heights to classify against.
///
/// Calibrated thresholds win when both are positive; the jump height is kept
/// at least [`THRESHOLD_SEPARATION`] above the idle height. Otherwise the
/// heights fall back to fixed margins around a visible shoulder. Returns
/// `None` when neither source is usable.
#[must_use]
pub fn resolve_thresholds(calibrated: Option<&PoseThresholds>, shoulder_y: f64) -> Option<(f64, f64)> {
    if let Some(thresholds) = calibrated {
        if thresholds.idle_threshold > 0.0 && thresholds.jump_threshold > 0.0 {
            let idle = thresholds.idle_threshold;
            let jump = thresholds.jump_threshold.min(idle - THRESHOLD_SEPARATION);
            return Some((idle, jump));
        }
    }

    if shoulder_y.is_finite() && shoulder_y > 0.0 {
        return Some((shoulder_y + FALLBACK_IDLE_MARGIN, shoulder_y - FALLBACK_JUMP_MARGIN));
    }

    None
}

/// Persistence for calibrated thresholds
pub trait ThresholdStore {
    /// Stored thresholds, or `None` when nothing usable is stored
    fn load(&self) -> Option<PoseThresholds>;

    fn save(&mut self, thresholds: &PoseThresholds) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

/// Keeps thresholds in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryThresholdStore {
    thresholds: Option<PoseThresholds>,
}

impl MemoryThresholdStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThresholdStore for MemoryThresholdStore {
    fn load(&self) -> Option<PoseThresholds> {
        self.thresholds
    }

    fn save(&mut self, thresholds: &PoseThresholds) -> Result<()> {
        thresholds.validate()?;
        self.thresholds = Some(*thresholds);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.thresholds = None;
        Ok(())
    }
}

/// Stores thresholds as a small YAML document
#[derive(Debug, Clone)]
pub struct FileThresholdStore {
    path: PathBuf,
}

impl FileThresholdStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThresholdStore for FileThresholdStore {
    fn load(&self) -> Option<PoseThresholds> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No calibration stored at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read calibration {}: {}", self.path.display(), e);
                return None;
            }
        };

        let thresholds: PoseThresholds = match serde_yaml::from_str(&content) {
            Ok(thresholds) => thresholds,
            Err(e) => {
                warn!("Ignoring unparsable calibration {}: {}", self.path.display(), e);
                return None;
            }
        };

        if let Err(e) = thresholds.validate() {
            warn!("Ignoring calibration {}: {}", self.path.display(), e);
            return None;
        }
        Some(thresholds)
    }

    fn save(&mut self, thresholds: &PoseThresholds) -> Result<()> {
        thresholds.validate()?;
        let content = serde_yaml::to_string(thresholds)?;
        std::fs::write(&self.path, content)?;
        info!(
            "Saved calibration to {} (idle {:.3}, jump {:.3})",
            self.path.display(),
            thresholds.idle_threshold,
            thresholds.jump_threshold
        );
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
