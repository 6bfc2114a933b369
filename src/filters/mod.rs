//! Keypoint smoothing and cursor filtering.
//!
//! Two layers compose here: the whole skeleton is smoothed with a coarse
//! exponential moving average ([`exponential::smooth_skeleton`]), and the
//! single wrist used as a fine-grained cursor is further run through a
//! [`PointFilter`], by default a pair of scalar Kalman filters.

/// Exponential moving average over skeletons and points
pub mod exponential;

/// Scalar Kalman estimator and the per-axis cursor filter built on it
pub mod kalman;

use crate::{Error, Result};
pub use exponential::smooth_skeleton;
use kalman::{KalmanParams, KalmanPointFilter};

/// Trait for all cursor point filters
pub trait PointFilter: Send + Sync {
    /// Apply filter to a point measurement
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64);

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl PointFilter for NoFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

fn parse_param(spec: &str, value: Option<&str>, default: f64) -> Result<f64> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| Error::FilterError(format!("Invalid parameter '{raw}' in filter '{spec}'"))),
    }
}

/// Create a point filter from a spec such as `kalman`, `kalman:2:10:1`,
/// `exponential:0.3` or `none`
pub fn create_filter(spec: &str) -> Result<Box<dyn PointFilter>> {
    let lowered = spec.to_lowercase();
    let mut parts = lowered.split(':');
    let kind = parts.next().unwrap_or_default();

    match kind {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "kalman" => {
            let defaults = KalmanParams::default();
            let params = KalmanParams {
                process_noise: parse_param(spec, parts.next(), defaults.process_noise)?,
                measurement_noise: parse_param(spec, parts.next(), defaults.measurement_noise)?,
                estimated_error: parse_param(spec, parts.next(), defaults.estimated_error)?,
            };
            Ok(Box::new(KalmanPointFilter::try_new(params)?))
        }
        "exponential" | "ema" => {
            let alpha = parse_param(spec, parts.next(), crate::constants::EMA_ALPHA)?;
            Ok(Box::new(exponential::ExponentialPointFilter::try_new(alpha)?))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {spec}"))),
    }
}
