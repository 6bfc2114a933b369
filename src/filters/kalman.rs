use super::PointFilter;
use crate::{
    constants::{DEFAULT_KALMAN_ESTIMATED_ERROR, DEFAULT_KALMAN_MEASUREMENT_NOISE, DEFAULT_KALMAN_PROCESS_NOISE},
    Error, Result,
};

/// Noise parameters of a [`ScalarKalmanFilter`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanParams {
    pub process_noise: f64,
    pub measurement_noise: f64,
    /// Initial error covariance
    pub estimated_error: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            process_noise: DEFAULT_KALMAN_PROCESS_NOISE,
            measurement_noise: DEFAULT_KALMAN_MEASUREMENT_NOISE,
            estimated_error: DEFAULT_KALMAN_ESTIMATED_ERROR,
        }
    }
}

impl KalmanParams {
    /// Reject parameters that would make the gain undefined
    pub fn validate(&self) -> Result<()> {
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !non_negative(self.process_noise)
            || !non_negative(self.estimated_error)
            || !(self.measurement_noise.is_finite() && self.measurement_noise > 0.0)
        {
            return Err(Error::FilterError(format!(
                "Kalman noise parameters must be non-negative (measurement noise positive): {self:?}"
            )));
        }
        Ok(())
    }
}

/// One-dimensional recursive estimator for a single tracked axis
#[derive(Debug, Clone)]
pub struct ScalarKalmanFilter {
    estimate: f64,
    error_covariance: f64,
    process_noise: f64,
    measurement_noise: f64,
}

impl ScalarKalmanFilter {
    /// Seed the filter with its first real measurement
    pub fn new(initial: f64, params: KalmanParams) -> Self {
        Self {
            estimate: initial,
            error_covariance: params.estimated_error,
            process_noise: params.process_noise,
            measurement_noise: params.measurement_noise,
        }
    }

    /// Fold in one measurement and return the new estimate
    pub fn update(&mut self, measurement: f64) -> f64 {
        let predicted_error = self.error_covariance + self.process_noise;
        let gain = predicted_error / (predicted_error + self.measurement_noise);
        self.estimate += gain * (measurement - self.estimate);
        self.error_covariance = (1.0 - gain) * predicted_error;
        self.estimate
    }

    #[must_use]
    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    #[must_use]
    pub fn error_covariance(&self) -> f64 {
        self.error_covariance
    }
}

/// Independent x/y Kalman filters for the fine-grained cursor point.
///
/// The per-axis filters are created on the first finite measurement and
/// dropped again by [`PointFilter::reset`].
pub struct KalmanPointFilter {
    params: KalmanParams,
    x: Option<ScalarKalmanFilter>,
    y: Option<ScalarKalmanFilter>,
}

impl KalmanPointFilter {
    pub fn new(params: KalmanParams) -> Self {
        Self { params, x: None, y: None }
    }

    /// Like [`KalmanPointFilter::new`] but refuses unusable noise parameters
    pub fn try_new(params: KalmanParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::new(params))
    }

    /// Whether the axis filters have been instantiated
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

impl Default for KalmanPointFilter {
    fn default() -> Self {
        Self::new(KalmanParams::default())
    }
}

impl PointFilter for KalmanPointFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        if !x.is_finite() || !y.is_finite() {
            return match (&self.x, &self.y) {
                (Some(fx), Some(fy)) => (fx.estimate(), fy.estimate()),
                _ => (x, y),
            };
        }
        let params = self.params;
        let fx = self.x.get_or_insert_with(|| ScalarKalmanFilter::new(x, params));
        let out_x = fx.update(x);
        let fy = self.y.get_or_insert_with(|| ScalarKalmanFilter::new(y, params));
        let out_y = fy.update(y);
        (out_x, out_y)
    }

    fn reset(&mut self) {
        self.x = None;
        self.y = None;
    }

    fn name(&self) -> &str {
        "KalmanPointFilter"
    }
}
