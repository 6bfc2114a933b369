use super::PointFilter;
use crate::{keypoint::Skeleton, Error, Result};

/// Blend two skeletons with an exponential moving average.
///
/// Each position becomes `previous * alpha + next * (1 - alpha)`; scores are
/// copied from `next` untouched so they keep reporting the current detection
/// certainty. An absent or fully unobserved `previous` returns `next` as is.
#[must_use]
pub fn smooth_skeleton(previous: Option<&Skeleton>, next: &Skeleton, alpha: f64) -> Skeleton {
    let Some(previous) = previous.filter(|p| !p.is_empty()) else {
        return next.clone();
    };

    let mut smoothed = next.clone();
    for point in next.iter() {
        let prev = previous.get(point.name);
        let mut blended = *point;
        blended.x = prev.x * alpha + point.x * (1.0 - alpha);
        blended.y = prev.y * alpha + point.y * (1.0 - alpha);
        smoothed.set(blended);
    }
    smoothed
}

/// Exponential smoothing of a single 2D point
pub struct ExponentialPointFilter {
    alpha: f64,
    last: Option<(f64, f64)>,
}

impl ExponentialPointFilter {
    /// `alpha` is the weight kept from the previous output and must lie in `[0, 1)`
    pub fn try_new(alpha: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&alpha) {
            return Err(Error::FilterError(format!("Alpha must be in [0, 1): {alpha}")));
        }
        Ok(Self { alpha, last: None })
    }
}

impl PointFilter for ExponentialPointFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        let out = match self.last {
            Some((lx, ly)) => (lx * self.alpha + x * (1.0 - self.alpha), ly * self.alpha + y * (1.0 - self.alpha)),
            None => (x, y),
        };
        self.last = Some(out);
        out
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialPointFilter"
    }
}
