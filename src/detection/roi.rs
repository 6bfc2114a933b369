use super::Frame;
use crate::{constants::ROI_HEIGHT_FRACTION, utils::safe_cast::f64_to_u32_clamp};

/// Crops frames to the band expected to contain hands and torso.
///
/// The output buffer is reused between calls and only reallocated when the
/// source dimensions change.
pub struct RoiCropper {
    fraction: f64,
    buffer: Frame,
}

impl RoiCropper {
    #[must_use]
    pub fn new() -> Self {
        Self::with_fraction(ROI_HEIGHT_FRACTION)
    }

    /// Keep the top `fraction` of every frame
    #[must_use]
    pub fn with_fraction(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            buffer: Frame::new(0, 0),
        }
    }

    /// Height of the region kept from a frame `height` pixels tall
    #[must_use]
    pub fn roi_height(&self, height: u32) -> u32 {
        if height == 0 {
            return 0;
        }
        f64_to_u32_clamp((f64::from(height) * self.fraction).floor(), 1, height)
    }

    /// Copy the top band of `frame` into the cached buffer and return it
    pub fn crop(&mut self, frame: &Frame) -> &Frame {
        let width = frame.width();
        let height = self.roi_height(frame.height());
        if self.buffer.dimensions() != (width, height) {
            self.buffer = Frame::new(width, height);
        }

        // Rows are contiguous, so the band is a prefix of the raw buffer
        let len = self.buffer.len();
        self.buffer.copy_from_slice(&frame.as_raw()[..len]);
        &self.buffer
    }
}

impl Default for RoiCropper {
    fn default() -> Self {
        Self::new()
    }
}
