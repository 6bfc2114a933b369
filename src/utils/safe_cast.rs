//! Checked conversions between frame dimensions and floating point values

/// Clamp and convert f64 to u32, rounding toward zero
///
/// Non-finite input maps to `min`; swapped bounds are reordered.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamping ensures safe truncation
pub fn f64_to_u32_clamp(value: f64, min: u32, max: u32) -> u32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(f64::from(min), f64::from(max));
    (clamped as u32).clamp(min, max)
}
