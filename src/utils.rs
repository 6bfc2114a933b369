//! Small numeric helpers shared by the state machines.

pub mod safe_cast;

use crate::constants::MIN_VELOCITY_DT_MS;

/// Rate of change per second of `delta` over `dt_ms` milliseconds.
///
/// The elapsed time is floored at one millisecond so that duplicate or
/// out-of-order timestamps cannot blow the result up.
#[must_use]
pub fn velocity_per_second(delta: f64, dt_ms: f64) -> f64 {
    let dt_ms = if dt_ms.is_finite() { dt_ms.max(MIN_VELOCITY_DT_MS) } else { MIN_VELOCITY_DT_MS };
    delta / (dt_ms / 1000.0)
}

/// Sign of a velocity as -1, 0 or 1
#[must_use]
pub fn direction(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_per_second() {
        assert!((velocity_per_second(50.0, 50.0) - 1000.0).abs() < 1e-9);
        assert!((velocity_per_second(0.35, 100.0) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_floor() {
        // Zero or negative elapsed time is treated as one millisecond
        assert!((velocity_per_second(1.0, 0.0) - 1000.0).abs() < 1e-9);
        assert!((velocity_per_second(1.0, -20.0) - 1000.0).abs() < 1e-9);
        assert!((velocity_per_second(1.0, f64::NAN) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction() {
        assert_eq!(direction(3.0), 1);
        assert_eq!(direction(-0.1), -1);
        assert_eq!(direction(0.0), 0);
        assert_eq!(direction(f64::NAN), 0);
    }
}
