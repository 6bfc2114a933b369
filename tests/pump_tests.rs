//! Tests for the pump cadence detector

use camera_runner_pose::{
    constants::MAX_SPEED_MULTIPLIER,
    pump::{update_pump_state, PumpInput, PumpState},
    tuning::DetectionMode,
};
use rand::Rng;

fn wrists(left: f64, right: f64, timestamp: f64) -> PumpInput {
    PumpInput {
        left_wrist_y: left,
        right_wrist_y: right,
        has_pose: true,
        has_wrists: true,
        timestamp,
    }
}

#[test]
fn test_sustained_pumping_activates() {
    let tuning = DetectionMode::Balanced.tuning();
    let frames = [(100.0, 0.2), (200.0, 0.55), (300.0, 0.15), (400.0, 0.6), (500.0, 0.2), (600.0, 0.55)];

    let mut state = PumpState::new(0.0);
    let mut last = None;
    for (t, y) in frames {
        let result = update_pump_state(state, &wrists(y, y, t), &tuning);
        state = result.state.clone();
        last = Some(result);
    }

    let last = last.unwrap();
    assert!(last.pump_active);
    assert!(last.speed_multiplier > 1.0);
    assert!(last.average_velocity > tuning.pump_threshold);
}

#[test]
fn test_one_still_arm_halves_the_signal() {
    let tuning = DetectionMode::Balanced.tuning();
    let first = update_pump_state(PumpState::new(0.0), &wrists(0.5, 0.5, 0.0), &tuning);
    let second = update_pump_state(first.state, &wrists(0.9, 0.5, 100.0), &tuning);
    // Left moved 4/s, right 0/s
    assert!((second.average_velocity - 2.0).abs() < 1e-9);
}

#[test]
fn test_holding_still_is_inactive() {
    let tuning = DetectionMode::Accuracy.tuning();
    let mut state = PumpState::new(0.0);
    for i in 0..20 {
        let result = update_pump_state(state, &wrists(0.6, 0.6, f64::from(i) * 33.0), &tuning);
        assert!(!result.pump_active);
        assert_eq!(result.speed_multiplier, 1.0);
        state = result.state;
    }
}

#[test]
fn test_reset_on_loss_regardless_of_history() {
    let mut rng = rand::thread_rng();
    let tuning = DetectionMode::Responsive.tuning();

    for _ in 0..50 {
        let mut state = PumpState::new(0.0);
        let mut t = 0.0;
        for _ in 0..rng.gen_range(0..20) {
            t += rng.gen_range(1.0..80.0);
            let y = rng.gen_range(0.0..1.0);
            state = update_pump_state(state, &wrists(y, 1.0 - y, t), &tuning).state;
        }

        let lost = PumpInput {
            has_pose: false,
            has_wrists: rng.gen_bool(0.5),
            ..wrists(0.5, 0.5, t + 10.0)
        };
        let result = update_pump_state(state, &lost, &tuning);
        assert!(!result.pump_active);
        assert_eq!(result.speed_multiplier, 1.0);
        assert!(result.state.velocity_history.is_empty());
    }
}

#[test]
fn test_multiplier_bounded_for_extreme_values() {
    let tuning = DetectionMode::Responsive.tuning();
    let extremes = [0.0, 1.0, -1e300, 1e300, f64::MAX, f64::MIN, 1e-300];
    let mut state = PumpState::new(0.0);
    for (i, y) in extremes.iter().enumerate() {
        let result = update_pump_state(state, &wrists(*y, -*y, i as f64), &tuning);
        assert!(result.speed_multiplier >= 1.0, "{y}");
        assert!(result.speed_multiplier <= MAX_SPEED_MULTIPLIER, "{y}");
        state = result.state;
    }

    // Duplicate timestamps are floored to 1 ms rather than dividing by zero
    let result = update_pump_state(state, &wrists(0.0, 0.0, 6.0), &tuning);
    assert!(result.speed_multiplier.is_finite());
}

#[test]
fn test_history_cap_per_mode() {
    for mode in DetectionMode::ALL {
        let tuning = mode.tuning();
        let mut state = PumpState::new(0.0);
        for i in 0..40 {
            let y = if i % 2 == 0 { 0.1 } else { 0.9 };
            state = update_pump_state(state, &wrists(y, y, f64::from(i) * 50.0), &tuning).state;
            assert!(state.velocity_history.len() <= tuning.pump_history_size);
        }
        assert_eq!(state.velocity_history.len(), tuning.pump_history_size, "mode {mode}");
    }
}
