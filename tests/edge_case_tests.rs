//! Edge case tests for filters, normalization and the state machines


use camera_runner_pose::{
    calibration::resolve_thresholds,
    detection::Detection,
    filters::{create_filter, smooth_skeleton},
    gesture::{update_gesture, Gesture, GestureInput, GestureState, HandsUpDetector, HandsUpInput},
    keypoint::{normalize_y, Keypoint, KeypointName, Skeleton},
    pipeline::PoseProcessor,
    pump::speed_multiplier,
    tuning::DetectionMode,
};
use test_helpers::upper_body;

#[test]
fn test_filter_extreme_values() {
    for filter_str in ["none", "exponential:0.8", "kalman", "kalman:0:1:0"] {
        let mut filter = create_filter(filter_str).unwrap();

        let extreme_values = [
            (f64::INFINITY, f64::NEG_INFINITY),
            (f64::NEG_INFINITY, f64::INFINITY),
            (f64::NAN, f64::NAN),
            (f64::MAX, f64::MIN),
            (1e100, -1e100),
            (0.0, 0.0),
        ];

        // Only checks that nothing panics; NaN and infinity may propagate
        for (x, y) in extreme_values {
            let _ = filter.apply(x, y);
        }
    }
}

#[test]
fn test_kalman_ignores_non_finite_measurements() {
    let mut filter = create_filter("kalman").unwrap();
    filter.apply(10.0, 20.0);
    let held = filter.apply(11.0, 21.0);
    assert_eq!(filter.apply(f64::NAN, f64::INFINITY), held);

    filter.reset();
    let (x, y) = filter.apply(f64::NAN, 5.0);
    assert!(x.is_nan());
    assert_eq!(y, 5.0);
}

#[test]
fn test_normalize_y_degenerate_heights() {
    assert_eq!(normalize_y(100.0, 0.0), 0.0);
    assert_eq!(normalize_y(100.0, -480.0), 0.0);
    assert_eq!(normalize_y(100.0, f64::NAN), 0.0);
    assert_eq!(normalize_y(f64::NAN, 480.0), 0.0);
    assert_eq!(normalize_y(f64::INFINITY, 480.0), 0.0);
    assert_eq!(normalize_y(-10.0, 480.0), 0.0);
    assert_eq!(normalize_y(960.0, 480.0), 1.0);
    assert!((normalize_y(240.0, 480.0) - 0.5).abs() < 1e-12);
}

#[test]
fn test_keypoint_scores_are_clamped() {
    assert_eq!(Keypoint::new(KeypointName::Nose, 0.0, 0.0, 1.7).score, 1.0);
    assert_eq!(Keypoint::new(KeypointName::Nose, 0.0, 0.0, -0.2).score, 0.0);
    assert_eq!(Keypoint::new(KeypointName::Nose, 0.0, 0.0, f32::NAN).score, 0.0);
}

#[test]
fn test_smoothing_empty_skeletons() {
    let empty = Skeleton::empty();
    let pose = upper_body(300.0, 200.0, 100.0);

    // An unobserved previous skeleton is not blended in
    assert_eq!(smooth_skeleton(Some(&empty), &pose, 0.3), pose);
    let smoothed = smooth_skeleton(Some(&pose), &empty, 0.3);
    assert!(smoothed.is_empty());
    assert_eq!(smoothed.as_slice().len(), KeypointName::COUNT);
}

#[test]
fn test_zero_height_frame_does_not_panic() {
    let mut processor = PoseProcessor::new(DetectionMode::Responsive);
    let output = processor.ingest(&Detection::new(upper_body(300.0, 200.0, 100.0)), 0, 0.0);
    assert!(output.has_pose);
    assert!(output.wrist_normalized_y.is_finite());
    assert!(output.speed_multiplier >= 1.0);
}

#[test]
fn test_duplicate_timestamps() {
    let mut processor = PoseProcessor::new(DetectionMode::Balanced);
    let mut last = None;
    for i in 0..10 {
        let wrist_y = if i % 2 == 0 { 100.0 } else { 400.0 };
        last = Some(processor.ingest(&Detection::new(upper_body(wrist_y, 250.0, 100.0)), 480, 1000.0));
    }
    let last = last.unwrap();
    assert!(last.speed_multiplier.is_finite());
    assert!(last.speed_multiplier <= 2.4 + 1e-12);
}

#[test]
fn test_thresholds_without_shoulder_or_calibration() {
    assert!(resolve_thresholds(None, 0.0).is_none());
    assert!(resolve_thresholds(None, -0.3).is_none());
    assert!(resolve_thresholds(None, f64::INFINITY).is_none());

    // No usable thresholds means no gesture at all, even at extreme heights
    let tuning = DetectionMode::Responsive.tuning();
    let input = GestureInput {
        wrist_y: 0.0,
        wrist_x: 0.0,
        shoulder_y: 0.0,
        thresholds: None,
        has_pose: true,
        has_wrist: true,
        timestamp: 10.0,
    };
    let update = update_gesture(GestureState::new(0.0), &input, &tuning);
    assert_eq!(update.gesture, Gesture::Idle);
}

#[test]
fn test_hands_up_fallback_without_shoulders() {
    let tuning = DetectionMode::Balanced.tuning();
    let mut detector = HandsUpDetector::new();
    let input = HandsUpInput {
        left_wrist_y: 100.0,
        right_wrist_y: 120.0,
        has_wrists: true,
        has_shoulders: false,
        frame_height: 480.0,
        timestamp: 0.0,
        ..HandsUpInput::default()
    };
    // 0.21 and 0.25 are under the 0.35 fallback height
    assert!(detector.update(&input, &tuning));

    // Cooldown blocks the immediate repeat
    assert!(!detector.update(&HandsUpInput { timestamp: 300.0, ..input }, &tuning));
    assert!(detector.update(&HandsUpInput { timestamp: 700.0, ..input }, &tuning));

    // Zero frame height is treated as one pixel instead of dividing by zero
    let mut detector = HandsUpDetector::new();
    assert!(!detector.update(&HandsUpInput { frame_height: 0.0, ..input }, &tuning));
}

#[test]
fn test_speed_multiplier_bounds() {
    let tuning = DetectionMode::Balanced.tuning();
    assert_eq!(speed_multiplier(f64::NAN, &tuning), 1.0);
    assert_eq!(speed_multiplier(-5.0, &tuning), 1.0);
    assert_eq!(speed_multiplier(0.0, &tuning), 1.0);
    assert!((speed_multiplier(f64::INFINITY, &tuning) - 2.4).abs() < 1e-12);
    assert!((speed_multiplier(1e9, &tuning) - 2.4).abs() < 1e-12);
}
