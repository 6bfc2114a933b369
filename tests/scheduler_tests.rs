//! Tests for the hybrid detection scheduler


use camera_runner_pose::{
    detection::{HybridScheduler, Landmark},
    keypoint::KeypointName,
    tuning::DetectionMode,
    Error,
};
use test_helpers::{body_landmarks, hand, test_frame, FakeBodyDetector, FakeHandDetector};

fn ready(
    hands: FakeHandDetector,
    body: FakeBodyDetector,
    mode: DetectionMode,
) -> HybridScheduler<FakeHandDetector, FakeBodyDetector> {
    let mut scheduler = HybridScheduler::new(hands, body, mode);
    scheduler.initialize().unwrap();
    scheduler
}

#[test]
fn test_fast_path_reuses_last_full_body() {
    let hands = FakeHandDetector::new(vec![hand("Right", 0.25, 0.5)]);
    let hand_counter = hands.counter.clone();
    let body = FakeBodyDetector::new(Some(body_landmarks(0.8, 0.4)));
    let body_counter = body.counter.clone();
    let mut scheduler = ready(hands, body, DetectionMode::Accuracy);
    let frame = test_frame(200, 100); // ROI is 200 x 60

    // Refresh is due when the post-increment counter is a multiple of 6
    let first = scheduler.detect(&frame).unwrap();
    assert_eq!(body_counter.calls(), 0, "hands found and no refresh due");
    let wrist = first.skeleton.get(KeypointName::RightWrist);
    assert!((wrist.x - 50.0).abs() < 1e-6);
    assert!((wrist.y - 30.0).abs() < 1e-6);
    assert!((wrist.score - 0.9).abs() < 1e-6);
    assert_eq!(first.skeleton.get(KeypointName::LeftShoulder).score, 0.0);

    // Frames 1..=5: the sixth call hits the refresh
    for _ in 1..6 {
        scheduler.detect(&frame).unwrap();
    }
    assert_eq!(body_counter.calls(), 1);
    assert_eq!(hand_counter.calls(), 6);

    // Next fast-path frame starts from the refreshed body, with the hand wrist on top
    let fused = scheduler.detect(&frame).unwrap();
    assert!(fused.skeleton.get(KeypointName::LeftShoulder).score > 0.8);
    let wrist = fused.skeleton.get(KeypointName::RightWrist);
    assert!((wrist.x - 50.0).abs() < 1e-6);
    assert!((fused.skeleton.get(KeypointName::LeftWrist).y - 48.0).abs() < 1e-4);
}

#[test]
fn test_no_hands_falls_back_to_body() {
    let body = FakeBodyDetector::new(Some(body_landmarks(0.8, 0.4)));
    let body_counter = body.counter.clone();
    let mut scheduler = ready(FakeHandDetector::new(Vec::new()), body, DetectionMode::Responsive);

    let detection = scheduler.detect(&test_frame(100, 100)).unwrap();
    assert_eq!(body_counter.calls(), 1);
    assert!((detection.max_score - 0.9).abs() < 1e-6);
    assert!(scheduler.cache().last_full_body.is_some());
}

#[test]
fn test_nothing_detected_degrades_to_zero_scores() {
    let mut scheduler = ready(
        FakeHandDetector::new(Vec::new()),
        FakeBodyDetector::new(None),
        DetectionMode::Accuracy,
    );
    let detection = scheduler.detect(&test_frame(64, 48)).unwrap();
    assert_eq!(detection.max_score, 0.0);
    assert!(detection.skeleton.iter().all(|kp| kp.score == 0.0));
    assert_eq!(detection.skeleton.as_slice().len(), KeypointName::COUNT);
}

#[test]
fn test_balanced_skips_every_other_frame() {
    let hands = FakeHandDetector::new(vec![hand("left", 0.5, 0.5)]);
    let hand_counter = hands.counter.clone();
    let mut scheduler = ready(hands, FakeBodyDetector::new(None), DetectionMode::Balanced);
    let frame = test_frame(32, 32);

    let mut results = Vec::new();
    for _ in 0..6 {
        results.push(scheduler.detect(&frame).unwrap());
    }
    assert_eq!(hand_counter.calls(), 3);
    assert_eq!(results[0], results[1]);
    assert_eq!(scheduler.frame_counter(), 6);
}

#[test]
fn test_mode_switch_preserves_counter_and_cache() {
    let mut scheduler = ready(
        FakeHandDetector::new(vec![hand("left", 0.5, 0.5)]),
        FakeBodyDetector::new(Some(body_landmarks(0.7, 0.3))),
        DetectionMode::Balanced,
    );
    let frame = test_frame(32, 32);
    for _ in 0..5 {
        scheduler.detect(&frame).unwrap();
    }
    let counter = scheduler.frame_counter();
    let cached = scheduler.cached_result().cloned();

    for mode in DetectionMode::ALL {
        scheduler.update_mode(mode);
        assert_eq!(scheduler.frame_counter(), counter);
        assert_eq!(scheduler.cached_result().cloned(), cached);
        assert_eq!(scheduler.frame_skip(), mode.tuning().frame_skip);
        assert_eq!(scheduler.pose_refresh_interval(), mode.tuning().pose_refresh_interval);
    }
}

#[test]
fn test_not_ready_is_retryable_and_leaves_counter() {
    let mut hands = FakeHandDetector::new(Vec::new());
    hands.init_failures = 2;
    let mut scheduler = HybridScheduler::new(hands, FakeBodyDetector::new(None), DetectionMode::Balanced);

    for _ in 0..2 {
        let err = scheduler.initialize().unwrap_err();
        assert!(err.is_retryable());
        let err = scheduler.detect(&test_frame(8, 8)).unwrap_err();
        assert!(matches!(err, Error::DetectorUnavailable(_)));
    }
    assert_eq!(scheduler.frame_counter(), 0);

    scheduler.initialize().unwrap();
    assert!(scheduler.detect(&test_frame(8, 8)).is_ok());
}

#[test]
fn test_inference_failure_propagates() {
    let mut scheduler = ready(
        FakeHandDetector::failing("model crashed"),
        FakeBodyDetector::new(None),
        DetectionMode::Accuracy,
    );
    let err = scheduler.detect(&test_frame(8, 8)).unwrap_err();
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("model crashed"));
}

#[test]
fn test_body_score_prefers_visibility_then_presence() {
    let mut landmarks = vec![Landmark::default(); 33];
    landmarks[0] = Landmark::new(0.5, 0.5).with_presence(0.4);
    landmarks[15] = Landmark::new(0.5, 0.5).with_visibility(0.7).with_presence(0.2);
    let mut scheduler = ready(
        FakeHandDetector::new(Vec::new()),
        FakeBodyDetector::new(Some(landmarks)),
        DetectionMode::Accuracy,
    );
    let detection = scheduler.detect(&test_frame(10, 10)).unwrap();
    assert!((detection.skeleton.get(KeypointName::Nose).score - 0.4).abs() < 1e-6);
    assert!((detection.skeleton.get(KeypointName::LeftWrist).score - 0.7).abs() < 1e-6);
}
