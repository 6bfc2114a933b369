//! Error handling tests for all modules


use camera_runner_pose::{
    app::PoseTrace,
    calibration::{FileThresholdStore, MemoryThresholdStore, PoseThresholds, ThresholdStore},
    config::Config,
    filters::create_filter,
    tuning::DetectionMode,
    Error, Result,
};
use std::fs;
use test_helpers::temp_file;

#[test]
fn test_filter_creation_errors() {
    // Test invalid filter type
    let result = create_filter("invalid_filter");
    assert!(result.is_err());

    // Test invalid alpha for exponential filter
    let result = create_filter("exponential:2.0");
    match result {
        Err(Error::FilterError(msg)) => assert!(msg.contains("Alpha")),
        _ => panic!("Expected FilterError"),
    }

    // Test unparsable Kalman parameter
    match create_filter("kalman:2:abc") {
        Err(Error::FilterError(msg)) => assert!(msg.contains("abc")),
        _ => panic!("Expected FilterError"),
    }

    // Zero measurement noise would divide by zero
    assert!(create_filter("kalman:2:0:1").is_err());
    assert!(create_filter("kalman:-1").is_err());
}

#[test]
fn test_detection_mode_parse_errors() {
    let result: Result<DetectionMode> = "turbo".parse();
    match result {
        Err(Error::InvalidInput(msg)) => assert!(msg.contains("turbo")),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
    assert_eq!(" Responsive ".parse::<DetectionMode>().unwrap(), DetectionMode::Responsive);
    assert_eq!(DetectionMode::from_name_lossy("turbo"), DetectionMode::Balanced);
}

#[test]
fn test_config_errors() {
    // Missing file
    let result = Config::from_file("/nonexistent/camera-runner-pose.yaml");
    assert!(matches!(result, Err(Error::Io(_))));

    // Malformed YAML
    let path = temp_file("bad-config.yaml");
    fs::write(&path, "detection: [unclosed").unwrap();
    assert!(matches!(Config::from_file(&path), Err(Error::ConfigError(_))));
    fs::remove_file(&path).ok();

    // Invalid values are caught by validate
    let mut config = Config::default();
    config.cursor.filter = "median".to_string();
    assert!(config.validate().is_err());
    assert!(config.create_processor().is_err());

    let mut config = Config::default();
    config.cursor.filter = "exponential".to_string();
    config.cursor.exponential_alpha = 1.5;
    assert!(matches!(config.create_filter(), Err(Error::FilterError(_))));

    let mut config = Config::default();
    config.staleness.stale_after_ms = 0.0;
    assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
}

#[test]
fn test_calibration_errors() {
    assert!(PoseThresholds::new(0.75, 0.35).validate().is_ok());
    for (idle, jump) in [(1.5, 0.3), (0.7, -0.1), (f64::NAN, 0.3), (0.7, f64::INFINITY)] {
        match PoseThresholds::new(idle, jump).validate() {
            Err(Error::Calibration(_)) => {}
            other => panic!("Expected Calibration error for ({idle}, {jump}), got {other:?}"),
        }
    }

    let mut store = MemoryThresholdStore::new();
    assert!(store.save(&PoseThresholds::new(2.0, 0.3)).is_err());
    assert!(store.load().is_none());
}

#[test]
fn test_file_store_tolerates_bad_content() {
    let path = temp_file("bad-calibration.yaml");
    let mut store = FileThresholdStore::new(&path);

    // Missing file, garbage and out-of-range values all load as nothing
    assert!(store.load().is_none());
    fs::write(&path, "not: [valid").unwrap();
    assert!(store.load().is_none());
    fs::write(&path, "idleThreshold: 3.0\njumpThreshold: 0.2\n").unwrap();
    assert!(store.load().is_none());

    // Saving invalid thresholds is refused and leaves the file alone
    assert!(store.save(&PoseThresholds::new(-1.0, 0.2)).is_err());
    assert!(fs::read_to_string(&path).unwrap().contains("3.0"));

    store.clear().unwrap();
    assert!(!path.exists());
    // Clearing twice is fine
    store.clear().unwrap();
}

#[test]
fn test_trace_errors() {
    let backwards = "frames:\n  - { timestamp: 100.0, frame_height: 480 }\n  - { timestamp: 50.0, frame_height: 480 }\n";
    let trace: PoseTrace = serde_yaml::from_str(backwards).unwrap();
    match trace.validate() {
        Err(Error::InvalidInput(msg)) => assert!(msg.contains("back in time")),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }

    let path = temp_file("backwards-trace.yaml");
    fs::write(&path, backwards).unwrap();
    assert!(matches!(PoseTrace::from_file(&path), Err(Error::InvalidInput(_))));
    fs::remove_file(&path).ok();

    let missing_height = "frames:\n  - { timestamp: 0.0 }\n";
    assert!(serde_yaml::from_str::<PoseTrace>(missing_height).is_err());

    assert!(matches!(
        PoseTrace::from_file("/nonexistent/trace.yaml"),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_error_display() {
    assert_eq!(
        Error::DetectorUnavailable("hand model".into()).to_string(),
        "Detector unavailable: hand model"
    );
    assert_eq!(Error::WorkerDisconnected.to_string(), "Detection worker disconnected");
    let io: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
    assert!(io.to_string().contains("disk gone"));
    assert!(!io.is_retryable());
}
