//! Benchmarks for the per-sample gesture pipeline

use camera_runner_pose::{
    calibration::PoseThresholds,
    detection::Detection,
    gesture::{update_gesture, GestureInput, GestureState},
    keypoint::{Keypoint, KeypointName, Skeleton},
    pipeline::PoseProcessor,
    pump::{update_pump_state, PumpInput, PumpState},
    tuning::DetectionMode,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Wrists oscillating sideways and vertically at 30 fps
fn session(frames: usize) -> Vec<(f64, f64, f64)> {
    (0..frames)
        .map(|i| {
            let t = i as f64 * 33.0;
            let phase = t / 120.0;
            (t, 300.0 + 80.0 * phase.sin(), 0.6 + 0.2 * (phase * 0.5).cos())
        })
        .collect()
}

fn benchmark_gesture(c: &mut Criterion) {
    let mut group = c.benchmark_group("gesture");
    let samples = session(300);

    for mode in DetectionMode::ALL {
        let tuning = mode.tuning();
        group.bench_with_input(BenchmarkId::new("update_gesture_300", mode), &samples, |b, samples| {
            b.iter(|| {
                let mut state = GestureState::new(0.0);
                for &(t, x, y) in samples {
                    let input = GestureInput {
                        wrist_y: y,
                        wrist_x: x,
                        shoulder_y: 0.5,
                        thresholds: Some(PoseThresholds::new(0.75, 0.35)),
                        has_pose: true,
                        has_wrist: true,
                        timestamp: t,
                    };
                    state = update_gesture(state, black_box(&input), &tuning).state;
                }
                black_box(state)
            });
        });
    }

    group.finish();
}

fn benchmark_pump(c: &mut Criterion) {
    let mut group = c.benchmark_group("pump");
    let samples = session(300);

    for mode in DetectionMode::ALL {
        let tuning = mode.tuning();
        group.bench_with_input(BenchmarkId::new("update_pump_state_300", mode), &samples, |b, samples| {
            b.iter(|| {
                let mut state = PumpState::new(0.0);
                for &(t, _, y) in samples {
                    let input = PumpInput {
                        left_wrist_y: y,
                        right_wrist_y: 1.0 - y,
                        has_pose: true,
                        has_wrists: true,
                        timestamp: t,
                    };
                    state = update_pump_state(state, black_box(&input), &tuning).state;
                }
                black_box(state)
            });
        });
    }

    group.finish();
}

fn benchmark_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("processor");

    let detections: Vec<(f64, Detection)> = session(120)
        .into_iter()
        .map(|(t, x, y)| {
            let skeleton = Skeleton::from_keypoints([
                Keypoint::new(KeypointName::LeftWrist, x, y * 480.0, 0.9),
                Keypoint::new(KeypointName::RightWrist, x + 150.0, y * 480.0, 0.9),
                Keypoint::new(KeypointName::LeftShoulder, 300.0, 240.0, 0.9),
                Keypoint::new(KeypointName::RightShoulder, 450.0, 240.0, 0.9),
            ]);
            (t, Detection::new(skeleton))
        })
        .collect();

    group.bench_function("ingest_120", |b| {
        b.iter(|| {
            let mut processor = PoseProcessor::new(DetectionMode::Balanced);
            for (t, detection) in &detections {
                black_box(processor.ingest(black_box(detection), 480, *t));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_gesture, benchmark_pump, benchmark_processor);
criterion_main!(benches);
