//! Offline replay of recorded pose traces.
//!
//! A trace is the detector output of a session, one entry per detection,
//! stored as YAML:
//!
//! ```yaml
//! frames:
//!   - timestamp: 0.0
//!     frame_height: 480
//!     keypoints:
//!       - { name: left_wrist, x: 320.0, y: 400.0, score: 0.9 }
//!   - timestamp: 33.0
//!     frame_height: 480
//!     dropped: true   # detector produced nothing for this tick
//! ```
//!
//! Replaying drives a [`PoseProcessor`] exactly as the live loop would and
//! collects every gesture, pump and staleness change.

use crate::{
    calibration::PoseThresholds,
    config::Config,
    detection::Detection,
    gesture::Gesture,
    keypoint::{Keypoint, KeypointName, Skeleton},
    pipeline::PoseProcessor,
    tuning::DetectionMode,
    Error, Result,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Recorded detector output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseTrace {
    pub frames: Vec<TraceFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Milliseconds, non-decreasing across the trace
    pub timestamp: f64,
    pub frame_height: u32,
    #[serde(default)]
    pub keypoints: Vec<TraceKeypoint>,
    /// No detection finished on this tick
    #[serde(default)]
    pub dropped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceKeypoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub score: f32,
}

impl PoseTrace {
    /// Load a trace from a YAML file and check its timestamps
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let trace: Self = serde_yaml::from_str(&content)?;
        trace.validate()?;
        Ok(trace)
    }

    /// Timestamps must be finite and non-decreasing
    pub fn validate(&self) -> Result<()> {
        let mut last = f64::NEG_INFINITY;
        for (index, frame) in self.frames.iter().enumerate() {
            if !frame.timestamp.is_finite() {
                return Err(Error::InvalidInput(format!("Frame {index} has a non-finite timestamp")));
            }
            if frame.timestamp < last {
                return Err(Error::InvalidInput(format!(
                    "Frame {index} goes back in time ({} < {last})",
                    frame.timestamp
                )));
            }
            last = frame.timestamp;
        }
        Ok(())
    }
}

impl TraceFrame {
    /// Detection for this frame; unknown keypoint names are skipped
    #[must_use]
    pub fn detection(&self) -> Detection {
        let mut skeleton = Skeleton::empty();
        for point in &self.keypoints {
            match KeypointName::from_name(&point.name) {
                Some(name) => skeleton.set(Keypoint::new(name, point.x, point.y, point.score)),
                None => warn!("Skipping unknown keypoint '{}'", point.name),
            }
        }
        Detection::new(skeleton)
    }
}

/// Something worth reporting during a replay
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    Gesture { timestamp: f64, gesture: Gesture },
    HandsUp { timestamp: f64 },
    PumpStarted { timestamp: f64, speed_multiplier: f64 },
    PumpStopped { timestamp: f64 },
    PoseStale { timestamp: f64 },
    PoseRecovered { timestamp: f64 },
}

/// Totals of a replay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub poses: usize,
    pub jumps: usize,
    pub flaps: usize,
    pub hands_up: usize,
    pub pump_frames: usize,
    pub max_speed_multiplier: f64,
    pub events: Vec<ReplayEvent>,
}

/// Replays traces through one [`PoseProcessor`]
pub struct ReplayApp {
    processor: PoseProcessor,
}

impl ReplayApp {
    /// Build from configuration, optionally overriding the mode and thresholds
    pub fn new(config: &Config, mode: Option<DetectionMode>, thresholds: Option<PoseThresholds>) -> Result<Self> {
        let mut processor = config.create_processor()?;
        if let Some(mode) = mode {
            processor.set_mode(mode);
        }
        match thresholds {
            Some(t) => info!("Using calibration idle {:.3}, jump {:.3}", t.idle_threshold, t.jump_threshold),
            None => info!("No calibration, using shoulder-relative thresholds"),
        }
        processor.set_thresholds(thresholds);
        info!("Replay mode: {}", processor.mode());
        Ok(Self { processor })
    }

    #[must_use]
    pub fn processor(&self) -> &PoseProcessor {
        &self.processor
    }

    /// Run every frame of `trace` through the processor
    pub fn run(&mut self, trace: &PoseTrace) -> ReplaySummary {
        info!("Replaying {} frames", trace.frames.len());
        let mut summary = ReplaySummary {
            max_speed_multiplier: 1.0,
            ..ReplaySummary::default()
        };
        let mut pump_active = false;
        let mut stale = false;

        for frame in &trace.frames {
            summary.frames += 1;

            if frame.dropped {
                let now_stale = self.processor.poll_staleness(frame.timestamp);
                if now_stale && !stale {
                    info!("Pose lost at {:.0} ms", frame.timestamp);
                    summary.events.push(ReplayEvent::PoseStale {
                        timestamp: frame.timestamp,
                    });
                    if pump_active {
                        pump_active = false;
                        summary.events.push(ReplayEvent::PumpStopped {
                            timestamp: frame.timestamp,
                        });
                    }
                }
                stale = now_stale;
                continue;
            }

            let output = self
                .processor
                .ingest(&frame.detection(), frame.frame_height, frame.timestamp);
            summary.poses += usize::from(output.has_pose);

            if stale && !output.is_pose_stale {
                info!("Pose recovered at {:.0} ms", frame.timestamp);
                summary.events.push(ReplayEvent::PoseRecovered {
                    timestamp: frame.timestamp,
                });
            }
            stale = output.is_pose_stale;

            match output.gesture {
                Gesture::Jump => summary.jumps += 1,
                Gesture::Flap => summary.flaps += 1,
                Gesture::Idle => {}
            }
            if output.gesture != Gesture::Idle {
                info!("{:>8.0} ms  {}", frame.timestamp, output.gesture);
                summary.events.push(ReplayEvent::Gesture {
                    timestamp: frame.timestamp,
                    gesture: output.gesture,
                });
            }

            if output.jump_active {
                summary.hands_up += 1;
                info!("{:>8.0} ms  hands up", frame.timestamp);
                summary.events.push(ReplayEvent::HandsUp {
                    timestamp: frame.timestamp,
                });
            }

            if output.pump_active {
                summary.pump_frames += 1;
            }
            summary.max_speed_multiplier = summary.max_speed_multiplier.max(output.speed_multiplier);
            if output.pump_active != pump_active {
                pump_active = output.pump_active;
                if pump_active {
                    info!("{:>8.0} ms  pump x{:.2}", frame.timestamp, output.speed_multiplier);
                    summary.events.push(ReplayEvent::PumpStarted {
                        timestamp: frame.timestamp,
                        speed_multiplier: output.speed_multiplier,
                    });
                } else {
                    debug!("{:>8.0} ms  pump stopped", frame.timestamp);
                    summary.events.push(ReplayEvent::PumpStopped {
                        timestamp: frame.timestamp,
                    });
                }
            }
        }

        info!(
            "Replay done: {} frames, {} poses, {} jumps, {} flaps, {} hands-up",
            summary.frames, summary.poses, summary.jumps, summary.flaps, summary.hands_up
        );
        summary
    }
}
