//! Detector back-ends and the hybrid scheduler that arbitrates between them.
//!
//! The landmark models themselves are external. They are reached through the
//! [`LandmarkDetector`] capability trait, which has two concrete shapes:
//! a cheap multi-hand detector ([`HandDetector`]) and a full-body detector
//! ([`BodyDetector`]). The [`scheduler::HybridScheduler`] only depends on
//! those traits.

/// Region-of-interest cropping with a reusable buffer
pub mod roi;

/// Frame-skip, ROI and fast/slow path fusion
pub mod scheduler;

use crate::{
    constants::HAND_WRIST_CONFIDENCE,
    keypoint::{Keypoint, KeypointName, Side, Skeleton},
    Result,
};
use image::RgbImage;

pub use roi::RoiCropper;
pub use scheduler::{DetectorCache, HybridScheduler};

/// A raw camera frame
pub type Frame = RgbImage;

/// One landmark as reported by a detector, in coordinates normalized to the
/// image it was run on
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub visibility: Option<f32>,
    pub presence: Option<f32>,
}

impl Landmark {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visibility: None,
            presence: None,
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    #[must_use]
    pub fn with_presence(mut self, presence: f32) -> Self {
        self.presence = Some(presence);
        self
    }
}

/// Landmarks of a single hand plus the model's handedness label
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandLandmarks {
    /// Landmark 0 is the wrist
    pub landmarks: Vec<Landmark>,
    pub handedness: String,
}

impl HandLandmarks {
    /// Resolve the handedness label; anything but "right" maps to the left
    #[must_use]
    pub fn side(&self) -> Side {
        if self.handedness.eq_ignore_ascii_case("right") {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Wrist keypoint in pixel coordinates of a `width` x `height` image
    #[must_use]
    pub fn wrist_keypoint(&self, width: u32, height: u32) -> Option<Keypoint> {
        let wrist = self.landmarks.first()?;
        Some(Keypoint::new(
            self.side().wrist(),
            f64::from(wrist.x) * f64::from(width),
            f64::from(wrist.y) * f64::from(height),
            wrist.visibility.unwrap_or(HAND_WRIST_CONFIDENCE),
        ))
    }
}

/// Polymorphic handle to an external landmark model
pub trait LandmarkDetector: Send {
    /// What a single inference returns
    type Output;

    /// Load the model; calling it again once ready is a no-op
    fn initialize(&mut self) -> Result<()>;

    /// Whether [`LandmarkDetector::detect`] may be called
    fn is_ready(&self) -> bool;

    /// Run inference on one image
    fn detect(&mut self, image: &Frame) -> Result<Self::Output>;
}

/// Fast path: zero or more hands per image
pub trait HandDetector: LandmarkDetector<Output = Vec<HandLandmarks>> {}
impl<T: LandmarkDetector<Output = Vec<HandLandmarks>>> HandDetector for T {}

/// Slow path: zero or one 33-point body per image
pub trait BodyDetector: LandmarkDetector<Output = Option<Vec<Landmark>>> {}
impl<T: LandmarkDetector<Output = Option<Vec<Landmark>>>> BodyDetector for T {}

/// Position of each COCO name inside the 33-point body landmark list
pub const BODY_LANDMARK_INDEX: [(KeypointName, usize); KeypointName::COUNT] = [
    (KeypointName::Nose, 0),
    (KeypointName::LeftEye, 2),
    (KeypointName::RightEye, 5),
    (KeypointName::LeftEar, 7),
    (KeypointName::RightEar, 8),
    (KeypointName::LeftShoulder, 11),
    (KeypointName::RightShoulder, 12),
    (KeypointName::LeftElbow, 13),
    (KeypointName::RightElbow, 14),
    (KeypointName::LeftWrist, 15),
    (KeypointName::RightWrist, 16),
    (KeypointName::LeftHip, 23),
    (KeypointName::RightHip, 24),
    (KeypointName::LeftKnee, 25),
    (KeypointName::RightKnee, 26),
    (KeypointName::LeftAnkle, 27),
    (KeypointName::RightAnkle, 28),
];

/// Map a body landmark list onto a complete skeleton in pixel coordinates.
///
/// Missing indices stay unobserved; the score is the landmark visibility,
/// else its presence, else zero.
#[must_use]
pub fn skeleton_from_body(landmarks: &[Landmark], width: u32, height: u32) -> Skeleton {
    let mut skeleton = Skeleton::empty();
    for (name, index) in BODY_LANDMARK_INDEX {
        if let Some(landmark) = landmarks.get(index) {
            skeleton.set(Keypoint::new(
                name,
                f64::from(landmark.x) * f64::from(width),
                f64::from(landmark.y) * f64::from(height),
                landmark.visibility.or(landmark.presence).unwrap_or(0.0),
            ));
        }
    }
    skeleton
}

/// Skeleton plus its highest keypoint score
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub skeleton: Skeleton,
    pub max_score: f32,
}

impl Detection {
    #[must_use]
    pub fn new(skeleton: Skeleton) -> Self {
        let max_score = skeleton.max_score();
        Self { skeleton, max_score }
    }

    /// Detection with nothing observed
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Skeleton::empty())
    }
}
