//! Named skeletal keypoints and the fixed-size skeleton built from them.
//!
//! A [`Skeleton`] always holds one entry per [`KeypointName`]; landmarks the
//! detector did not see are stored at the origin with a score of zero.

use serde::{Deserialize, Serialize};
use std::fmt;

/// COCO keypoint vocabulary shared by both detector back-ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum KeypointName {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointName {
    pub const COUNT: usize = 17;

    /// Every name in skeleton order
    pub const ALL: [Self; Self::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Position of this name inside a [`Skeleton`]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// Look a name up by its string form
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kp| kp.as_str() == name)
    }
}

impl fmt::Display for KeypointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the body a hand or wrist belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Wrist keypoint for this side
    #[must_use]
    pub fn wrist(self) -> KeypointName {
        match self {
            Self::Left => KeypointName::LeftWrist,
            Self::Right => KeypointName::RightWrist,
        }
    }
}

/// Single named keypoint in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f64,
    pub y: f64,
    /// Detection confidence in [0, 1]; 0 means "not observed"
    pub score: f32,
}

impl Keypoint {
    /// Create a keypoint, clamping the score into [0, 1]
    #[must_use]
    pub fn new(name: KeypointName, x: f64, y: f64, score: f32) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        Self { name, x, y, score }
    }

    /// Unobserved keypoint at the origin
    #[must_use]
    pub fn missing(name: KeypointName) -> Self {
        Self {
            name,
            x: 0.0,
            y: 0.0,
            score: 0.0,
        }
    }

    /// Whether the score exceeds `threshold`
    #[must_use]
    pub fn is_observed(&self, threshold: f32) -> bool {
        self.score > threshold
    }
}

/// Complete skeleton: exactly one keypoint per [`KeypointName`]
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    keypoints: [Keypoint; KeypointName::COUNT],
}

impl Skeleton {
    /// Skeleton with every keypoint unobserved
    #[must_use]
    pub fn empty() -> Self {
        Self {
            keypoints: KeypointName::ALL.map(Keypoint::missing),
        }
    }

    /// Build from any set of keypoints; names not supplied stay unobserved and
    /// later duplicates overwrite earlier ones.
    #[must_use]
    pub fn from_keypoints<I: IntoIterator<Item = Keypoint>>(keypoints: I) -> Self {
        let mut skeleton = Self::empty();
        for keypoint in keypoints {
            skeleton.set(keypoint);
        }
        skeleton
    }

    #[must_use]
    pub fn get(&self, name: KeypointName) -> &Keypoint {
        &self.keypoints[name.index()]
    }

    /// Replace the entry with the same name
    pub fn set(&mut self, keypoint: Keypoint) {
        self.keypoints[keypoint.name.index()] = keypoint;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.keypoints.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// Highest score over all keypoints
    #[must_use]
    pub fn max_score(&self) -> f32 {
        self.keypoints.iter().map(|k| k.score).fold(0.0, f32::max)
    }

    /// Whether any keypoint was observed at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keypoints.iter().all(|k| k.score <= 0.0)
    }

    /// The more confident of the two wrists (left wins ties)
    #[must_use]
    pub fn best_wrist(&self) -> &Keypoint {
        self.best_of(KeypointName::LeftWrist, KeypointName::RightWrist)
    }

    /// The more confident of the two shoulders (left wins ties)
    #[must_use]
    pub fn best_shoulder(&self) -> &Keypoint {
        self.best_of(KeypointName::LeftShoulder, KeypointName::RightShoulder)
    }

    fn best_of(&self, left: KeypointName, right: KeypointName) -> &Keypoint {
        let left = self.get(left);
        let right = self.get(right);
        if left.score >= right.score {
            left
        } else {
            right
        }
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::empty()
    }
}

/// Normalize a pixel row against the frame height into [0, 1] (0 = top).
///
/// Non-positive heights and non-finite inputs normalize to 0.
#[must_use]
pub fn normalize_y(y: f64, height: f64) -> f64 {
    if height.is_nan() || height <= 0.0 || !y.is_finite() {
        return 0.0;
    }
    (y / height).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_strings() {
        for name in KeypointName::ALL {
            assert_eq!(KeypointName::from_name(name.as_str()), Some(name));
        }
        assert_eq!(KeypointName::from_name("left_pinky"), None);
    }

    #[test]
    fn test_indices_follow_order() {
        for (i, name) in KeypointName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
    }

    #[test]
    fn test_empty_skeleton_is_complete() {
        let skeleton = Skeleton::empty();
        assert_eq!(skeleton.as_slice().len(), KeypointName::COUNT);
        assert!(skeleton.is_empty());
        assert_eq!(skeleton.max_score(), 0.0);
        for (kp, name) in skeleton.iter().zip(KeypointName::ALL) {
            assert_eq!(kp.name, name);
        }
    }

    #[test]
    fn test_score_clamped() {
        assert_eq!(Keypoint::new(KeypointName::Nose, 0.0, 0.0, 1.7).score, 1.0);
        assert_eq!(Keypoint::new(KeypointName::Nose, 0.0, 0.0, -0.2).score, 0.0);
        assert_eq!(Keypoint::new(KeypointName::Nose, 0.0, 0.0, f32::NAN).score, 0.0);
    }

    #[test]
    fn test_best_wrist() {
        let skeleton = Skeleton::from_keypoints([
            Keypoint::new(KeypointName::LeftWrist, 10.0, 20.0, 0.4),
            Keypoint::new(KeypointName::RightWrist, 30.0, 40.0, 0.8),
        ]);
        assert_eq!(skeleton.best_wrist().name, KeypointName::RightWrist);
        assert!((skeleton.max_score() - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_normalize_y() {
        assert_eq!(normalize_y(240.0, 480.0), 0.5);
        assert_eq!(normalize_y(960.0, 480.0), 1.0);
        assert_eq!(normalize_y(-5.0, 480.0), 0.0);
        assert_eq!(normalize_y(100.0, 0.0), 0.0);
        assert_eq!(normalize_y(100.0, -480.0), 0.0);
        assert_eq!(normalize_y(f64::NAN, 480.0), 0.0);
    }
}
