use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw output of one detector invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// One entry per face found in the frame, in detector order.
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn face_count(&self) -> usize {
        self.detections.len()
    }
}

/// One face reported by the detector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector confidence, passed through untouched.
    #[serde(default)]
    pub score: f32,
    /// Normalized face box, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

impl Detection {
    pub fn with_landmarks(landmarks: Vec<Landmark>) -> Self {
        Self {
            score: 1.0,
            bbox: None,
            landmarks,
        }
    }

    /// First landmark carrying `name`.
    pub fn landmark(&self, name: &LandmarkName) -> Option<&Landmark> {
        self.landmarks.iter().find(|landmark| &landmark.name == name)
    }
}

/// Normalized bounding box (0..1 relative to frame size).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Normalized 2-D point (0..1 relative to frame size).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A named facial keypoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: LandmarkName,
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(name: LandmarkName, x: f32, y: f32) -> Self {
        Self { name, x, y }
    }

    pub fn point(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

/// Keypoint names emitted by face detectors.
///
/// Names are the subject's own left/right, not the viewer's.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LandmarkName {
    LeftEye,
    RightEye,
    NoseTip,
    MouthCenter,
    LeftEarTragion,
    RightEarTragion,
    Other(String),
}

impl LandmarkName {
    pub fn as_str(&self) -> &str {
        match self {
            LandmarkName::LeftEye => "left_eye",
            LandmarkName::RightEye => "right_eye",
            LandmarkName::NoseTip => "nose_tip",
            LandmarkName::MouthCenter => "mouth_center",
            LandmarkName::LeftEarTragion => "left_ear_tragion",
            LandmarkName::RightEarTragion => "right_ear_tragion",
            LandmarkName::Other(name) => name,
        }
    }
}

impl From<&str> for LandmarkName {
    fn from(value: &str) -> Self {
        match value {
            "left_eye" => LandmarkName::LeftEye,
            "right_eye" => LandmarkName::RightEye,
            "nose_tip" => LandmarkName::NoseTip,
            "mouth_center" => LandmarkName::MouthCenter,
            "left_ear_tragion" => LandmarkName::LeftEarTragion,
            "right_ear_tragion" => LandmarkName::RightEarTragion,
            other => LandmarkName::Other(other.to_string()),
        }
    }
}

impl From<String> for LandmarkName {
    fn from(value: String) -> Self {
        LandmarkName::from(value.as_str())
    }
}

impl From<LandmarkName> for String {
    fn from(value: LandmarkName) -> Self {
        match value {
            LandmarkName::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LandmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
