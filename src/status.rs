//! Monitoring status and the reduction from detector output to status.
//!
//! Precedence, first match wins:
//!
//! 1. camera absent at start            -> "Camera not found"
//! 2. camera present but unreadable     -> "Camera not available"
//! 3. no face                           -> "Face not detected"
//! 4. more than one face                -> "Multiple faces detected!"
//! 5. one face, both gaze flags         -> "Looking in multiple directions - possible cheating"
//! 6. one face, looking left            -> "Looking left - possible cheating"
//! 7. one face, looking right           -> "Looking right - possible cheating"
//! 8. one face, neutral                 -> "Face detected"
//!
//! Rules 1 and 2 (and the start failure status) come from the frame source
//! via `From<&CameraError>`; `reduce` covers rules 3 to 8.

use std::fmt;

use crate::detect::DetectionResult;
use crate::gaze::{GazeClassifier, GazeJudgment};
use crate::ingest::CameraError;
use crate::landmarks;

/// The single current proctoring state shown to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonitoringStatus {
    CameraNotFound,
    CameraNotAvailable,
    CameraStartFailed,
    FaceNotDetected,
    MultipleFaces,
    LookingMultipleDirections,
    LookingLeft,
    LookingRight,
    FaceDetected,
}

impl MonitoringStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitoringStatus::CameraNotFound => "Camera not found",
            MonitoringStatus::CameraNotAvailable => "Camera not available",
            MonitoringStatus::CameraStartFailed => "Unable to start camera",
            MonitoringStatus::FaceNotDetected => "Face not detected",
            MonitoringStatus::MultipleFaces => "Multiple faces detected!",
            MonitoringStatus::LookingMultipleDirections => {
                "Looking in multiple directions - possible cheating"
            }
            MonitoringStatus::LookingLeft => "Looking left - possible cheating",
            MonitoringStatus::LookingRight => "Looking right - possible cheating",
            MonitoringStatus::FaceDetected => "Face detected",
        }
    }

    /// Statuses a proctor should review.
    pub fn is_flagged(self) -> bool {
        matches!(
            self,
            MonitoringStatus::MultipleFaces
                | MonitoringStatus::LookingMultipleDirections
                | MonitoringStatus::LookingLeft
                | MonitoringStatus::LookingRight
        )
    }

    /// Statuses that end a session before monitoring starts.
    pub fn is_device_error(self) -> bool {
        matches!(
            self,
            MonitoringStatus::CameraNotFound
                | MonitoringStatus::CameraNotAvailable
                | MonitoringStatus::CameraStartFailed
        )
    }
}

impl fmt::Display for MonitoringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&CameraError> for MonitoringStatus {
    fn from(err: &CameraError) -> Self {
        match err {
            CameraError::NotFound(_) => MonitoringStatus::CameraNotFound,
            CameraError::Unreadable { .. } | CameraError::Read(_) | CameraError::EndOfStream => {
                MonitoringStatus::CameraNotAvailable
            }
            CameraError::StartFailed(_) => MonitoringStatus::CameraStartFailed,
        }
    }
}

/// Map one detection result and its gaze judgment to a status.
///
/// Face count wins over gaze: with zero or several faces the judgment is
/// ignored.
pub fn reduce(result: &DetectionResult, judgment: GazeJudgment) -> MonitoringStatus {
    match result.face_count() {
        0 => MonitoringStatus::FaceNotDetected,
        1 => match (judgment.looking_left, judgment.looking_right) {
            (true, true) => MonitoringStatus::LookingMultipleDirections,
            (true, false) => MonitoringStatus::LookingLeft,
            (false, true) => MonitoringStatus::LookingRight,
            (false, false) => MonitoringStatus::FaceDetected,
        },
        _ => MonitoringStatus::MultipleFaces,
    }
}

/// Run extraction, classification and reduction on one detection result.
///
/// Landmarks are only read when exactly one face is present.
pub fn evaluate(result: &DetectionResult, classifier: &GazeClassifier) -> MonitoringStatus {
    let judgment = if result.face_count() == 1 {
        classifier.classify(&landmarks::extract(result))
    } else {
        GazeJudgment::NEUTRAL
    };
    reduce(result, judgment)
}
