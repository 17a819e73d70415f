//! Eye landmark extraction.

use crate::detect::{DetectionResult, LandmarkName, Point};

/// Eye positions taken from one detection. `None` means the detector did not
/// report that eye; it is never replaced by a default coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EyePair {
    pub left_eye: Option<Point>,
    pub right_eye: Option<Point>,
}

impl EyePair {
    pub fn new(left_eye: Option<Point>, right_eye: Option<Point>) -> Self {
        Self {
            left_eye,
            right_eye,
        }
    }

    /// Both eyes, when both were found.
    pub fn both(&self) -> Option<(Point, Point)> {
        self.left_eye.zip(self.right_eye)
    }
}

/// Locate the eyes of the first detection by landmark name.
///
/// Callers handle face-count conditions before calling this; an empty result
/// still yields an all-absent pair rather than a failure.
pub fn extract(result: &DetectionResult) -> EyePair {
    let Some(face) = result.detections.first() else {
        return EyePair::default();
    };
    EyePair {
        left_eye: face.landmark(&LandmarkName::LeftEye).map(|l| l.point()),
        right_eye: face.landmark(&LandmarkName::RightEye).map(|l| l.point()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, Landmark};

    fn result_with(landmarks: Vec<Landmark>) -> DetectionResult {
        DetectionResult::new(vec![Detection::with_landmarks(landmarks)])
    }

    #[test]
    fn eyes_are_found_by_name_not_position() {
        let result = result_with(vec![
            Landmark::new(LandmarkName::NoseTip, 0.5, 0.6),
            Landmark::new(LandmarkName::RightEye, 0.6, 0.5),
            Landmark::new(LandmarkName::MouthCenter, 0.5, 0.8),
            Landmark::new(LandmarkName::LeftEye, 0.3, 0.5),
        ]);
        let pair = extract(&result);
        assert_eq!(pair.left_eye, Some(Point { x: 0.3, y: 0.5 }));
        assert_eq!(pair.right_eye, Some(Point { x: 0.6, y: 0.5 }));
    }

    #[test]
    fn unnamed_landmarks_yield_absent_eyes() {
        let result = result_with(vec![
            Landmark::new(LandmarkName::Other("p0".into()), 0.3, 0.5),
            Landmark::new(LandmarkName::Other("p1".into()), 0.6, 0.5),
        ]);
        assert_eq!(extract(&result), EyePair::default());
    }

    #[test]
    fn single_missing_eye_stays_absent() {
        let result = result_with(vec![Landmark::new(LandmarkName::RightEye, 0.6, 0.5)]);
        let pair = extract(&result);
        assert!(pair.left_eye.is_none());
        assert_eq!(pair.right_eye, Some(Point { x: 0.6, y: 0.5 }));
        assert!(pair.both().is_none());
    }

    #[test]
    fn only_first_detection_is_read() {
        let mut result = result_with(vec![Landmark::new(LandmarkName::LeftEye, 0.1, 0.1)]);
        result.detections.push(Detection::with_landmarks(vec![Landmark::new(
            LandmarkName::RightEye,
            0.9,
            0.9,
        )]));
        let pair = extract(&result);
        assert!(pair.left_eye.is_some());
        assert!(pair.right_eye.is_none());
    }

    #[test]
    fn empty_result_does_not_fail() {
        assert_eq!(extract(&DetectionResult::empty()), EyePair::default());
    }
}
