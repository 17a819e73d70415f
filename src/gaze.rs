//! Gaze classification from eye geometry.
//!
//! The horizontal separation `dx = right.x - left.x` between the eyes shifts
//! as the head turns. A symmetric deadband `threshold` around zero keeps a
//! roughly frontal face from being reported as directional.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::landmarks::EyePair;

/// Default deadband, in normalized frame units.
pub const DEFAULT_GAZE_THRESHOLD: f32 = 0.1;

/// Raw directional judgment. Both flags false means neutral or undetermined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazeJudgment {
    pub looking_left: bool,
    pub looking_right: bool,
}

/// Collapsed view of a judgment, for logs and displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GazeDirection {
    Neutral,
    Left,
    Right,
    /// Both flags set. Only reachable with a degenerate threshold.
    Ambiguous,
}

impl GazeJudgment {
    pub const NEUTRAL: GazeJudgment = GazeJudgment {
        looking_left: false,
        looking_right: false,
    };

    pub fn new(looking_left: bool, looking_right: bool) -> Self {
        Self {
            looking_left,
            looking_right,
        }
    }

    pub fn direction(self) -> GazeDirection {
        match (self.looking_left, self.looking_right) {
            (true, true) => GazeDirection::Ambiguous,
            (true, false) => GazeDirection::Left,
            (false, true) => GazeDirection::Right,
            (false, false) => GazeDirection::Neutral,
        }
    }
}

impl fmt::Display for GazeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GazeDirection::Neutral => "neutral",
            GazeDirection::Left => "left",
            GazeDirection::Right => "right",
            GazeDirection::Ambiguous => "ambiguous",
        };
        f.write_str(label)
    }
}

/// Classify gaze from an eye pair.
///
/// `looking_left` is `left.x < right.x - threshold` and `looking_right` is the
/// mirrored `right.x < left.x - threshold`, so swapping the eyes swaps the
/// flags. An absent eye gives a neutral judgment, not an error.
pub fn classify(pair: &EyePair, threshold: f32) -> GazeJudgment {
    let Some((left, right)) = pair.both() else {
        log::debug!(
            "gaze: eye landmark missing (left={:?}, right={:?})",
            pair.left_eye,
            pair.right_eye
        );
        return GazeJudgment::NEUTRAL;
    };

    let judgment = GazeJudgment {
        looking_left: left.x < right.x - threshold,
        looking_right: right.x < left.x - threshold,
    };
    log::debug!(
        "gaze: left_eye=({:.3}, {:.3}) right_eye=({:.3}, {:.3}) dx={:.3} -> {}",
        left.x,
        left.y,
        right.x,
        right.y,
        right.x - left.x,
        judgment.direction()
    );
    judgment
}

/// Gaze classifier bound to a fixed deadband.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GazeClassifier {
    threshold: f32,
}

impl GazeClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn classify(&self, pair: &EyePair) -> GazeJudgment {
        classify(pair, self.threshold)
    }
}

impl Default for GazeClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_GAZE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Point;

    fn pair(left_x: f32, right_x: f32) -> EyePair {
        EyePair::new(
            Some(Point { x: left_x, y: 0.5 }),
            Some(Point { x: right_x, y: 0.5 }),
        )
    }

    #[test]
    fn wide_positive_separation_is_left() {
        let judgment = classify(&pair(0.3, 0.6), 0.1);
        assert_eq!(judgment, GazeJudgment::new(true, false));
        assert_eq!(judgment.direction(), GazeDirection::Left);
    }

    #[test]
    fn swapping_eyes_swaps_the_flag() {
        let forward = classify(&pair(0.3, 0.6), 0.1);
        let swapped = classify(&pair(0.6, 0.3), 0.1);
        assert_eq!(forward.looking_left, swapped.looking_right);
        assert_eq!(forward.looking_right, swapped.looking_left);
        assert_eq!(swapped.direction(), GazeDirection::Right);
    }

    #[test]
    fn separation_inside_deadband_is_neutral() {
        assert_eq!(classify(&pair(0.45, 0.5), 0.1), GazeJudgment::NEUTRAL);
        assert_eq!(classify(&pair(0.5, 0.45), 0.1), GazeJudgment::NEUTRAL);
        assert_eq!(classify(&pair(0.5, 0.5), 0.0), GazeJudgment::NEUTRAL);
    }

    #[test]
    fn missing_eye_is_neutral() {
        let half = EyePair::new(None, Some(Point { x: 0.6, y: 0.5 }));
        assert_eq!(classify(&half, 0.1), GazeJudgment::NEUTRAL);
        assert_eq!(classify(&EyePair::default(), 0.1), GazeJudgment::NEUTRAL);
    }

    #[test]
    fn negative_threshold_can_set_both_flags() {
        let judgment = classify(&pair(0.5, 0.5), -0.1);
        assert_eq!(judgment.direction(), GazeDirection::Ambiguous);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = GazeClassifier::default();
        let input = pair(0.31, 0.58);
        let first = classifier.classify(&input);
        assert!((0..100).all(|_| classifier.classify(&input) == first));
        assert_eq!(classifier.threshold(), DEFAULT_GAZE_THRESHOLD);
    }
}
