use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::detect::result::DetectionResult;
use crate::frame::CameraFrame;

pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Face model variant. `Short` targets faces within ~2 m of the camera,
/// which is the webcam case; `Full` handles faces further away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSelection {
    #[default]
    Short,
    Full,
}

impl ModelSelection {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelSelection::Short => "short",
            ModelSelection::Full => "full",
        }
    }
}

impl FromStr for ModelSelection {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(ModelSelection::Short),
            "full" => Ok(ModelSelection::Full),
            other => Err(anyhow!("unknown face model '{}' (expected short|full)", other)),
        }
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detector configuration. Fixed for the lifetime of a session and handed
/// to the backend as-is; the monitoring core does not interpret it.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorOptions {
    pub min_confidence: f32,
    pub model: ModelSelection,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            model: ModelSelection::Short,
        }
    }
}

/// Face detector collaborator.
///
/// A detector is moved onto the pipeline's worker thread when a session
/// starts and is only ever called from there, one frame at a time.
/// Implementations MUST NOT retain frame pixels beyond `detect`.
pub trait FaceDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one frame.
    fn detect(&mut self, frame: &CameraFrame) -> Result<DetectionResult>;

    /// Optional warm-up hook, run once on the worker before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release model resources. Called exactly once at session teardown.
    fn close(&mut self) {}
}

impl<D: FaceDetector + ?Sized> FaceDetector for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn detect(&mut self, frame: &CameraFrame) -> Result<DetectionResult> {
        (**self).detect(frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        (**self).warm_up()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_selection_parses_case_insensitively() {
        assert_eq!("Short".parse::<ModelSelection>().unwrap(), ModelSelection::Short);
        assert_eq!(" full ".parse::<ModelSelection>().unwrap(), ModelSelection::Full);
        assert!("long".parse::<ModelSelection>().is_err());
    }

    #[test]
    fn default_options_match_webcam_profile() {
        let options = DetectorOptions::default();
        assert_eq!(options.min_confidence, 0.5);
        assert_eq!(options.model, ModelSelection::Short);
    }
}
