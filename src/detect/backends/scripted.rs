use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::detect::backend::FaceDetector;
use crate::detect::result::{Detection, DetectionResult, Landmark, LandmarkName};
use crate::frame::CameraFrame;

/// One scripted detector response.
#[derive(Clone, Debug)]
pub enum ScriptStep {
    /// Return this result.
    Detect(DetectionResult),
    /// Fail the call with this message.
    Fail(String),
    /// Block for the duration, then return the result.
    Stall(Duration, DetectionResult),
    /// Panic with this message, as a crashing native backend would.
    Panic(String),
}

/// Shared counters for observing a detector after it has moved to the
/// worker thread.
#[derive(Clone, Debug, Default)]
pub struct DetectorProbe {
    calls: Arc<AtomicU64>,
    warm_ups: Arc<AtomicU64>,
    closes: Arc<AtomicU64>,
}

impl DetectorProbe {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn warm_ups(&self) -> u64 {
        self.warm_ups.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Detector that replays a fixed script instead of running a model.
///
/// Used by tests and by the `stub` backend for demos without a model file.
/// The script repeats once exhausted; an empty script reports no faces.
pub struct ScriptedDetector {
    script: VecDeque<ScriptStep>,
    cursor: usize,
    probe: DetectorProbe,
    closed: bool,
}

impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            script: script.into_iter().collect(),
            cursor: 0,
            probe: DetectorProbe::default(),
            closed: false,
        }
    }

    /// Always return the same result.
    pub fn constant(result: DetectionResult) -> Self {
        Self::new([ScriptStep::Detect(result)])
    }

    /// A short loop through the states a proctor sees during an exam:
    /// centred face, glance left, glance right, face lost, second person.
    pub fn demo() -> Self {
        Self::new([
            ScriptStep::Detect(Self::single_face(0.55, 0.50)),
            ScriptStep::Detect(Self::single_face(0.55, 0.50)),
            ScriptStep::Detect(Self::single_face(0.30, 0.60)),
            ScriptStep::Detect(Self::single_face(0.62, 0.38)),
            ScriptStep::Detect(DetectionResult::empty()),
            ScriptStep::Detect(DetectionResult::new(vec![
                Self::eyes_detection(0.40, 0.45),
                Self::eyes_detection(0.70, 0.75),
            ])),
        ])
    }

    /// A detection with only the two eye keypoints, for building scripts.
    pub fn eyes_detection(left_x: f32, right_x: f32) -> Detection {
        Detection::with_landmarks(vec![
            Landmark::new(LandmarkName::LeftEye, left_x, 0.5),
            Landmark::new(LandmarkName::RightEye, right_x, 0.5),
        ])
    }

    /// A result holding one face with eyes at the given horizontal positions.
    pub fn single_face(left_x: f32, right_x: f32) -> DetectionResult {
        DetectionResult::new(vec![Self::eyes_detection(left_x, right_x)])
    }

    pub fn probe(&self) -> DetectorProbe {
        self.probe.clone()
    }

    fn next_step(&mut self) -> Option<ScriptStep> {
        if self.script.is_empty() {
            return None;
        }
        let step = self.script[self.cursor % self.script.len()].clone();
        self.cursor += 1;
        Some(step)
    }
}

impl FaceDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &CameraFrame) -> Result<DetectionResult> {
        if self.closed {
            return Err(anyhow!("scripted detector already closed"));
        }
        self.probe.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            None => Ok(DetectionResult::empty()),
            Some(ScriptStep::Detect(result)) => Ok(result),
            Some(ScriptStep::Fail(message)) => Err(anyhow!(message)),
            Some(ScriptStep::Stall(delay, result)) => {
                std::thread::sleep(delay);
                Ok(result)
            }
            Some(ScriptStep::Panic(message)) => panic!("{}", message),
        }
    }

    fn warm_up(&mut self) -> Result<()> {
        self.probe.warm_ups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.probe.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
