//! Gaze Proctor
//!
//! Camera-based proctoring for remote exams. A monitoring session samples one
//! camera frame every N, runs a face detector on it, and reduces the result to
//! a single human-readable status ("Face detected", "Looking left - possible
//! cheating", ...) that observers read from a status channel.
//!
//! # Module Structure
//!
//! - `frame`: Camera frames (pixels zeroized on drop, never persisted)
//! - `ingest`: Frame sources (synthetic, V4L2 webcams) and `CameraError`
//! - `detect`: Face detector trait, detection results, backend registry
//! - `sampling`: Frame sampling scheduler
//! - `landmarks`: Eye landmark extraction
//! - `gaze`: Gaze classification
//! - `status`: Status precedence and reduction
//! - `publish`: Published status channel
//! - `pipeline`: Session state machine and detector worker
//! - `config`: File and environment configuration

pub mod config;
pub mod detect;
pub mod frame;
pub mod gaze;
pub mod ingest;
pub mod landmarks;
pub mod pipeline;
pub mod publish;
pub mod sampling;
pub mod status;

pub use config::ProctorConfig;
pub use detect::{
    DetectionResult, DetectorOptions, DetectorRegistry, FaceDetector, ModelSelection,
    ScriptedDetector,
};
pub use frame::{CameraFrame, PixelFormat};
pub use gaze::{GazeClassifier, GazeDirection, GazeJudgment};
pub use ingest::{open_source, CameraConfig, CameraError, FrameSource, SyntheticSource};
#[cfg(feature = "ingest-v4l2")]
pub use ingest::V4l2Source;
pub use landmarks::EyePair;
pub use pipeline::{
    FrameDisposition, PipelineConfig, PipelineCoordinator, PipelineState, PipelineStats,
};
pub use publish::{StatusHandle, StatusPublisher};
pub use sampling::SamplingScheduler;
pub use status::MonitoringStatus;
