mod backend;
mod backends;
mod registry;
mod result;

pub use backend::{DetectorOptions, FaceDetector, ModelSelection, DEFAULT_MIN_CONFIDENCE};
pub use backends::{DetectorProbe, ScriptStep, ScriptedDetector};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use registry::{DetectorFactory, DetectorRegistry};
pub use result::{BoundingBox, Detection, DetectionResult, Landmark, LandmarkName, Point};
