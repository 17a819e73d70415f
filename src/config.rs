use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{DetectorOptions, ModelSelection, DEFAULT_MIN_CONFIDENCE};
use crate::gaze::DEFAULT_GAZE_THRESHOLD;
use crate::ingest::CameraConfig;
use crate::pipeline::{PipelineConfig, DEFAULT_MAX_READ_FAILURES};
use crate::sampling::DEFAULT_SAMPLING_INTERVAL;

const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
const DEFAULT_CAMERA_WIDTH: u32 = 1280;
const DEFAULT_CAMERA_HEIGHT: u32 = 720;
const DEFAULT_CAMERA_FPS: u32 = 30;
const DEFAULT_DETECTOR_BACKEND: &str = "stub";
const DEFAULT_DETECTOR_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_RELEASE_TIMEOUT_MS: u64 = 1_000;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ProctorConfigFile {
    camera: Option<CameraConfigFile>,
    sampling: Option<SamplingConfigFile>,
    gaze: Option<GazeConfigFile>,
    detector: Option<DetectorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
    max_read_failures: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SamplingConfigFile {
    interval: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GazeConfigFile {
    threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    backend: Option<String>,
    min_confidence: Option<f32>,
    model: Option<ModelSelection>,
    model_path: Option<PathBuf>,
    timeout_ms: Option<u64>,
    release_timeout_ms: Option<u64>,
}

/// Fully resolved settings for one proctoring daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct ProctorConfig {
    pub camera: CameraSettings,
    pub sampling_interval: u32,
    pub gaze_threshold: f32,
    pub detector: DetectorSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub max_read_failures: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    /// Registry name of the detector backend.
    pub backend: String,
    pub min_confidence: f32,
    pub model: ModelSelection,
    pub model_path: Option<PathBuf>,
    pub timeout: Duration,
    pub release_timeout: Duration,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self::from_file(ProctorConfigFile::default())
    }
}

impl ProctorConfig {
    /// Defaults, then the file named by `PROCTOR_CONFIG`, then `PROCTOR_*`
    /// environment overrides. The result is validated.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PROCTOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ProctorConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        let detector = file.detector.unwrap_or_default();
        Self {
            camera: CameraSettings {
                device: camera
                    .device
                    .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
                width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
                fps: camera.fps.unwrap_or(DEFAULT_CAMERA_FPS),
                max_read_failures: camera
                    .max_read_failures
                    .unwrap_or(DEFAULT_MAX_READ_FAILURES),
            },
            sampling_interval: file
                .sampling
                .and_then(|sampling| sampling.interval)
                .unwrap_or(DEFAULT_SAMPLING_INTERVAL),
            gaze_threshold: file
                .gaze
                .and_then(|gaze| gaze.threshold)
                .unwrap_or(DEFAULT_GAZE_THRESHOLD),
            detector: DetectorSettings {
                backend: detector
                    .backend
                    .unwrap_or_else(|| DEFAULT_DETECTOR_BACKEND.to_string()),
                min_confidence: detector.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
                model: detector.model.unwrap_or_default(),
                model_path: detector.model_path,
                timeout: Duration::from_millis(
                    detector.timeout_ms.unwrap_or(DEFAULT_DETECTOR_TIMEOUT_MS),
                ),
                release_timeout: Duration::from_millis(
                    detector
                        .release_timeout_ms
                        .unwrap_or(DEFAULT_RELEASE_TIMEOUT_MS),
                ),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("PROCTOR_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(interval) = std::env::var("PROCTOR_SAMPLING_INTERVAL") {
            self.sampling_interval = interval.trim().parse().map_err(|_| {
                anyhow!("PROCTOR_SAMPLING_INTERVAL must be a positive integer frame count")
            })?;
        }
        if let Ok(threshold) = std::env::var("PROCTOR_GAZE_THRESHOLD") {
            self.gaze_threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("PROCTOR_GAZE_THRESHOLD must be a number"))?;
        }
        if let Ok(backend) = std::env::var("PROCTOR_DETECTOR_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("PROCTOR_DETECTOR_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(timeout) = std::env::var("PROCTOR_DETECTOR_TIMEOUT_MS") {
            let millis: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("PROCTOR_DETECTOR_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.detector.timeout = Duration::from_millis(millis);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera.device.trim().is_empty() {
            return Err(anyhow!("camera.device must not be empty"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        if self.camera.fps == 0 {
            return Err(anyhow!("camera.fps must be greater than zero"));
        }
        if self.camera.max_read_failures == 0 {
            return Err(anyhow!("camera.max_read_failures must be greater than zero"));
        }
        if self.sampling_interval == 0 {
            return Err(anyhow!("sampling.interval must be at least 1"));
        }
        if !self.gaze_threshold.is_finite() || self.gaze_threshold < 0.0 {
            return Err(anyhow!(
                "gaze.threshold must be a finite non-negative number, got {}",
                self.gaze_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.detector.min_confidence) {
            return Err(anyhow!(
                "detector.min_confidence must be within [0, 1], got {}",
                self.detector.min_confidence
            ));
        }
        if self.detector.timeout.is_zero() {
            return Err(anyhow!("detector.timeout_ms must be greater than zero"));
        }
        if self.detector.release_timeout.is_zero() {
            return Err(anyhow!("detector.release_timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            device: self.camera.device.clone(),
            width: self.camera.width,
            height: self.camera.height,
            fps: self.camera.fps,
        }
    }

    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            min_confidence: self.detector.min_confidence,
            model: self.detector.model,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sampling_interval: self.sampling_interval,
            gaze_threshold: self.gaze_threshold,
            detector: self.detector_options(),
            detector_timeout: self.detector.timeout,
            release_timeout: self.detector.release_timeout,
            max_read_failures: self.camera.max_read_failures,
        }
    }
}

fn read_config_file(path: &Path) -> Result<ProctorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ProctorConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.camera.device, "/dev/video0");
        assert_eq!(cfg.sampling_interval, 30);
        assert_eq!(cfg.detector.backend, "stub");
        assert_eq!(cfg.detector.timeout, Duration::from_secs(2));
        assert_eq!(cfg.pipeline_config(), PipelineConfig::default());
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let mut cfg = ProctorConfig::default();
        cfg.sampling_interval = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = ProctorConfig::default();
        cfg.gaze_threshold = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = ProctorConfig::default();
        cfg.gaze_threshold = -0.1;
        assert!(cfg.validate().is_err());

        let mut cfg = ProctorConfig::default();
        cfg.detector.min_confidence = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = ProctorConfig::default();
        cfg.camera.fps = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file: ProctorConfigFile =
            serde_json::from_str(r#"{ "gaze": { "threshold": 0.2 } }"#).unwrap();
        let cfg = ProctorConfig::from_file(file);
        assert_eq!(cfg.gaze_threshold, 0.2);
        assert_eq!(cfg.camera.width, 1280);
        assert_eq!(cfg.detector.model, ModelSelection::Short);
    }
}
