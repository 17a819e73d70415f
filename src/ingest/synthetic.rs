//! Synthetic camera source.
//!
//! `stub://` URIs select this source. The host part picks a behaviour so the
//! camera failure paths can be exercised without hardware:
//!
//! - `stub://absent` fails `start()` with `CameraError::NotFound`
//! - `stub://unreadable` fails `start()` with `CameraError::Unreadable`
//! - `stub://broken` fails `start()` with `CameraError::StartFailed`
//! - anything else streams a moving gradient at the configured rate

use std::time::{Duration, Instant};

use super::{CameraConfig, CameraError, FrameSource};
use crate::frame::CameraFrame;

/// Frame source that generates frames in memory.
pub struct SyntheticSource {
    config: CameraConfig,
    streaming: bool,
    paced: bool,
    frame_limit: Option<u64>,
    frame_count: u64,
    next_due: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            streaming: false,
            paced: true,
            frame_limit: None,
            frame_count: 0,
            next_due: None,
        }
    }

    /// Deliver frames as fast as they are requested.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    /// End the stream after `limit` frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn behaviour(&self) -> &str {
        self.config
            .device
            .strip_prefix("stub://")
            .unwrap_or(&self.config.device)
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.config.fps.max(1)))
    }

    fn pace(&mut self) {
        if !self.paced {
            return;
        }
        let interval = self.frame_interval();
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
        }
        self.next_due = Some(due.max(now) + interval);
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let shift = (self.frame_count % 256) as usize;
        let mut pixels = vec![0u8; width * height * 3];
        for (i, px) in pixels.chunks_exact_mut(3).enumerate() {
            let x = i % width.max(1);
            let y = i / width.max(1);
            px[0] = ((x + shift) % 256) as u8;
            px[1] = (y % 256) as u8;
            px[2] = ((x + y) % 256) as u8;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn start(&mut self) -> Result<(), CameraError> {
        match self.behaviour() {
            "absent" => return Err(CameraError::NotFound(self.config.device.clone())),
            "unreadable" => {
                return Err(CameraError::Unreadable {
                    device: self.config.device.clone(),
                    reason: "synthetic device refuses capture".to_string(),
                })
            }
            "broken" => {
                return Err(CameraError::StartFailed(format!(
                    "{} failed to stream",
                    self.config.device
                )))
            }
            _ => {}
        }
        self.streaming = true;
        self.next_due = None;
        log::info!(
            "SyntheticSource: streaming {} ({}x{} @ {} fps)",
            self.config.device,
            self.config.width,
            self.config.height,
            self.config.fps
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<CameraFrame, CameraError> {
        if !self.streaming {
            return Err(CameraError::Read("synthetic source not started".to_string()));
        }
        if self.frame_limit.is_some_and(|limit| self.frame_count >= limit) {
            return Err(CameraError::EndOfStream);
        }
        self.pace();
        self.frame_count += 1;
        Ok(CameraFrame::rgb(
            self.generate_pixels(),
            self.config.width,
            self.config.height,
            self.frame_count,
        ))
    }

    fn stop(&mut self) {
        if self.streaming {
            self.streaming = false;
            log::info!(
                "SyntheticSource: stopped {} after {} frames",
                self.config.device,
                self.frame_count
            );
        }
    }

    fn describe(&self) -> String {
        format!("{} (synthetic)", self.config.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config(device: &str) -> CameraConfig {
        CameraConfig {
            device: device.to_string(),
            width: 8,
            height: 4,
            fps: 30,
        }
    }

    #[test]
    fn synthetic_source_produces_frames() {
        let mut source = SyntheticSource::new(stub_config("stub://webcam")).unpaced();
        source.start().unwrap();

        let frame = source.next_frame().unwrap();
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 4);
        assert_eq!(frame.byte_len(), 8 * 4 * 3);
        assert_eq!(frame.sequence, 1);
        assert_eq!(source.next_frame().unwrap().sequence, 2);
    }

    #[test]
    fn frames_require_start() {
        let mut source = SyntheticSource::new(stub_config("stub://webcam")).unpaced();
        assert!(matches!(source.next_frame(), Err(CameraError::Read(_))));
    }

    #[test]
    fn failure_uris_map_to_camera_errors() {
        let mut absent = SyntheticSource::new(stub_config("stub://absent"));
        assert!(matches!(absent.start(), Err(CameraError::NotFound(_))));

        let mut unreadable = SyntheticSource::new(stub_config("stub://unreadable"));
        assert!(matches!(
            unreadable.start(),
            Err(CameraError::Unreadable { .. })
        ));

        let mut broken = SyntheticSource::new(stub_config("stub://broken"));
        assert!(matches!(broken.start(), Err(CameraError::StartFailed(_))));
    }

    #[test]
    fn frame_limit_ends_stream() {
        let mut source = SyntheticSource::new(stub_config("stub://webcam"))
            .unpaced()
            .with_frame_limit(2);
        source.start().unwrap();
        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().is_ok());
        assert!(matches!(source.next_frame(), Err(CameraError::EndOfStream)));
        assert_eq!(source.frames_captured(), 2);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut source = SyntheticSource::new(stub_config("stub://webcam")).unpaced();
        source.start().unwrap();
        source.stop();
        source.stop();
        assert!(source.next_frame().is_err());
    }
}
