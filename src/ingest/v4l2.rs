//! V4L2 webcam source.
//!
//! This module provides `V4l2Source` for sampling a local UVC webcam.
//!
//! The V4L2 source is responsible for:
//! - Opening the device node (e.g., /dev/video0)
//! - Negotiating a frame size and a pixel format the pipeline can convert
//! - Capturing frames in-memory through an mmap buffer stream
//! - Releasing the device on `stop()`
//!
//! Start-time failures are classified so the proctor sees the right status:
//! a missing node is `NotFound`, a node that cannot be opened or offers no
//! usable format is `Unreadable`, and a stream that fails to come up is
//! `StartFailed`.

use ouroboros::self_referencing;
use std::path::Path;
use std::time::Instant;

use super::{CameraConfig, CameraError, FrameSource};
use crate::frame::{CameraFrame, PixelFormat};

/// V4L2 frame source.
pub struct V4l2Source {
    config: CameraConfig,
    state: Option<V4l2State>,
    format: PixelFormat,
    frame_count: u64,
    last_frame_at: Option<Instant>,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            format: PixelFormat::Yuyv,
            frame_count: 0,
            last_frame_at: None,
        }
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn unreadable(&self, reason: impl ToString) -> CameraError {
        CameraError::Unreadable {
            device: self.config.device.clone(),
            reason: reason.to_string(),
        }
    }
}

fn pixel_format_for(fourcc: &v4l::FourCC) -> Option<PixelFormat> {
    match &fourcc.repr {
        b"YUYV" => Some(PixelFormat::Yuyv),
        b"RGB3" => Some(PixelFormat::Rgb24),
        b"NV12" => Some(PixelFormat::Nv12),
        _ => None,
    }
}

impl FrameSource for V4l2Source {
    fn start(&mut self) -> Result<(), CameraError> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        if !Path::new(&self.config.device).exists() {
            return Err(CameraError::NotFound(self.config.device.clone()));
        }

        let mut device =
            v4l::Device::with_path(&self.config.device).map_err(|err| self.unreadable(err))?;
        let mut format = device.format().map_err(|err| self.unreadable(err))?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"YUYV");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device.format().map_err(|err| self.unreadable(err))?
            }
        };
        let pixel_format = pixel_format_for(&format.fourcc).ok_or_else(|| {
            self.unreadable(format!("unsupported pixel format {}", format.fourcc))
        })?;

        if self.config.fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Source: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
            },
        }
        .try_build()
        .map_err(|err| CameraError::StartFailed(format!("create buffer stream: {}", err)))?;

        self.state = Some(state);
        self.format = pixel_format;
        self.active_width = format.width;
        self.active_height = format.height;

        log::info!(
            "V4l2Source: streaming {} ({}x{} {:?})",
            self.config.device,
            self.active_width,
            self.active_height,
            self.format
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<CameraFrame, CameraError> {
        use v4l::io::traits::CaptureStream;

        let state = self
            .state
            .as_mut()
            .ok_or_else(|| CameraError::Read("v4l2 device not started".to_string()))?;
        let data = state
            .with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()))
            .map_err(|err| CameraError::Read(err.to_string()))?;

        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());

        Ok(CameraFrame::new(
            data,
            self.active_width,
            self.active_height,
            self.format,
            self.frame_count,
        ))
    }

    fn stop(&mut self) {
        if self.state.take().is_some() {
            log::info!(
                "V4l2Source: released {} after {} frames",
                self.config.device,
                self.frame_count
            );
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} ({}x{} @ {} fps)",
            self.config.device, self.active_width, self.active_height, self.config.fps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_is_not_found() {
        let mut source = V4l2Source::new(CameraConfig {
            device: "/dev/does-not-exist-video99".to_string(),
            ..CameraConfig::default()
        });
        assert!(matches!(source.start(), Err(CameraError::NotFound(_))));
    }

    #[test]
    fn frames_require_start() {
        let mut source = V4l2Source::new(CameraConfig::default());
        assert!(matches!(source.next_frame(), Err(CameraError::Read(_))));
        source.stop();
    }

    #[test]
    fn known_fourccs_map_to_pixel_formats() {
        assert_eq!(
            pixel_format_for(&v4l::FourCC::new(b"YUYV")),
            Some(PixelFormat::Yuyv)
        );
        assert_eq!(pixel_format_for(&v4l::FourCC::new(b"MJPG")), None);
    }
}
