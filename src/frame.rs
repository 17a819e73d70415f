//! Camera frame handle.
//!
//! `CameraFrame` is the unit that flows from a frame source to the face
//! detector. The monitoring core never looks inside it: the scheduler only
//! counts frames and the coordinator only hands them to the detector worker.
//!
//! - Frames are transient. They are produced and consumed within one sampling
//!   cycle and are never buffered by the core.
//! - Frames are not `Clone`. A sampled frame moves to the detector worker and
//!   is dropped there.
//! - Pixel bytes are zeroized on drop to limit how long a subject's image sits
//!   in memory.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use zeroize::Zeroize;

use crate::ingest::normalize::normalize_to_rgb;

/// Pixel layout of a frame as delivered by the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgb24,
    Nv12,
    Yuyv,
}

impl PixelFormat {
    /// Expected byte length for a frame of the given dimensions.
    ///
    /// `None` when the size overflows or the layout cannot hold it: NV12
    /// subsamples chroma 2x2 and YUYV 2x1, so those need even dimensions.
    pub fn frame_len(self, width: u32, height: u32) -> Option<usize> {
        let pixels = (width as usize).checked_mul(height as usize)?;
        match self {
            PixelFormat::Rgb24 => pixels.checked_mul(3),
            PixelFormat::Nv12 if width % 2 != 0 || height % 2 != 0 => None,
            PixelFormat::Nv12 => pixels.checked_add(pixels / 2),
            PixelFormat::Yuyv if width % 2 != 0 => None,
            PixelFormat::Yuyv => pixels.checked_mul(2),
        }
    }
}

/// Opaque handle to one camera frame.
pub struct CameraFrame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Per-source capture counter, starting at 1.
    pub sequence: u64,
    captured_at: Instant,
}

impl CameraFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            format,
            sequence,
            captured_at: Instant::now(),
        }
    }

    pub fn rgb(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self::new(data, width, height, PixelFormat::Rgb24, sequence)
    }

    /// Raw pixel bytes in `format` layout. For detector backends only.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Pixels converted to packed RGB24.
    pub fn to_rgb(&self) -> Result<Vec<u8>> {
        normalize_to_rgb(&self.data, self.width, self.height, self.format)
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Time since capture.
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }
}

impl fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Drop for CameraFrame {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}
