//! Stream geometry and pixel format types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of a camera stream, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const VGA: Self = Self::new(640, 480);
    pub const HD: Self = Self::new(1280, 720);
    pub const FULL_HD: Self = Self::new(1920, 1080);

    /// Pixel count. Computed in `u64` so 16k sensors cannot overflow.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether this size fits inside `bounds` in both dimensions
    pub fn fits_within(&self, bounds: Size) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pixel formats a camera stream can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Compressed still image
    Jpeg,
    /// Implementation-defined GPU format, used for preview and video
    Private,
    /// Planar YUV 4:2:0
    Yuv420,
    /// Semi-planar YUV 4:2:0
    Nv12,
    /// 32-bit RGBA
    Rgba8888,
    /// Raw Bayer sensor data
    Raw16,
}

impl PixelFormat {
    pub fn is_compressed(&self) -> bool {
        matches!(self, PixelFormat::Jpeg)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Dynamic range profile requested for the video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HdrProfile {
    Hlg10,
    Hdr10,
    Hdr10Plus,
    DolbyVision,
}
