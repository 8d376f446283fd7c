//! Output requests
//!
//! One request per stream kind. Each variant carries only the fields that
//! make sense for it, so e.g. a recording flag cannot be set on a photo
//! stream.

use crate::format::{HdrProfile, PixelFormat, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a caller-owned preview surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

/// Opaque handle to the frame processor attached to the video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameProcessorHandle(pub u64);

/// Stream kinds an output set can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    Preview,
    Photo,
    Video,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Preview => "preview",
            OutputKind::Photo => "photo",
            OutputKind::Video => "video",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low resolution repeating images rendered into a caller surface
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub surface: SurfaceHandle,
}

/// High quality still captures
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoRequest {
    #[serde(default)]
    pub target_size: Option<Size>,
    #[serde(default = "PhotoRequest::default_format")]
    pub format: PixelFormat,
}

impl PhotoRequest {
    fn default_format() -> PixelFormat {
        PixelFormat::Jpeg
    }
}

impl Default for PhotoRequest {
    fn default() -> Self {
        Self {
            target_size: None,
            format: Self::default_format(),
        }
    }
}

/// High resolution repeating images for recording and frame processing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRequest {
    #[serde(default)]
    pub target_size: Option<Size>,
    #[serde(default = "VideoRequest::default_format")]
    pub format: PixelFormat,
    #[serde(default)]
    pub enable_recording: bool,
    #[serde(default)]
    pub frame_processor: Option<FrameProcessorHandle>,
    #[serde(default)]
    pub hdr_profile: Option<HdrProfile>,
}

impl VideoRequest {
    fn default_format() -> PixelFormat {
        PixelFormat::Private
    }
}

impl Default for VideoRequest {
    fn default() -> Self {
        Self {
            target_size: None,
            format: Self::default_format(),
            enable_recording: false,
            frame_processor: None,
            hdr_profile: None,
        }
    }
}

/// A single output request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputRequest {
    Preview(PreviewRequest),
    Photo(PhotoRequest),
    Video(VideoRequest),
}

impl OutputRequest {
    pub fn kind(&self) -> OutputKind {
        match self {
            OutputRequest::Preview(_) => OutputKind::Preview,
            OutputRequest::Photo(_) => OutputKind::Photo,
            OutputRequest::Video(_) => OutputKind::Video,
        }
    }
}

impl From<PreviewRequest> for OutputRequest {
    fn from(request: PreviewRequest) -> Self {
        OutputRequest::Preview(request)
    }
}

impl From<PhotoRequest> for OutputRequest {
    fn from(request: PhotoRequest) -> Self {
        OutputRequest::Photo(request)
    }
}

impl From<VideoRequest> for OutputRequest {
    fn from(request: VideoRequest) -> Self {
        OutputRequest::Video(request)
    }
}
