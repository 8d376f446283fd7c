//! # lenspipe core
//!
//! Stream geometry, camera capability descriptors and output negotiation.
//! This crate has no runtime state: it decides which size and format each
//! requested camera output is streamed at.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod error;
#[allow(missing_docs)]
pub mod format;
pub mod negotiate;
#[allow(missing_docs)]
pub mod request;

// Re-export main types
pub use capability::{CapabilityDescriptor, CapabilityError, StaticCapabilities, StreamConfiguration};
pub use error::{ConfigurationError, ErrorCategory, LensError, LensResult};
pub use format::{HdrProfile, PixelFormat, Size};
pub use negotiate::{
    closest_to_or_max, negotiate, negotiate_size, preview_size, ResolvedOutput, MAX_PREVIEW_SIZE,
    PREVIEW_FORMAT,
};
pub use request::{
    FrameProcessorHandle, OutputKind, OutputRequest, PhotoRequest, PreviewRequest, SurfaceHandle,
    VideoRequest,
};
