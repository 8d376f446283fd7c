//! Camera capability descriptors
//!
//! A capability descriptor reports, per camera, which sizes each pixel
//! format can be streamed at. Devices provide their own implementation;
//! [`StaticCapabilities`] is an in-memory table used for tests and for
//! hosts that load capabilities from a file.

use crate::error::{ConfigurationError, LensError};
use crate::format::{PixelFormat, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Failure modes of a capability query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// No camera with this id exists
    #[error("Camera not found: {camera_id}")]
    NotFound {
        /// Camera identifier
        camera_id: String,
    },

    /// The camera exists but its characteristics could not be read
    #[error("Capabilities unavailable for {camera_id}: {reason}")]
    Unavailable {
        /// Camera identifier
        camera_id: String,
        /// Failure reason
        reason: String,
    },
}

impl From<CapabilityError> for LensError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::NotFound { camera_id } => {
                LensError::Configuration(ConfigurationError::UnknownCamera { camera_id })
            }
            CapabilityError::Unavailable { camera_id, reason } => {
                LensError::Capability { camera_id, reason }
            }
        }
    }
}

/// Supported output sizes per pixel format for one camera.
///
/// Entries keep the order the device listed them in; negotiation uses that
/// order to break ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfiguration {
    entries: Vec<(PixelFormat, Vec<Size>)>,
}

impl StreamConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the size list for a format
    pub fn with_format(mut self, format: PixelFormat, sizes: Vec<Size>) -> Self {
        match self.entries.iter_mut().find(|(f, _)| *f == format) {
            Some(entry) => entry.1 = sizes,
            None => self.entries.push((format, sizes)),
        }
        self
    }

    /// Sizes listed for `format`, or `None` if the format has no entry
    pub fn sizes_for(&self, format: PixelFormat) -> Option<&[Size]> {
        self.entries
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, sizes)| sizes.as_slice())
    }

    pub fn formats(&self) -> impl Iterator<Item = PixelFormat> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }
}

/// Device-reported stream capabilities
pub trait CapabilityDescriptor: Send + Sync {
    /// Read the full stream configuration map of a camera
    fn stream_configuration(&self, camera_id: &str)
        -> Result<StreamConfiguration, CapabilityError>;

    /// Ordered sizes supported for `format`; empty if the format is not listed
    fn supported_sizes(
        &self,
        camera_id: &str,
        format: PixelFormat,
    ) -> Result<Vec<Size>, CapabilityError> {
        let config = self.stream_configuration(camera_id)?;
        Ok(config.sizes_for(format).map(<[Size]>::to_vec).unwrap_or_default())
    }
}

/// In-memory capability table keyed by camera id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCapabilities {
    cameras: HashMap<String, StreamConfiguration>,
}

impl StaticCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, camera_id: &str, config: StreamConfiguration) -> Self {
        self.cameras.insert(camera_id.to_string(), config);
        self
    }

    /// Parse a capability table from JSON
    pub fn from_json(json: &str) -> Result<Self, LensError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn camera_ids(&self) -> impl Iterator<Item = &str> {
        self.cameras.keys().map(String::as_str)
    }
}

impl CapabilityDescriptor for StaticCapabilities {
    fn stream_configuration(
        &self,
        camera_id: &str,
    ) -> Result<StreamConfiguration, CapabilityError> {
        self.cameras
            .get(camera_id)
            .cloned()
            .ok_or_else(|| CapabilityError::NotFound {
                camera_id: camera_id.to_string(),
            })
    }
}
