//! Error types for lenspipe
//!
//! Configuration failures are raised synchronously while an output set is
//! being built. Delivery-time problems never surface here: dropped buffers
//! are reported through the observer and close-time failures are logged.

use thiserror::Error;

/// Reasons an output request cannot be resolved against a camera
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The camera reports no stream entry for the requested format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        /// Requested pixel format
        format: String,
    },

    /// The camera lists the format but without any usable size
    #[error("No sizes available for format {format}")]
    NoSizesAvailable {
        /// Requested pixel format
        format: String,
    },

    /// The camera id is unknown to the capability descriptor
    #[error("Unknown camera: {camera_id}")]
    UnknownCamera {
        /// Camera identifier
        camera_id: String,
    },

    /// More than one request of the same kind was supplied
    #[error("Duplicate {kind} output requested")]
    DuplicateOutput {
        /// Output kind (preview, photo or video)
        kind: String,
    },
}

/// Main error type for lenspipe operations
#[derive(Error, Debug)]
pub enum LensError {
    /// Output negotiation failed
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Capability query failed for a reason other than an unknown camera
    #[error("Capability query failed for camera {camera_id}: {reason}")]
    Capability {
        /// Camera identifier
        camera_id: String,
        /// Failure reason
        reason: String,
    },

    /// A buffer source could not be created
    #[error("Failed to create {stream} buffer source: {reason}")]
    SourceCreation {
        /// Stream the source was meant for
        stream: String,
        /// Failure reason
        reason: String,
    },

    /// Invalid state for operation
    #[error("Invalid state: {message}")]
    InvalidState {
        /// State error message
        message: String,
    },

    /// Caller configuration could not be parsed
    #[error("Invalid configuration document: {source}")]
    Config {
        #[from]
        source: serde_json::Error,
    },
}

/// Result type alias for lenspipe operations
pub type LensResult<T> = Result<T, LensError>;

impl LensError {
    /// Check if error is recoverable by retrying with the same inputs
    pub fn is_recoverable(&self) -> bool {
        match self {
            LensError::Capability { .. } => true,
            LensError::SourceCreation { .. } => true,
            LensError::Configuration(_) => false,
            LensError::InvalidState { .. } => false,
            LensError::Config { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            LensError::Configuration(ConfigurationError::UnknownCamera { .. }) => {
                ErrorCategory::Device
            }
            LensError::Configuration(_) => ErrorCategory::Configuration,
            LensError::Capability { .. } => ErrorCategory::Device,
            LensError::SourceCreation { .. } => ErrorCategory::Resource,
            LensError::InvalidState { .. } => ErrorCategory::State,
            LensError::Config { .. } => ErrorCategory::Configuration,
        }
    }

    /// The configuration error carried by this error, if any
    pub fn configuration(&self) -> Option<&ConfigurationError> {
        match self {
            LensError::Configuration(err) => Some(err),
            _ => None,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Output negotiation and caller configuration errors
    Configuration,
    /// Camera and capability errors
    Device,
    /// Capture resource allocation errors
    Resource,
    /// State management errors
    State,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let unknown: LensError = ConfigurationError::UnknownCamera {
            camera_id: "7".to_string(),
        }
        .into();
        assert_eq!(unknown.category(), ErrorCategory::Device);
        assert!(!unknown.is_recoverable());

        let creation = LensError::SourceCreation {
            stream: "video".to_string(),
            reason: "out of buffers".to_string(),
        };
        assert_eq!(creation.category(), ErrorCategory::Resource);
        assert!(creation.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = LensError::from(ConfigurationError::NoSizesAvailable {
            format: "Jpeg".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Configuration error: No sizes available for format Jpeg"
        );
    }

    #[test]
    fn test_configuration_accessor() {
        let error = LensError::from(ConfigurationError::UnsupportedFormat {
            format: "Raw16".to_string(),
        });
        assert!(matches!(
            error.configuration(),
            Some(ConfigurationError::UnsupportedFormat { .. })
        ));

        let state = LensError::InvalidState {
            message: "closed".to_string(),
        };
        assert!(state.configuration().is_none());
    }
}
