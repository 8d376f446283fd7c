//! Caller-supplied output configuration

use lenspipe_core::{
    ConfigurationError, LensResult, OutputKind, OutputRequest, PhotoRequest, PreviewRequest,
    SurfaceHandle, VideoRequest,
};
use serde::{Deserialize, Serialize};

/// The outputs a camera session should stream to, at most one per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub preview: Option<PreviewRequest>,
    #[serde(default)]
    pub photo: Option<PhotoRequest>,
    #[serde(default)]
    pub video: Option<VideoRequest>,
}

impl OutputConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render preview frames into a caller-owned surface
    pub fn with_preview(mut self, surface: SurfaceHandle) -> Self {
        self.preview = Some(PreviewRequest { surface });
        self
    }

    pub fn with_photo(mut self, photo: PhotoRequest) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn with_video(mut self, video: VideoRequest) -> Self {
        self.video = Some(video);
        self
    }

    /// Build a configuration from tagged requests.
    ///
    /// Fails if the same kind of output is requested twice.
    pub fn from_requests(
        requests: impl IntoIterator<Item = OutputRequest>,
    ) -> Result<Self, ConfigurationError> {
        let mut config = Self::default();
        for request in requests {
            let kind = request.kind();
            let duplicate = match request {
                OutputRequest::Preview(r) => config.preview.replace(r).is_some(),
                OutputRequest::Photo(r) => config.photo.replace(r).is_some(),
                OutputRequest::Video(r) => config.video.replace(r).is_some(),
            };
            if duplicate {
                return Err(ConfigurationError::DuplicateOutput {
                    kind: kind.to_string(),
                });
            }
        }
        Ok(config)
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> LensResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Requests in preview, photo, video order
    pub fn requests(&self) -> Vec<OutputRequest> {
        let mut requests = Vec::with_capacity(3);
        if let Some(preview) = &self.preview {
            requests.push(OutputRequest::Preview(preview.clone()));
        }
        if let Some(photo) = &self.photo {
            requests.push(OutputRequest::Photo(photo.clone()));
        }
        if let Some(video) = &self.video {
            requests.push(OutputRequest::Video(video.clone()));
        }
        requests
    }

    pub fn contains(&self, kind: OutputKind) -> bool {
        match kind {
            OutputKind::Preview => self.preview.is_some(),
            OutputKind::Photo => self.photo.is_some(),
            OutputKind::Video => self.video.is_some(),
        }
    }

    /// Number of requested outputs
    pub fn len(&self) -> usize {
        [OutputKind::Preview, OutputKind::Photo, OutputKind::Video]
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
