//! Camera output sets
//!
//! An [`OutputSet`] is the resolved set of streams (preview, photo, video)
//! a camera session runs with. Building one negotiates every requested
//! output against the camera's capabilities and opens a buffer source for
//! the photo and video streams. Preview renders straight into the caller's
//! surface and owns no buffers.
//!
//! Two sets compare equal when they were requested the same way, regardless
//! of the sources they hold, so a session can skip reconfiguring when the
//! requested outputs did not change.

use crate::buffer_source::{
    BufferProducer, BufferSource, BufferSourceFactory, DeliveryFn, DropPolicy, SourceSpec,
    SourceStats, ThreadedSourceFactory,
};
use crate::config::OutputConfig;
use crate::observer::{NoopObserver, OutputEvent, OutputObserver};
use crate::sink::{PhotoSink, VideoSink};
use lenspipe_core::{
    negotiate, CapabilityDescriptor, FrameProcessorHandle, HdrProfile, LensError, LensResult,
    OutputKind, OutputRequest, PixelFormat, ResolvedOutput, Size, StreamConfiguration,
    SurfaceHandle,
};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{info, warn};

/// Buffer slots of the video stream
pub const VIDEO_OUTPUT_BUFFER_SIZE: usize = 3;
/// Buffer slots of the photo stream
pub const PHOTO_OUTPUT_BUFFER_SIZE: usize = 3;

/// Identity of an output set for change detection.
///
/// Covers the camera, whether a preview is attached, and the requested
/// photo and video parameters. Surfaces, sinks and open sources are not
/// part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputSetKey {
    pub camera_id: String,
    pub preview: bool,
    pub photo: Option<PhotoKey>,
    pub video: Option<VideoKey>,
}

/// Photo part of an [`OutputSetKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhotoKey {
    pub target_size: Option<Size>,
    pub format: PixelFormat,
}

/// Video part of an [`OutputSetKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoKey {
    pub enable_recording: bool,
    pub target_size: Option<Size>,
    pub format: PixelFormat,
}

impl OutputSetKey {
    pub fn new(camera_id: &str, config: &OutputConfig) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            preview: config.preview.is_some(),
            photo: config.photo.as_ref().map(|photo| PhotoKey {
                target_size: photo.target_size,
                format: photo.format,
            }),
            video: config.video.as_ref().map(|video| VideoKey {
                enable_recording: video.enable_recording,
                target_size: video.target_size,
                format: video.format,
            }),
        }
    }
}

#[derive(Debug)]
struct PreviewOutput {
    surface: SurfaceHandle,
    resolved: ResolvedOutput,
}

#[derive(Debug)]
struct SourceOutput {
    resolved: ResolvedOutput,
    source: BufferSource,
}

/// Builder for [`OutputSet`]
pub struct OutputSetBuilder {
    camera_id: String,
    config: OutputConfig,
    photo_sink: Option<Arc<dyn PhotoSink>>,
    video_sink: Option<Arc<dyn VideoSink>>,
    observer: Arc<dyn OutputObserver>,
    factory: Arc<dyn BufferSourceFactory>,
}

impl OutputSetBuilder {
    /// Sink receiving still captures (required with a photo output)
    pub fn photo_sink(mut self, sink: Arc<dyn PhotoSink>) -> Self {
        self.photo_sink = Some(sink);
        self
    }

    /// Sink receiving video frames (required with a video output)
    pub fn video_sink(mut self, sink: Arc<dyn VideoSink>) -> Self {
        self.video_sink = Some(sink);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn OutputObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Factory the photo and video sources are opened through
    pub fn source_factory(mut self, factory: Arc<dyn BufferSourceFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Negotiate every output and open its sources.
    ///
    /// On failure every source opened so far is closed before the error is
    /// returned.
    pub fn build(self, capabilities: &dyn CapabilityDescriptor) -> LensResult<OutputSet> {
        let Self {
            camera_id,
            config,
            photo_sink,
            video_sink,
            observer,
            factory,
        } = self;

        info!("Preparing outputs for camera {}...", camera_id);

        let mut set = OutputSet {
            camera_id,
            config,
            preview: None,
            photo: None,
            video: None,
            observer,
            closed: false,
        };

        let result = capabilities
            .stream_configuration(&set.camera_id)
            .map_err(LensError::from)
            .and_then(|stream_config| {
                set.open_outputs(&stream_config, photo_sink, video_sink, factory.as_ref())
            });

        if let Err(err) = result {
            warn!(
                "Failed to prepare outputs for camera {}: {}",
                set.camera_id, err
            );
            set.close();
            set.observer.on_event(&OutputEvent::ConfigurationFailed {
                camera_id: set.camera_id.clone(),
                error: err.to_string(),
            });
            return Err(err);
        }

        info!("Prepared {} outputs for camera {}!", set.size(), set.camera_id);
        set.observer.on_event(&OutputEvent::ConfigurationApplied {
            camera_id: set.camera_id.clone(),
            outputs: set.resolved_outputs(),
        });
        Ok(set)
    }
}

/// The active outputs of one camera session
pub struct OutputSet {
    camera_id: String,
    config: OutputConfig,
    preview: Option<PreviewOutput>,
    photo: Option<SourceOutput>,
    video: Option<SourceOutput>,
    observer: Arc<dyn OutputObserver>,
    closed: bool,
}

impl OutputSet {
    /// Start building an output set for `camera_id`
    pub fn builder(camera_id: &str, config: OutputConfig) -> OutputSetBuilder {
        OutputSetBuilder {
            camera_id: camera_id.to_string(),
            config,
            photo_sink: None,
            video_sink: None,
            observer: Arc::new(NoopObserver),
            factory: Arc::new(ThreadedSourceFactory::default()),
        }
    }

    fn open_outputs(
        &mut self,
        stream_config: &StreamConfiguration,
        photo_sink: Option<Arc<dyn PhotoSink>>,
        video_sink: Option<Arc<dyn VideoSink>>,
        factory: &dyn BufferSourceFactory,
    ) -> LensResult<()> {
        // Preview output: low resolution repeating images into the caller's surface
        if let Some(preview) = &self.config.preview {
            let resolved = negotiate(stream_config, &OutputRequest::Preview(preview.clone()))?;
            info!("Adding native preview output {}", resolved.size);
            self.preview = Some(PreviewOutput {
                surface: preview.surface,
                resolved,
            });
        }

        // Photo output: high quality still images, most recent wins
        if let Some(photo) = &self.config.photo {
            let resolved = negotiate(stream_config, &OutputRequest::Photo(photo.clone()))?;
            let sink = photo_sink.ok_or_else(|| missing_sink(OutputKind::Photo))?;
            let deliver: DeliveryFn = Box::new(move |frame| sink.on_photo_captured(frame));
            let source = factory.open(
                self.source_spec(resolved, PHOTO_OUTPUT_BUFFER_SIZE, DropPolicy::Latest),
                Arc::clone(&self.observer),
                deliver,
            )?;

            info!(
                "Adding {} photo output. (Format: {})",
                resolved.size, resolved.format
            );
            self.photo = Some(SourceOutput { resolved, source });
        }

        // Video output: high resolution repeating images for recording and frame processing
        if let Some(video) = &self.config.video {
            let resolved = negotiate(stream_config, &OutputRequest::Video(video.clone()))?;
            let sink = video_sink.ok_or_else(|| missing_sink(OutputKind::Video))?;
            let deliver: DeliveryFn = Box::new(move |frame| sink.on_video_frame_captured(frame));
            let source = factory.open(
                self.source_spec(resolved, VIDEO_OUTPUT_BUFFER_SIZE, DropPolicy::Next),
                Arc::clone(&self.observer),
                deliver,
            )?;

            info!(
                "Adding {} video output. (Format: {} | HDR: {:?} | Recording: {})",
                resolved.size, resolved.format, video.hdr_profile, video.enable_recording
            );
            self.video = Some(SourceOutput { resolved, source });
        }

        Ok(())
    }

    fn source_spec(&self, resolved: ResolvedOutput, capacity: usize, policy: DropPolicy) -> SourceSpec {
        SourceSpec {
            camera_id: self.camera_id.clone(),
            stream: resolved.kind,
            size: resolved.size,
            format: resolved.format,
            capacity,
            policy,
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    /// The configuration this set was built from
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Number of resolved outputs (0 to 3)
    pub fn size(&self) -> usize {
        usize::from(self.preview.is_some())
            + usize::from(self.photo.is_some())
            + usize::from(self.video.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn preview(&self) -> Option<&ResolvedOutput> {
        self.preview.as_ref().map(|p| &p.resolved)
    }

    pub fn photo(&self) -> Option<&ResolvedOutput> {
        self.photo.as_ref().map(|p| &p.resolved)
    }

    pub fn video(&self) -> Option<&ResolvedOutput> {
        self.video.as_ref().map(|v| &v.resolved)
    }

    /// Resolved outputs in preview, photo, video order
    pub fn resolved_outputs(&self) -> Vec<ResolvedOutput> {
        [self.preview(), self.photo(), self.video()]
            .into_iter()
            .flatten()
            .copied()
            .collect()
    }

    /// Caller surface the preview renders into
    pub fn preview_surface(&self) -> Option<SurfaceHandle> {
        self.preview.as_ref().map(|p| p.surface)
    }

    /// Capture target of the photo stream
    pub fn photo_producer(&self) -> Option<BufferProducer> {
        self.photo.as_ref().map(|p| p.source.producer())
    }

    /// Capture target of the video stream
    pub fn video_producer(&self) -> Option<BufferProducer> {
        self.video.as_ref().map(|v| v.source.producer())
    }

    pub fn photo_stats(&self) -> Option<SourceStats> {
        self.photo.as_ref().map(|p| p.source.stats())
    }

    pub fn video_stats(&self) -> Option<SourceStats> {
        self.video.as_ref().map(|v| v.source.stats())
    }

    pub fn frame_processor(&self) -> Option<FrameProcessorHandle> {
        self.config.video.as_ref().and_then(|v| v.frame_processor)
    }

    pub fn hdr_profile(&self) -> Option<HdrProfile> {
        self.config.video.as_ref().and_then(|v| v.hdr_profile)
    }

    /// Value identity used for equality
    pub fn key(&self) -> OutputSetKey {
        OutputSetKey::new(&self.camera_id, &self.config)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the photo and video sources. The preview surface belongs to
    /// the caller and is left alone. Calling this again is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(photo) = &mut self.photo {
            photo.source.close();
        }
        if let Some(video) = &mut self.video {
            video.source.close();
        }
    }
}

fn missing_sink(kind: OutputKind) -> LensError {
    LensError::InvalidState {
        message: format!("{} output requested without a {} sink", kind, kind),
    }
}

impl Drop for OutputSet {
    fn drop(&mut self) {
        self.close();
    }
}

impl PartialEq for OutputSet {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OutputSet {}

impl Hash for OutputSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for OutputSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outputs: Vec<String> = self
            .resolved_outputs()
            .iter()
            .map(ToString::to_string)
            .collect();
        write!(f, "[{}]", outputs.join(", "))
    }
}

impl fmt::Debug for OutputSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSet")
            .field("camera_id", &self.camera_id)
            .field("preview", &self.preview)
            .field("photo", &self.photo)
            .field("video", &self.video)
            .field("closed", &self.closed)
            .finish()
    }
}
