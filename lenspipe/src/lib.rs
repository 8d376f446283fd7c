//! # lenspipe - Camera Output Pipeline
//!
//! lenspipe turns a declarative description of the outputs a camera session
//! needs (a preview surface, still photos, video frames) into negotiated
//! streams, bounded buffer sources and sink deliveries, and hands processed
//! textures to the display loop without tearing.
//!
//! ## Key Features
//!
//! - **Capability negotiation**: closest-or-max size selection per output
//! - **Bounded delivery**: fixed buffer pools with latest-wins or next-in-line drop policies
//! - **All-or-nothing setup**: a failed configuration releases everything it opened
//! - **Lock-free render handoff**: single-slot texture exchange between producer and display
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lenspipe::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), lenspipe::LensError> {
//! let lens = LensPipe::init()?;
//! let capabilities = StaticCapabilities::from_json(r#"{ "cameras": {} }"#)?;
//!
//! let photo: Arc<dyn PhotoSink> = Arc::new(|frame: FrameBuffer| frame.release());
//! let mut session = lens.session(Arc::new(capabilities)).photo_sink(photo).build();
//!
//! let mut events = lens.events();
//! session.configure("0", OutputConfig::new().with_photo(PhotoRequest::default()))?;
//! while let Some(event) = events.next().await {
//!     println!("Output event: {:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use lenspipe_core::{
    closest_to_or_max, negotiate, negotiate_size, preview_size, CapabilityDescriptor,
    CapabilityError, ConfigurationError, ErrorCategory, FrameProcessorHandle, HdrProfile,
    LensError, LensResult, OutputKind, OutputRequest, PhotoRequest, PixelFormat, PreviewRequest,
    ResolvedOutput, Size, StaticCapabilities, StreamConfiguration, SurfaceHandle, VideoRequest,
    MAX_PREVIEW_SIZE,
};

pub use lenspipe_media::{
    render_queue, BufferProducer, BufferSource, BufferSourceFactory, Disposable, DropPolicy,
    FrameBuffer, FrameRenderQueue, NoopObserver, OutputConfig, OutputEvent, OutputObserver,
    OutputSet, OutputSetBuilder, OutputSetKey, PhotoSink, RenderConsumer, RenderQueueStats,
    SourceSpec, SourceStats, ThreadedSourceFactory, VideoSink,
};

#[cfg(feature = "diagnostics")]
pub use lenspipe_diagnostics::{DebugLogger, DeliveryMonitor, StreamCounters, TracingObserver};

// Public API modules
pub mod config;
pub mod event;
pub mod session;

// Re-export main API types
pub use config::GlobalConfig;
pub use event::{BroadcastObserver, EventStream};
pub use session::{CameraSession, CameraSessionBuilder, Reconfiguration};

use std::sync::Arc;
use tracing::info;

/// Main entry point for lenspipe
#[derive(Debug, Clone)]
pub struct LensPipe {
    inner: Arc<LensPipeInner>,
}

#[derive(Debug)]
struct LensPipeInner {
    config: GlobalConfig,
    factory: Arc<ThreadedSourceFactory>,
    events: BroadcastObserver,
}

impl LensPipe {
    /// Initialize lenspipe with default settings
    ///
    /// # Example
    /// ```rust,no_run
    /// use lenspipe::LensPipe;
    ///
    /// let lens = LensPipe::init()?;
    /// # Ok::<(), lenspipe::LensError>(())
    /// ```
    pub fn init() -> LensResult<Self> {
        Self::init_with(GlobalConfig::default())
    }

    /// Initialize with custom global configuration
    pub fn init_with(config: GlobalConfig) -> LensResult<Self> {
        if config.debug_logging {
            install_logging()?;
        }

        info!(
            "lenspipe initialized (delivery threads: {}-*)",
            config.delivery_thread_prefix
        );

        let factory = Arc::new(ThreadedSourceFactory::new(&config.delivery_thread_prefix));
        let events = BroadcastObserver::new(config.event_capacity);
        Ok(Self {
            inner: Arc::new(LensPipeInner {
                config,
                factory,
                events,
            }),
        })
    }

    /// The configuration this instance was initialized with
    pub fn config(&self) -> &GlobalConfig {
        &self.inner.config
    }

    /// Create a session builder for the camera described by `capabilities`.
    ///
    /// Sessions share this instance's delivery threads prefix and publish
    /// their events to [`LensPipe::events`].
    pub fn session(&self, capabilities: Arc<dyn CapabilityDescriptor>) -> CameraSessionBuilder {
        CameraSession::builder(capabilities)
            .source_factory(self.inner.factory.clone())
            .observer(Arc::new(self.inner.events.clone()))
    }

    /// Subscribe to output events of every session created from this instance
    pub fn events(&self) -> EventStream {
        self.inner.events.subscribe()
    }

    /// Buffer sources currently open across all sessions
    pub fn open_sources(&self) -> usize {
        self.inner.factory.open_sources()
    }
}

#[cfg(feature = "diagnostics")]
fn install_logging() -> LensResult<()> {
    DebugLogger::init_logging()
}

#[cfg(not(feature = "diagnostics"))]
fn install_logging() -> LensResult<()> {
    tracing::warn!("debug_logging requested but the diagnostics feature is disabled");
    Ok(())
}
