//! Camera session holding the active output set
//!
//! A session keeps the sinks, observers and capability table a camera is
//! configured with, and rebuilds its [`OutputSet`] only when a new
//! configuration actually differs from the running one.

use lenspipe_core::{CapabilityDescriptor, LensResult};
use lenspipe_media::{
    BufferSourceFactory, OutputConfig, OutputEvent, OutputObserver, OutputSet, OutputSetKey,
    PhotoSink, ThreadedSourceFactory, VideoSink,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of [`CameraSession::configure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconfiguration {
    /// The requested outputs equal the running ones; nothing was touched
    Unchanged,
    /// The previous outputs were closed and new ones built
    Rebuilt,
}

/// Forwards each event to several observers in order
struct ObserverChain(Vec<Arc<dyn OutputObserver>>);

impl OutputObserver for ObserverChain {
    fn on_event(&self, event: &OutputEvent) {
        for observer in &self.0 {
            observer.on_event(event);
        }
    }
}

/// Builder for [`CameraSession`]
pub struct CameraSessionBuilder {
    capabilities: Arc<dyn CapabilityDescriptor>,
    photo_sink: Option<Arc<dyn PhotoSink>>,
    video_sink: Option<Arc<dyn VideoSink>>,
    observers: Vec<Arc<dyn OutputObserver>>,
    factory: Arc<dyn BufferSourceFactory>,
}

impl CameraSessionBuilder {
    /// Sink receiving still captures
    pub fn photo_sink(mut self, sink: Arc<dyn PhotoSink>) -> Self {
        self.photo_sink = Some(sink);
        self
    }

    /// Sink receiving video frames
    pub fn video_sink(mut self, sink: Arc<dyn VideoSink>) -> Self {
        self.video_sink = Some(sink);
        self
    }

    /// Add an observer; every added observer sees every event
    pub fn observer(mut self, observer: Arc<dyn OutputObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Factory the session opens buffer sources through
    pub fn source_factory(mut self, factory: Arc<dyn BufferSourceFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Create the session; no outputs are opened until it is configured
    pub fn build(self) -> CameraSession {
        let id = Uuid::new_v4();
        debug!("Created camera session {}", id);
        CameraSession {
            id,
            capabilities: self.capabilities,
            photo_sink: self.photo_sink,
            video_sink: self.video_sink,
            observer: Arc::new(ObserverChain(self.observers)),
            factory: self.factory,
            active: None,
        }
    }
}

/// A camera session and its currently running outputs
pub struct CameraSession {
    id: Uuid,
    capabilities: Arc<dyn CapabilityDescriptor>,
    photo_sink: Option<Arc<dyn PhotoSink>>,
    video_sink: Option<Arc<dyn VideoSink>>,
    observer: Arc<dyn OutputObserver>,
    factory: Arc<dyn BufferSourceFactory>,
    active: Option<OutputSet>,
}

impl CameraSession {
    /// Start building a session against `capabilities`
    pub fn builder(capabilities: Arc<dyn CapabilityDescriptor>) -> CameraSessionBuilder {
        CameraSessionBuilder {
            capabilities,
            photo_sink: None,
            video_sink: None,
            observers: Vec::new(),
            factory: Arc::new(ThreadedSourceFactory::default()),
        }
    }

    /// Unique id of this session, used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Apply `config` to `camera_id`.
    ///
    /// When the requested outputs equal the running ones the session is left
    /// alone. Otherwise the running outputs are closed first and a new set is
    /// built; if that fails the session ends up unconfigured.
    pub fn configure(&mut self, camera_id: &str, config: OutputConfig) -> LensResult<Reconfiguration> {
        let key = OutputSetKey::new(camera_id, &config);
        if let Some(active) = &self.active {
            if !active.is_closed() && active.key() == key {
                debug!("Session {}: outputs unchanged {}", self.id, active);
                return Ok(Reconfiguration::Unchanged);
            }
        }

        if let Some(mut previous) = self.active.take() {
            info!("Session {}: closing outputs {}", self.id, previous);
            previous.close();
        }

        let mut builder = OutputSet::builder(camera_id, config)
            .observer(Arc::clone(&self.observer))
            .source_factory(Arc::clone(&self.factory));
        if let Some(sink) = &self.photo_sink {
            builder = builder.photo_sink(Arc::clone(sink));
        }
        if let Some(sink) = &self.video_sink {
            builder = builder.video_sink(Arc::clone(sink));
        }

        let outputs = builder.build(self.capabilities.as_ref())?;
        info!("Session {}: running outputs {}", self.id, outputs);
        self.active = Some(outputs);
        Ok(Reconfiguration::Rebuilt)
    }

    /// The running outputs, if configured
    pub fn outputs(&self) -> Option<&OutputSet> {
        self.active.as_ref()
    }

    /// Whether outputs are running
    pub fn is_configured(&self) -> bool {
        self.active.is_some()
    }

    /// Sources currently open through this session's factory
    pub fn open_sources(&self) -> usize {
        self.factory.open_sources()
    }

    /// Close the running outputs. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut outputs) = self.active.take() {
            info!("Session {}: closing outputs {}", self.id, outputs);
            outputs.close();
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSession")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
