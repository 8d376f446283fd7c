//! # lenspipe media
//!
//! Camera output sets, bounded buffer sources and the render handoff
//! between frame processing and display.
//!
//! An [`OutputSet`] resolves the preview, photo and video streams of one
//! camera session and owns a [`BufferSource`] per capture stream. Sources
//! deliver [`FrameBuffer`]s to the caller's [`PhotoSink`] and [`VideoSink`]
//! on their own threads. Independently, a [`FrameRenderQueue`] carries
//! processed textures to the display loop.

#![warn(clippy::all)]

pub mod buffer_source;
pub mod config;
pub mod frame;
pub mod observer;
pub mod outputs;
pub mod render_queue;
pub mod sink;

// Re-export main types
pub use buffer_source::{
    BufferProducer, BufferSource, BufferSourceFactory, DeliveryFn, DropPolicy, SourceSpec,
    SourceStats, ThreadedSourceFactory,
};
pub use config::OutputConfig;
pub use frame::FrameBuffer;
pub use observer::{NoopObserver, OutputEvent, OutputObserver};
pub use outputs::{
    OutputSet, OutputSetBuilder, OutputSetKey, PhotoKey, VideoKey, PHOTO_OUTPUT_BUFFER_SIZE,
    VIDEO_OUTPUT_BUFFER_SIZE,
};
pub use render_queue::{render_queue, Disposable, FrameRenderQueue, RenderConsumer, RenderQueueStats};
pub use sink::{PhotoSink, VideoSink};
