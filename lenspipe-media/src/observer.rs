//! Output events and the observer port they are reported through
//!
//! The pipeline never logs to a fixed sink itself beyond `tracing`
//! diagnostics; hosts inject an [`OutputObserver`] to count or forward
//! these events.

use crate::buffer_source::SourceStats;
use lenspipe_core::{OutputKind, PixelFormat, ResolvedOutput, Size};

/// Structured events emitted while configuring and running outputs
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// An output set was built and all of its sources are open
    ConfigurationApplied {
        /// Camera the outputs belong to
        camera_id: String,
        /// Resolved outputs, in preview/photo/video order
        outputs: Vec<ResolvedOutput>,
    },
    /// Building an output set failed and was rolled back
    ConfigurationFailed {
        /// Camera the outputs belong to
        camera_id: String,
        /// Rendered error
        error: String,
    },
    /// A buffer source started its delivery context
    SourceOpened {
        /// Camera the source belongs to
        camera_id: String,
        /// Stream the source feeds
        stream: OutputKind,
        /// Negotiated buffer size
        size: Size,
        /// Negotiated buffer format
        format: PixelFormat,
        /// Number of buffer slots
        capacity: usize,
    },
    /// A ready buffer was dropped because every slot was in use
    DeliveryDropped {
        /// Camera the source belongs to
        camera_id: String,
        /// Stream that dropped the buffer
        stream: OutputKind,
        /// Total drops on this source so far
        dropped: u64,
    },
    /// The sink panicked while handling a buffer; delivery carries on
    DeliveryFailed {
        /// Camera the source belongs to
        camera_id: String,
        /// Stream whose sink failed
        stream: OutputKind,
        /// Timestamp of the buffer being handled
        timestamp: u64,
        /// Panic message
        error: String,
    },
    /// A buffer source stopped delivering and released its pool
    SourceClosed {
        /// Camera the source belongs to
        camera_id: String,
        /// Stream the source fed
        stream: OutputKind,
        /// Final delivery counters
        stats: SourceStats,
    },
}

impl OutputEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            OutputEvent::ConfigurationApplied { .. } => "configuration_applied",
            OutputEvent::ConfigurationFailed { .. } => "configuration_failed",
            OutputEvent::SourceOpened { .. } => "source_opened",
            OutputEvent::DeliveryDropped { .. } => "delivery_dropped",
            OutputEvent::DeliveryFailed { .. } => "delivery_failed",
            OutputEvent::SourceClosed { .. } => "source_closed",
        }
    }

    /// Camera the event relates to
    pub fn camera_id(&self) -> &str {
        match self {
            OutputEvent::ConfigurationApplied { camera_id, .. }
            | OutputEvent::ConfigurationFailed { camera_id, .. }
            | OutputEvent::SourceOpened { camera_id, .. }
            | OutputEvent::DeliveryDropped { camera_id, .. }
            | OutputEvent::DeliveryFailed { camera_id, .. }
            | OutputEvent::SourceClosed { camera_id, .. } => camera_id,
        }
    }
}

/// Receiver of [`OutputEvent`]s.
///
/// Called from the control thread and from delivery threads, so
/// implementations must be cheap and must not block.
pub trait OutputObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &OutputEvent);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl OutputObserver for NoopObserver {
    fn on_event(&self, _event: &OutputEvent) {}
}

impl<F> OutputObserver for F
where
    F: Fn(&OutputEvent) + Send + Sync,
{
    fn on_event(&self, event: &OutputEvent) {
        self(event)
    }
}
