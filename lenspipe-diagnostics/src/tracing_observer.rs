//! Observer that turns output events into tracing records

use lenspipe_media::{OutputEvent, OutputObserver};
use tracing::{error, info, warn};

/// Emits every [`OutputEvent`] as a structured tracing record
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    /// Create new tracing observer
    pub fn new() -> Self {
        Self
    }
}

impl OutputObserver for TracingObserver {
    fn on_event(&self, event: &OutputEvent) {
        let kind = event.event_type();
        match event {
            OutputEvent::ConfigurationApplied { camera_id, outputs } => {
                info!(event = kind, camera_id = %camera_id, outputs = outputs.len(), "outputs configured");
            }
            OutputEvent::ConfigurationFailed { camera_id, error } => {
                error!(event = kind, camera_id = %camera_id, error = %error, "output configuration failed");
            }
            OutputEvent::SourceOpened {
                camera_id,
                stream,
                size,
                format,
                capacity,
            } => {
                info!(
                    event = kind,
                    camera_id = %camera_id,
                    stream = %stream,
                    size = %size,
                    format = %format,
                    capacity = *capacity,
                    "buffer source opened"
                );
            }
            OutputEvent::DeliveryDropped {
                camera_id,
                stream,
                dropped,
            } => {
                warn!(event = kind, camera_id = %camera_id, stream = %stream, dropped = *dropped, "buffer dropped");
            }
            OutputEvent::DeliveryFailed {
                camera_id,
                stream,
                timestamp,
                error,
            } => {
                error!(
                    event = kind,
                    camera_id = %camera_id,
                    stream = %stream,
                    timestamp = *timestamp,
                    error = %error,
                    "sink failed"
                );
            }
            OutputEvent::SourceClosed {
                camera_id,
                stream,
                stats,
            } => {
                info!(
                    event = kind,
                    camera_id = %camera_id,
                    stream = %stream,
                    delivered = stats.delivered,
                    dropped = stats.dropped,
                    "buffer source closed"
                );
            }
        }
    }
}
