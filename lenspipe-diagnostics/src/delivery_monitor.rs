//! Delivery counters per camera stream

use lenspipe_core::OutputKind;
use lenspipe_media::{OutputEvent, OutputObserver};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Event counts for one stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamCounters {
    /// Times a source was opened for the stream
    pub opened: u64,
    /// Times a source for the stream was closed
    pub closed: u64,
    /// Buffers dropped because the consumer fell behind
    pub dropped: u64,
    /// Buffers whose sink panicked
    pub failed: u64,
    /// Buffers delivered, as reported when sources closed
    pub delivered: u64,
}

/// Observer counting output events per stream
#[derive(Debug, Default)]
pub struct DeliveryMonitor {
    streams: RwLock<HashMap<OutputKind, StreamCounters>>,
    configurations: RwLock<(u64, u64)>,
}

impl DeliveryMonitor {
    /// Create new delivery monitor
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for `stream`
    pub fn counters(&self, stream: OutputKind) -> StreamCounters {
        self.streams.read().get(&stream).copied().unwrap_or_default()
    }

    /// Sources opened and not yet closed, across all streams
    pub fn open_sources(&self) -> u64 {
        self.streams
            .read()
            .values()
            .map(|c| c.opened.saturating_sub(c.closed))
            .sum()
    }

    /// Applied configurations
    pub fn configurations_applied(&self) -> u64 {
        self.configurations.read().0
    }

    /// Failed (rolled back) configurations
    pub fn configurations_failed(&self) -> u64 {
        self.configurations.read().1
    }
}

impl OutputObserver for DeliveryMonitor {
    fn on_event(&self, event: &OutputEvent) {
        match event {
            OutputEvent::ConfigurationApplied { .. } => self.configurations.write().0 += 1,
            OutputEvent::ConfigurationFailed { .. } => self.configurations.write().1 += 1,
            OutputEvent::SourceOpened { stream, .. } => {
                self.streams.write().entry(*stream).or_default().opened += 1;
            }
            OutputEvent::DeliveryDropped { stream, .. } => {
                self.streams.write().entry(*stream).or_default().dropped += 1;
            }
            OutputEvent::DeliveryFailed { stream, .. } => {
                self.streams.write().entry(*stream).or_default().failed += 1;
            }
            OutputEvent::SourceClosed { stream, stats, .. } => {
                let mut streams = self.streams.write();
                let counters = streams.entry(*stream).or_default();
                counters.closed += 1;
                counters.delivered += stats.delivered;
            }
        }
    }
}
