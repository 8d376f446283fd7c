//! # lenspipe diagnostics
//!
//! Logging setup and ready-made [`OutputObserver`](lenspipe_media::OutputObserver)
//! implementations for lenspipe.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod delivery_monitor;
pub mod tracing_observer;

// Re-export main types
pub use debug_logger::DebugLogger;
pub use delivery_monitor::{DeliveryMonitor, StreamCounters};
pub use tracing_observer::TracingObserver;
