//! Bounded buffer sources
//!
//! A [`BufferSource`] owns the slots of one capture stream. The capture
//! hardware fills slots through a [`BufferProducer`]; each completed buffer
//! is a ready event handled on the source's own delivery thread, which
//! hands buffers to the stream's sink according to its [`DropPolicy`].
//!
//! A slot stays occupied from the moment a buffer completes until the sink
//! releases the delivered [`FrameBuffer`].

use crate::frame::FrameBuffer;
use crate::observer::{OutputEvent, OutputObserver};
use bytes::Bytes;
use lenspipe_core::{LensError, LensResult, OutputKind, PixelFormat, Size};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// How a source behaves when buffers complete faster than they are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropPolicy {
    /// Deliver only the most recently completed buffer, discarding older
    /// ones. Used for single still captures.
    Latest,
    /// Deliver every buffer in completion order; when all slots are taken
    /// the new buffer is dropped and reported.
    Next,
}

/// Delivery callback a source is bound to
pub type DeliveryFn = Box<dyn Fn(FrameBuffer) + Send + 'static>;

/// Parameters of one buffer source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub camera_id: String,
    pub stream: OutputKind,
    pub size: Size,
    pub format: PixelFormat,
    pub capacity: usize,
    pub policy: DropPolicy,
}

/// Delivery counters of a source
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    /// Buffers handed to the sink
    pub delivered: u64,
    /// Buffers dropped because every slot was in use (`Next` only)
    pub dropped: u64,
    /// Older buffers superseded by a newer one (`Latest` only)
    pub discarded: u64,
}

struct PendingFrame {
    timestamp: u64,
    data: Bytes,
}

struct PoolState {
    pending: VecDeque<PendingFrame>,
    /// Buffers delivered to the sink and not yet released
    outstanding: usize,
    closed: bool,
    ready_tx: Option<mpsc::UnboundedSender<()>>,
    stats: SourceStats,
}

struct Shared {
    spec: SourceSpec,
    state: Mutex<PoolState>,
    observer: Arc<dyn OutputObserver>,
}

enum SubmitOutcome {
    Queued,
    /// Queued after evicting an older pending buffer
    Replaced,
    /// Not queued: every slot is held by the sink
    Discarded,
    Dropped(u64),
    Closed,
}

impl SubmitOutcome {
    fn is_queued(&self) -> bool {
        matches!(self, SubmitOutcome::Queued | SubmitOutcome::Replaced)
    }
}

impl Shared {
    /// Queue completed buffers and raise one ready event per queued buffer.
    /// Wakeups go out only after the whole batch is in the pool.
    fn submit(&self, frames: impl IntoIterator<Item = PendingFrame>) {
        let outcomes: Vec<SubmitOutcome> = {
            let mut state = self.state.lock();
            let outcomes: Vec<SubmitOutcome> = frames
                .into_iter()
                .map(|frame| self.enqueue(&mut state, frame))
                .collect();

            if let Some(tx) = &state.ready_tx {
                for _ in outcomes.iter().filter(|o| o.is_queued()) {
                    if tx.send(()).is_err() {
                        error!(
                            "{} delivery thread for camera {} is gone, buffer stays pending",
                            self.spec.stream, self.spec.camera_id
                        );
                        break;
                    }
                }
            }
            outcomes
        };

        for outcome in outcomes {
            match outcome {
                SubmitOutcome::Queued => {}
                SubmitOutcome::Dropped(dropped) => {
                    warn!(
                        "Dropping {} buffer for camera {}: all {} slots in use, the consumer cannot keep up",
                        self.spec.stream, self.spec.camera_id, self.spec.capacity
                    );
                    self.observer.on_event(&OutputEvent::DeliveryDropped {
                        camera_id: self.spec.camera_id.clone(),
                        stream: self.spec.stream,
                        dropped,
                    });
                }
                SubmitOutcome::Replaced | SubmitOutcome::Discarded => {
                    debug!("Discarded stale {} buffer", self.spec.stream);
                }
                SubmitOutcome::Closed => {
                    debug!("Ignoring {} buffer, source is closed", self.spec.stream);
                }
            }
        }
    }

    fn enqueue(&self, state: &mut PoolState, frame: PendingFrame) -> SubmitOutcome {
        if state.closed {
            return SubmitOutcome::Closed;
        }

        let mut outcome = SubmitOutcome::Queued;
        if state.pending.len() + state.outstanding >= self.spec.capacity {
            match self.spec.policy {
                DropPolicy::Next => {
                    state.stats.dropped += 1;
                    return SubmitOutcome::Dropped(state.stats.dropped);
                }
                DropPolicy::Latest => {
                    state.stats.discarded += 1;
                    if state.pending.pop_front().is_none() {
                        return SubmitOutcome::Discarded;
                    }
                    outcome = SubmitOutcome::Replaced;
                }
            }
        }

        state.pending.push_back(frame);
        outcome
    }

    /// Take the buffer a ready event should deliver, if any
    fn acquire(self: &Arc<Self>) -> Option<FrameBuffer> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }

        let frame = match self.spec.policy {
            DropPolicy::Next => state.pending.pop_front()?,
            DropPolicy::Latest => {
                let latest = state.pending.pop_back()?;
                state.stats.discarded += state.pending.len() as u64;
                state.pending.clear();
                latest
            }
        };

        state.outstanding += 1;
        state.stats.delivered += 1;

        Some(FrameBuffer::leased(
            self.spec.format,
            self.spec.size,
            frame.timestamp,
            frame.data,
            BufferLease {
                shared: Arc::clone(self),
            },
        ))
    }

    /// Report a sink that panicked while handling a buffer
    fn delivery_failed(&self, timestamp: u64, payload: Box<dyn Any + Send>) {
        let message = panic_message(payload.as_ref());
        error!(
            "{} sink panicked on buffer (ts {}) for camera {}: {}",
            self.spec.stream, timestamp, self.spec.camera_id, message
        );
        self.observer.on_event(&OutputEvent::DeliveryFailed {
            camera_id: self.spec.camera_id.clone(),
            stream: self.spec.stream,
            timestamp,
            error: message,
        });
    }

    fn release_slot(&self) {
        let mut state = self.state.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Slot held by a delivered [`FrameBuffer`]
pub(crate) struct BufferLease {
    shared: Arc<Shared>,
}

impl BufferLease {
    pub(crate) fn release(self) {
        self.shared.release_slot();
    }
}

/// Handle the capture hardware uses to complete buffers into a source.
///
/// Producers stay valid after the source is closed; anything submitted then
/// is discarded.
#[derive(Clone)]
pub struct BufferProducer {
    shared: Arc<Shared>,
}

impl BufferProducer {
    /// Complete one buffer; raises one ready event
    pub fn submit(&self, timestamp: u64, data: Bytes) {
        self.shared.submit([PendingFrame { timestamp, data }]);
    }

    /// Complete several buffers back to back, before the delivery thread
    /// gets a chance to react to any of them
    pub fn submit_batch(&self, frames: impl IntoIterator<Item = (u64, Bytes)>) {
        self.shared.submit(
            frames
                .into_iter()
                .map(|(timestamp, data)| PendingFrame { timestamp, data }),
        );
    }

    pub fn stream(&self) -> OutputKind {
        self.shared.spec.stream
    }

    pub fn size(&self) -> Size {
        self.shared.spec.size
    }

    pub fn format(&self) -> PixelFormat {
        self.shared.spec.format
    }
}

impl std::fmt::Debug for BufferProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferProducer")
            .field("stream", &self.shared.spec.stream)
            .field("size", &self.shared.spec.size)
            .finish()
    }
}

/// Bounded pool of capture buffers with its own delivery thread
pub struct BufferSource {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    open_sources: Option<Arc<AtomicUsize>>,
}

impl BufferSource {
    /// Open a source and start its delivery thread
    pub fn open(
        spec: SourceSpec,
        observer: Arc<dyn OutputObserver>,
        deliver: DeliveryFn,
    ) -> LensResult<Self> {
        Self::open_named(spec, observer, deliver, "lenspipe")
    }

    pub(crate) fn open_named(
        spec: SourceSpec,
        observer: Arc<dyn OutputObserver>,
        deliver: DeliveryFn,
        thread_prefix: &str,
    ) -> LensResult<Self> {
        if spec.capacity == 0 {
            return Err(LensError::SourceCreation {
                stream: spec.stream.to_string(),
                reason: "capacity must be > 0".to_string(),
            });
        }
        if spec.size.area() == 0 {
            return Err(LensError::SourceCreation {
                stream: spec.stream.to_string(),
                reason: format!("invalid buffer size {}", spec.size),
            });
        }

        let (ready_tx, mut ready_rx) = mpsc::unbounded_channel::<()>();
        let shared = Arc::new(Shared {
            spec,
            state: Mutex::new(PoolState {
                pending: VecDeque::new(),
                outstanding: 0,
                closed: false,
                ready_tx: Some(ready_tx),
                stats: SourceStats::default(),
            }),
            observer,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(format!("{}-{}", thread_prefix, shared.spec.stream))
            .spawn(move || {
                while ready_rx.blocking_recv().is_some() {
                    if let Some(frame) = worker_shared.acquire() {
                        let timestamp = frame.timestamp();
                        debug!(
                            "Delivering {} buffer (ts {})",
                            worker_shared.spec.stream, timestamp
                        );
                        // The unwound frame releases its slot on drop.
                        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| deliver(frame))) {
                            worker_shared.delivery_failed(timestamp, payload);
                        }
                    }
                }
            })
            .map_err(|e| LensError::SourceCreation {
                stream: shared.spec.stream.to_string(),
                reason: format!("failed to spawn delivery thread: {}", e),
            })?;

        let spec = &shared.spec;
        info!(
            "Opened {} buffer source {} ({}), {} slots, {:?} policy",
            spec.stream, spec.size, spec.format, spec.capacity, spec.policy
        );
        shared.observer.on_event(&OutputEvent::SourceOpened {
            camera_id: spec.camera_id.clone(),
            stream: spec.stream,
            size: spec.size,
            format: spec.format,
            capacity: spec.capacity,
        });

        Ok(Self {
            shared,
            worker: Some(worker),
            open_sources: None,
        })
    }

    fn track_open(mut self, counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        self.open_sources = Some(counter);
        self
    }

    /// Handle for the capture hardware to complete buffers into
    pub fn producer(&self) -> BufferProducer {
        BufferProducer {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.shared.spec
    }

    /// Get current delivery counters
    pub fn stats(&self) -> SourceStats {
        self.shared.state.lock().stats
    }

    /// Buffers currently held by the sink
    pub fn outstanding(&self) -> usize {
        self.shared.state.lock().outstanding
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Stop delivering and release pooled buffers.
    ///
    /// A delivery already running on the delivery thread is allowed to
    /// finish; none starts after this returns. Safe to call repeatedly.
    pub fn close(&mut self) {
        let stats = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.ready_tx = None;
            state.pending.clear();
            state.stats
        };

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                debug!("Closing {} source from its own delivery thread", self.shared.spec.stream);
            } else if worker.join().is_err() {
                error!(
                    "{} delivery thread panicked before close",
                    self.shared.spec.stream
                );
            }
        }

        if let Some(counter) = self.open_sources.take() {
            counter.fetch_sub(1, Ordering::SeqCst);
        }

        let spec = &self.shared.spec;
        info!(
            "Closed {} buffer source ({} delivered, {} dropped)",
            spec.stream, stats.delivered, stats.dropped
        );
        self.shared.observer.on_event(&OutputEvent::SourceClosed {
            camera_id: spec.camera_id.clone(),
            stream: spec.stream,
            stats,
        });
    }
}

impl Drop for BufferSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for BufferSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSource")
            .field("spec", &self.shared.spec)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Creates the buffer sources of an output set
pub trait BufferSourceFactory: Send + Sync {
    /// Open a source bound to `deliver`
    fn open(
        &self,
        spec: SourceSpec,
        observer: Arc<dyn OutputObserver>,
        deliver: DeliveryFn,
    ) -> LensResult<BufferSource>;

    /// Number of sources opened by this factory and not yet closed
    fn open_sources(&self) -> usize;
}

/// Factory running each source on a dedicated named thread
#[derive(Debug, Clone)]
pub struct ThreadedSourceFactory {
    thread_prefix: String,
    open: Arc<AtomicUsize>,
}

impl ThreadedSourceFactory {
    pub fn new(thread_prefix: &str) -> Self {
        Self {
            thread_prefix: thread_prefix.to_string(),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Default for ThreadedSourceFactory {
    fn default() -> Self {
        Self::new("lenspipe")
    }
}

impl BufferSourceFactory for ThreadedSourceFactory {
    fn open(
        &self,
        spec: SourceSpec,
        observer: Arc<dyn OutputObserver>,
        deliver: DeliveryFn,
    ) -> LensResult<BufferSource> {
        let source = BufferSource::open_named(spec, observer, deliver, &self.thread_prefix)?;
        Ok(source.track_open(Arc::clone(&self.open)))
    }

    fn open_sources(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}
