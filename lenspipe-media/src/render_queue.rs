//! Single-slot texture handoff between frame processing and display
//!
//! The frame processor pushes each rendered texture into a
//! [`FrameRenderQueue`]; the display loop calls [`RenderConsumer::tick`] once
//! per refresh to pick up the newest one. Both sides run at their own rate
//! and never block each other: the slot is a lock-free queue of capacity one.
//!
//! Every texture is disposed exactly once. A push that overwrites an
//! undisplayed texture disposes it right away; a tick that adopts a new
//! texture disposes the one it replaces on screen.

use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// GPU resource that must be released explicitly
pub trait Disposable: Send {
    /// Release the underlying resource
    fn dispose(self);
}

/// Counters of a render queue
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderQueueStats {
    /// Textures pushed by the producer
    pub pushed: u64,
    /// Textures overwritten before any tick picked them up
    pub skipped: u64,
}

/// Single slot holding the most recently rendered texture
pub struct FrameRenderQueue<T: Disposable> {
    slot: ArrayQueue<T>,
    pushed: AtomicU64,
    skipped: AtomicU64,
}

impl<T: Disposable> FrameRenderQueue<T> {
    pub fn new() -> Self {
        Self {
            slot: ArrayQueue::new(1),
            pushed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Hand a freshly rendered texture to the display side.
    ///
    /// If the slot still holds a texture no tick has taken yet, that texture
    /// is disposed here.
    pub fn push(&self, texture: T) {
        let displaced = self.slot.force_push(texture);
        self.pushed.fetch_add(1, Ordering::Relaxed);

        if let Some(skipped) = displaced {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            trace!("Render slot overwritten before display, disposing skipped texture");
            skipped.dispose();
        }
    }

    /// Take the texture in the slot, leaving it empty
    pub fn take(&self) -> Option<T> {
        self.slot.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_empty()
    }

    pub fn stats(&self) -> RenderQueueStats {
        RenderQueueStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

impl<T: Disposable> Default for FrameRenderQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Disposable> Drop for FrameRenderQueue<T> {
    fn drop(&mut self) {
        if let Some(texture) = self.take() {
            texture.dispose();
        }
    }
}

/// Display-side end of a [`FrameRenderQueue`], owning the texture on screen
pub struct RenderConsumer<T: Disposable> {
    queue: Arc<FrameRenderQueue<T>>,
    displayed: Option<T>,
    ticks: u64,
}

impl<T: Disposable> RenderConsumer<T> {
    pub fn new(queue: Arc<FrameRenderQueue<T>>) -> Self {
        Self {
            queue,
            displayed: None,
            ticks: 0,
        }
    }

    /// Called once per display refresh.
    ///
    /// Adopts the newest pushed texture, disposing the one it replaces.
    /// Returns `false` and keeps the current texture when nothing new was
    /// pushed.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;

        let Some(next) = self.queue.take() else {
            return false;
        };

        if let Some(previous) = self.displayed.take() {
            previous.dispose();
        }
        self.displayed = Some(next);
        true
    }

    /// The texture currently on screen
    pub fn displayed(&self) -> Option<&T> {
        self.displayed.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn queue(&self) -> &Arc<FrameRenderQueue<T>> {
        &self.queue
    }
}

impl<T: Disposable> Drop for RenderConsumer<T> {
    fn drop(&mut self) {
        if let Some(texture) = self.displayed.take() {
            texture.dispose();
        }
    }
}

/// Create a render queue and the consumer reading from it
pub fn render_queue<T: Disposable>() -> (Arc<FrameRenderQueue<T>>, RenderConsumer<T>) {
    let queue = Arc::new(FrameRenderQueue::new());
    let consumer = RenderConsumer::new(Arc::clone(&queue));
    (queue, consumer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct Texture {
        id: u32,
        disposed: Arc<Mutex<Vec<u32>>>,
    }

    impl Disposable for Texture {
        fn dispose(self) {
            self.disposed.lock().push(self.id);
        }
    }

    fn texture(id: u32, disposed: &Arc<Mutex<Vec<u32>>>) -> Texture {
        Texture {
            id,
            disposed: Arc::clone(disposed),
        }
    }

    #[test]
    fn test_tick_without_push_is_noop() {
        let (_queue, mut consumer) = render_queue::<Texture>();
        assert!(!consumer.tick());
        assert!(consumer.displayed().is_none());
        assert_eq!(consumer.ticks(), 1);
    }

    #[test]
    fn test_tick_keeps_displayed_when_empty() {
        let disposed = Arc::new(Mutex::new(Vec::new()));
        let (queue, mut consumer) = render_queue();

        queue.push(texture(1, &disposed));
        assert!(consumer.tick());
        assert!(!consumer.tick());
        assert_eq!(consumer.displayed().map(|t| t.id), Some(1));
        assert!(disposed.lock().is_empty());
    }

    #[test]
    fn test_tick_disposes_replaced_texture() {
        let disposed = Arc::new(Mutex::new(Vec::new()));
        let (queue, mut consumer) = render_queue();

        queue.push(texture(1, &disposed));
        consumer.tick();
        queue.push(texture(2, &disposed));
        consumer.tick();

        assert_eq!(consumer.displayed().map(|t| t.id), Some(2));
        assert_eq!(*disposed.lock(), vec![1]);
    }

    #[test]
    fn test_push_disposes_overwritten_texture() {
        let disposed = Arc::new(Mutex::new(Vec::new()));
        let (queue, mut consumer) = render_queue();

        queue.push(texture(1, &disposed));
        queue.push(texture(2, &disposed));
        queue.push(texture(3, &disposed));
        assert_eq!(*disposed.lock(), vec![1, 2]);

        assert!(consumer.tick());
        assert_eq!(consumer.displayed().map(|t| t.id), Some(3));
        assert_eq!(queue.stats(), RenderQueueStats { pushed: 3, skipped: 2 });
    }

    #[test]
    fn test_queue_shared_across_threads() {
        fn assert_send_sync<Q: Send + Sync>(_: &Q) {}

        let disposed = Arc::new(Mutex::new(Vec::new()));
        let (queue, mut consumer) = render_queue();
        assert_send_sync(&queue);

        let producer = {
            let queue = Arc::clone(&queue);
            let disposed = Arc::clone(&disposed);
            std::thread::spawn(move || queue.push(texture(7, &disposed)))
        };
        producer.join().unwrap();

        assert!(consumer.tick());
        assert_eq!(consumer.displayed().map(|t| t.id), Some(7));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drop_disposes_everything_once() {
        let disposed = Arc::new(Mutex::new(Vec::new()));
        {
            let (queue, mut consumer) = render_queue();
            queue.push(texture(1, &disposed));
            consumer.tick();
            queue.push(texture(2, &disposed));
        }
        let mut ids = disposed.lock().clone();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }
}
