//! Event fan-out for async consumers
//!
//! [`BroadcastObserver`] plugs into the output pipeline as an ordinary
//! [`OutputObserver`] and republishes every event on a tokio broadcast
//! channel. Each [`EventStream`] is one subscriber of that channel.

use futures::stream::{self, Stream};
use lenspipe_media::{OutputEvent, OutputObserver};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{trace, warn};

/// Observer republishing events to every [`EventStream`]
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    sender: broadcast::Sender<OutputEvent>,
}

impl BroadcastObserver {
    /// Create an observer buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.sender.subscribe())
    }

    /// Number of live event streams
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl OutputObserver for BroadcastObserver {
    fn on_event(&self, event: &OutputEvent) {
        // Publishing with nobody listening is fine
        if self.sender.send(event.clone()).is_err() {
            trace!("No event subscribers for {}", event.event_type());
        }
    }
}

/// Stream of output events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<OutputEvent>,
    lagged: u64,
}

impl EventStream {
    /// Wrap a broadcast receiver
    pub fn new(receiver: broadcast::Receiver<OutputEvent>) -> Self {
        Self {
            receiver,
            lagged: 0,
        }
    }

    /// Get the next event from the stream.
    ///
    /// Returns `None` once every publisher is gone. Events overwritten
    /// because this stream fell behind are skipped and counted in
    /// [`EventStream::lagged`].
    pub async fn next(&mut self) -> Option<OutputEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => self.note_lag(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Try to get the next event without waiting
    pub fn try_next(&mut self) -> Option<OutputEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => self.note_lag(skipped),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Events skipped because this stream fell behind
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    /// Adapt into a [`futures::Stream`]
    pub fn into_stream(self) -> impl Stream<Item = OutputEvent> {
        stream::unfold(self, |mut events| async move {
            let event = events.next().await?;
            Some((event, events))
        })
    }

    fn note_lag(&mut self, skipped: u64) {
        warn!("Event stream fell behind, skipped {} events", skipped);
        self.lagged += skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lenspipe_core::OutputKind;

    fn dropped(count: u64) -> OutputEvent {
        OutputEvent::DeliveryDropped {
            camera_id: "0".to_string(),
            stream: OutputKind::Video,
            dropped: count,
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let observer = BroadcastObserver::new(4);
        observer.on_event(&dropped(1));
        assert_eq!(observer.subscriber_count(), 0);
    }

    #[test]
    fn test_try_next_in_order() {
        let observer = BroadcastObserver::new(4);
        let mut events = observer.subscribe();
        observer.on_event(&dropped(1));
        observer.on_event(&dropped(2));

        assert_eq!(events.try_next(), Some(dropped(1)));
        assert_eq!(events.try_next(), Some(dropped(2)));
        assert_eq!(events.try_next(), None);
    }

    #[test]
    fn test_lagging_stream_skips_oldest() {
        let observer = BroadcastObserver::new(2);
        let mut events = observer.subscribe();
        for count in 1..=5 {
            observer.on_event(&dropped(count));
        }

        assert_eq!(events.try_next(), Some(dropped(4)));
        assert_eq!(events.lagged(), 3);
    }

    #[tokio::test]
    async fn test_stream_ends_when_publisher_dropped() {
        let observer = BroadcastObserver::new(4);
        let mut events = observer.subscribe();
        observer.on_event(&dropped(1));
        drop(observer);

        assert_eq!(events.next().await, Some(dropped(1)));
        assert_eq!(events.next().await, None);
    }
}
