//! Broadcast bus for [`TurnEvent`]s.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::event::TurnEvent;

/// Default broadcast channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts [`TurnEvent`]s to every connected receiver.
///
/// One bus is shared per conversation; the orchestration loop publishes,
/// and any number of frontends subscribe.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<TurnEvent>>,
}

impl EventBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a specific capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; returns the number of receivers that got it.
    pub fn publish(&self, event: TurnEvent) -> usize {
        let event = Arc::new(event);
        trace!(event = event.name(), "publishing turn event");
        match self.sender.send(Arc::clone(&event)) {
            Ok(count) => {
                debug!(event = event.name(), receivers = count, "turn event published");
                count
            },
            Err(_) => {
                trace!(event = event.name(), "no receivers for turn event");
                0
            },
        }
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Current number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A receiver of [`TurnEvent`]s from an [`EventBus`].
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<TurnEvent>>,
}

impl EventReceiver {
    /// Await the next event. Returns `None` once the bus is closed.
    ///
    /// A lagging receiver that missed events logs a warning and keeps
    /// reading rather than terminating.
    pub async fn recv(&mut self) -> Option<Arc<TurnEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "turn event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_core::TokenCounts;

    #[tokio::test]
    async fn publish_then_receive_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(TurnEvent::TokenCounts {
            counts: TokenCounts::new(1, 2),
        });
        bus.publish(TurnEvent::FinalResponse {
            conversation: Vec::new(),
        });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.name(), "token_counts");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.name(), "final_response");
    }

    #[tokio::test]
    async fn no_receivers_returns_zero() {
        let bus = EventBus::new();
        let count = bus.publish(TurnEvent::Error {
            kind: gcs_core::ErrorKind::Cancelled,
            message: "cancelled".into(),
        });
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        bus.publish(TurnEvent::TokenCounts {
            counts: TokenCounts::default(),
        });
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }
}
