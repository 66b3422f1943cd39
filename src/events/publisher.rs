//! Fire-and-forget event publisher for step lifecycle events.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::types::FulfillmentEvent;

/// Broadcast-backed event publisher.
///
/// Emission never fails and never blocks: publishing with zero subscribers
/// is success, and a lagging subscriber drops its own backlog, not the
/// publisher. The persisted state transition is the source of truth, not
/// the notification.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Envelope delivered to subscribers.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub event: FulfillmentEvent,
    pub published_at: DateTime<Utc>,
}

impl EventPublisher {
    /// Create a publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: FulfillmentEvent) {
        let name = event.name();
        let envelope = PublishedEvent {
            event,
            published_at: Utc::now(),
        };
        match self.sender.send(envelope) {
            Ok(receivers) => {
                tracing::trace!(event = name, receivers, "published event");
            }
            Err(broadcast::error::SendError(_)) => {
                // No subscribers; acceptable for fire-and-forget emission.
                tracing::trace!(event = name, "published event with no subscribers");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_event() -> FulfillmentEvent {
        FulfillmentEvent::StepCompleted {
            order_id: Uuid::new_v4(),
            store_id: "store-1".to_string(),
            customer_email: "jo@example.com".to_string(),
            step_index: 0,
            step_name: "Pack".to_string(),
            completed_at: Utc::now(),
            progress_percent: 50,
            order_completed: false,
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::new(8);
        assert_eq!(publisher.subscriber_count(), 0);
        publisher.publish(sample_event());
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();
        publisher.publish(sample_event());

        let received = rx.recv().await.unwrap();
        let FulfillmentEvent::StepCompleted { step_name, .. } = received.event;
        assert_eq!(step_name, "Pack");
    }
}
