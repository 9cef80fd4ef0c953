//! Broadcast hub shared by all websocket sessions.

use crate::event::{Envelope, EventPublisher, RealtimeEvent, Room};
use tokio::sync::broadcast;
use tracing::{debug, trace};

const DEFAULT_CAPACITY: usize = 256;

/// Single-process fan-out hub.
///
/// Every websocket session subscribes to the same broadcast channel and
/// filters envelopes by its joined rooms; publishing is a synchronous,
/// non-blocking send. Slow consumers lag and drop old events rather than
/// back-pressuring publishers.
#[derive(Clone)]
pub struct Hub {
    tx: broadcast::Sender<Envelope>,
}

impl Hub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the full event stream; callers filter by room.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Number of currently subscribed sessions.
    pub fn session_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for Hub {
    fn publish(&self, room: Room, event: RealtimeEvent) {
        match self.tx.send(Envelope { room: room.clone(), event }) {
            Ok(receivers) => {
                trace!("Published event to room {} ({} sessions)", room, receivers);
            }
            Err(_) => {
                // No connected sessions; durable notifications still cover delivery.
                debug!("No sessions connected, dropped event for room {}", room);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let hub = Hub::new();
        let mut rx = hub.subscribe();
        let supplier = Uuid::new_v4();

        hub.publish(
            Room::Supplier(supplier),
            RealtimeEvent::NewOrder {
                order_id: Uuid::new_v4(),
                total: 250.0,
                buyer_name: "Labo A".to_string(),
                item_count: 2,
            },
        );

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.room, Room::Supplier(supplier));
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let hub = Hub::new();
        assert_eq!(hub.session_count(), 0);

        // Must not panic or error
        hub.publish(
            Room::Admins,
            RealtimeEvent::NewProblem {
                problem_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                email: "x@lab.example".to_string(),
            },
        );
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_envelope() {
        let hub = Hub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        hub.publish(
            Room::Client(Uuid::new_v4()),
            RealtimeEvent::OrderStatusUpdate {
                order_id: Uuid::new_v4(),
                status: "arrived".to_string(),
                message: "Commande livrée".to_string(),
            },
        );

        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }
}
