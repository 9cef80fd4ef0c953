//! Rooms, event payloads, and the publisher seam.

use axum_helpers::auth::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A real-time subscription group.
///
/// Rooms are identity-scoped for clients and suppliers and role-scoped for
/// admins; their wire names are `client_<id>`, `supplier_<id>` and `admins`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    Client(Uuid),
    Supplier(Uuid),
    Admins,
}

impl Room {
    /// The room a given authenticated user belongs to.
    pub fn for_user(role: Role, user_id: Uuid) -> Self {
        match role {
            Role::Client => Room::Client(user_id),
            Role::Supplier => Room::Supplier(user_id),
            Role::Admin => Room::Admins,
        }
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::Client(id) => write!(f, "client_{}", id),
            Room::Supplier(id) => write!(f, "supplier_{}", id),
            Room::Admins => write!(f, "admins"),
        }
    }
}

/// Events pushed to connected clients.
///
/// Serialized as `{"event": "<name>", "data": {...}}` so browser clients can
/// dispatch on the `event` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum RealtimeEvent {
    #[serde(rename_all = "camelCase")]
    NewOrder {
        order_id: Uuid,
        total: f64,
        buyer_name: String,
        item_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    OrderStatusUpdate {
        order_id: Uuid,
        status: String,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    NewProblem {
        problem_id: Uuid,
        user_id: Uuid,
        email: String,
    },
}

/// A routed event as it travels through the hub.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub room: Room,
    pub event: RealtimeEvent,
}

/// Publisher seam injected into domain services.
///
/// Publishing is fire-and-forget: implementations log delivery problems but
/// never surface them to the caller.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, room: Room, event: RealtimeEvent);
}

/// Publisher that drops every event. Used in tests and one-off tooling.
#[derive(Debug, Clone, Default)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _room: Room, _event: RealtimeEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_wire_names() {
        let id = Uuid::parse_str("0195f1a0-0000-7000-8000-000000000001").unwrap();
        assert_eq!(
            Room::Supplier(id).to_string(),
            format!("supplier_{}", id)
        );
        assert_eq!(Room::Client(id).to_string(), format!("client_{}", id));
        assert_eq!(Room::Admins.to_string(), "admins");
        assert_eq!(Room::for_user(Role::Admin, id), Room::Admins);
    }

    #[test]
    fn new_order_event_wire_shape() {
        let event = RealtimeEvent::NewOrder {
            order_id: Uuid::nil(),
            total: 1000.0,
            buyer_name: "Labo Curie".to_string(),
            item_count: 1,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "newOrder");
        assert_eq!(json["data"]["total"], 1000.0);
        assert_eq!(json["data"]["buyerName"], "Labo Curie");
        assert_eq!(json["data"]["itemCount"], 1);
    }

    #[test]
    fn status_update_event_wire_shape() {
        let event = RealtimeEvent::OrderStatusUpdate {
            order_id: Uuid::nil(),
            status: "on route".to_string(),
            message: "Votre commande est en route".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "orderStatusUpdate");
        assert_eq!(json["data"]["status"], "on route");
    }

    #[test]
    fn new_problem_event_wire_shape() {
        let event = RealtimeEvent::NewProblem {
            problem_id: Uuid::nil(),
            user_id: Uuid::nil(),
            email: "client@lab.example".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "newProblem");
    }
}
