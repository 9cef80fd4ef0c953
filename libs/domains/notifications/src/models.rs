use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Newest-first page size for notification feeds
pub const FEED_LIMIT: i64 = 50;

/// What a notification is about, shown as a badge in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Order created or its delivery status changed
    Commande,
    /// Support ticket reported
    Probleme,
}

/// Durable notification addressed to a single user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// User whose action triggered the notification
    pub sender_id: Uuid,
    /// User the notification is addressed to
    pub receiver_id: Uuid,
    pub kind: NotificationKind,
    /// Human-readable message
    pub message: String,
    /// Whether the receiver has acknowledged the notification
    #[serde(default)]
    pub read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        sender_id: Uuid,
        receiver_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender_id,
            receiver_id,
            kind,
            message: message.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_notification_starts_unread() {
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let notification = Notification::new(
            sender,
            receiver,
            NotificationKind::Commande,
            "Nouvelle commande",
        );

        assert_eq!(notification.sender_id, sender);
        assert_eq!(notification.receiver_id, receiver);
        assert_eq!(notification.kind, NotificationKind::Commande);
        assert!(!notification.read);
        assert_eq!(notification.message, "Nouvelle commande");
    }

    #[test]
    fn kind_uses_lowercase_wire_tags() {
        assert_eq!(
            serde_json::to_value(NotificationKind::Commande).unwrap(),
            "commande"
        );
        assert_eq!(
            serde_json::to_value(NotificationKind::Probleme).unwrap(),
            "probleme"
        );
    }
}
