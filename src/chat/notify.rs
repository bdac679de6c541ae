//! Unseen-activity notifications.

use serde::Serialize;

use super::protocol::Push;
use super::session::SessionRegistry;

/// Lightweight "you have unseen activity" signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Source room (room messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Whether the source is a private message.
    pub is_private: bool,
    /// Sender's username.
    pub sender: String,
    /// Truncated message body.
    pub preview: String,
    /// Target's unread count for the room (room messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u32>,
}

/// First `limit` characters of a body.
pub fn preview(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

/// Sends notifications, suppressing those about content the target sees.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    preview_length: usize,
}

impl NotificationDispatcher {
    /// Create a dispatcher with the given preview length.
    pub fn new(preview_length: usize) -> Self {
        Self { preview_length }
    }

    /// Notification about a room message.
    pub fn room_context(&self, room: &str, sender: &str, body: &str, unread: u32) -> Notification {
        Notification {
            room: Some(room.to_string()),
            is_private: false,
            sender: sender.to_string(),
            preview: preview(body, self.preview_length),
            unread_count: Some(unread),
        }
    }

    /// Notification about a private message.
    pub fn private_context(&self, sender: &str, body: &str) -> Notification {
        Notification {
            room: None,
            is_private: true,
            sender: sender.to_string(),
            preview: preview(body, self.preview_length),
            unread_count: None,
        }
    }

    /// Deliver a notification unless suppressed.
    ///
    /// Suppressed when the target is the sender, or when the target is
    /// already viewing the notification's room. Returns whether it was sent.
    pub fn notify(
        &self,
        registry: &SessionRegistry,
        target_id: &str,
        sender_id: &str,
        context: Notification,
    ) -> bool {
        if target_id == sender_id {
            return false;
        }
        let Some(target) = registry.lookup(target_id) else {
            return false;
        };
        if let Some(room) = &context.room {
            if !context.is_private && target.current_room == *room {
                return false;
            }
        }
        registry.deliver(target_id, Push::NewMessageNotification(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session::outbox;

    #[test]
    fn test_preview_truncates_by_chars() {
        assert_eq!(preview("hello", 3), "hel");
        assert_eq!(preview("héllo wörld", 7), "héllo w");
        assert_eq!(preview("hi", 50), "hi");
    }

    #[test]
    fn test_notify_suppression() {
        let mut registry = SessionRegistry::new();
        let (tx1, _rx1) = outbox();
        let (tx2, mut rx2) = outbox();
        registry.attach("s1", tx1);
        registry.attach("s2", tx2);
        registry.join("s1", "alice", "general").unwrap();
        registry.join("s2", "bob", "general").unwrap();

        let dispatcher = NotificationDispatcher::new(50);

        let ctx = dispatcher.room_context("general", "alice", "hi", 0);
        assert!(!dispatcher.notify(&registry, "s1", "s1", ctx.clone()));
        assert!(!dispatcher.notify(&registry, "s2", "s1", ctx));

        let ctx = dispatcher.room_context("tech", "alice", "hi", 1);
        assert!(dispatcher.notify(&registry, "s2", "s1", ctx));

        let ctx = dispatcher.private_context("alice", "psst");
        assert!(dispatcher.notify(&registry, "s2", "s1", ctx));

        let mut received = 0;
        while let Ok(push) = rx2.try_recv() {
            assert!(matches!(push, Push::NewMessageNotification(_)));
            received += 1;
        }
        assert_eq!(received, 2);
    }

    #[test]
    fn test_notification_serialize() {
        let dispatcher = NotificationDispatcher::new(4);
        let json = serde_json::to_value(dispatcher.private_context("alice", "hello")).unwrap();
        assert_eq!(json["is_private"], true);
        assert_eq!(json["preview"], "hell");
        assert!(json.get("room").is_none());
        assert!(json.get("unread_count").is_none());
    }
}
