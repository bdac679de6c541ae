//! Chat message model.
//!
//! Messages are immutable once created except for their reaction and
//! read-receipt annotations, which the aggregator mutates in place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{ParlorError, Result};

/// Globally unique message identifier (UUID v4).
pub type MessageId = String;

/// Message type tag as sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    #[default]
    Text,
    /// Inline image.
    Image,
    /// Arbitrary file.
    File,
}

impl MessageKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::File => "file",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attachment sent alongside image and file messages.
///
/// `data` is opaque (a data URL, a link, ...) and is passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    /// File name.
    #[serde(default)]
    pub name: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: Option<u64>,
    /// MIME type.
    #[serde(default, alias = "type")]
    pub mime: Option<String>,
    /// Opaque payload.
    #[serde(alias = "url")]
    pub data: String,
}

/// Message content, discriminated by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessageContent {
    /// Plain text.
    Text {
        /// Message text.
        body: String,
    },
    /// Inline image.
    Image {
        /// Caption.
        body: String,
        /// Opaque image data.
        data: String,
    },
    /// File attachment.
    File {
        /// Caption.
        body: String,
        /// File name.
        name: String,
        /// Size in bytes.
        size: u64,
        /// MIME type.
        mime: String,
        /// Opaque file data.
        data: String,
    },
}

impl MessageContent {
    /// Create text content.
    pub fn text(body: impl Into<String>) -> Self {
        MessageContent::Text { body: body.into() }
    }

    /// Build content from the loosely structured fields of a client command.
    pub fn from_parts(kind: MessageKind, body: String, payload: Option<FilePayload>) -> Result<Self> {
        match kind {
            MessageKind::Text => {
                if body.trim().is_empty() {
                    return Err(ParlorError::InvalidPayload("message body is empty".to_string()));
                }
                Ok(MessageContent::Text { body })
            }
            MessageKind::Image => {
                let payload = payload
                    .filter(|p| !p.data.is_empty())
                    .ok_or_else(|| ParlorError::InvalidPayload("image data is missing".to_string()))?;
                Ok(MessageContent::Image {
                    body,
                    data: payload.data,
                })
            }
            MessageKind::File => {
                let payload = payload
                    .ok_or_else(|| ParlorError::InvalidPayload("file payload is missing".to_string()))?;
                let name = payload
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .ok_or_else(|| ParlorError::InvalidPayload("file name is missing".to_string()))?;
                let mime = payload
                    .mime
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&name)
                            .first_or_octet_stream()
                            .to_string()
                    });
                Ok(MessageContent::File {
                    body,
                    name,
                    size: payload.size.unwrap_or(0),
                    mime,
                    data: payload.data,
                })
            }
        }
    }

    /// Get the kind tag.
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageContent::Text { .. } => MessageKind::Text,
            MessageContent::Image { .. } => MessageKind::Image,
            MessageContent::File { .. } => MessageKind::File,
        }
    }

    /// Text body or caption.
    pub fn body(&self) -> &str {
        match self {
            MessageContent::Text { body }
            | MessageContent::Image { body, .. }
            | MessageContent::File { body, .. } => body,
        }
    }
}

/// Emoji reactions: emoji -> usernames in the order they reacted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reactions(BTreeMap<String, Vec<String>>);

impl Reactions {
    /// Add a reaction. Returns false if the user already reacted with this emoji.
    pub fn add(&mut self, emoji: &str, username: &str) -> bool {
        let users = self.0.entry(emoji.to_string()).or_default();
        if users.iter().any(|u| u == username) {
            return false;
        }
        users.push(username.to_string());
        true
    }

    /// Retract a reaction. Returns false if there was nothing to remove.
    pub fn remove(&mut self, emoji: &str, username: &str) -> bool {
        let Some(users) = self.0.get_mut(emoji) else {
            return false;
        };
        let before = users.len();
        users.retain(|u| u != username);
        let removed = users.len() != before;
        if users.is_empty() {
            self.0.remove(emoji);
        }
        removed
    }

    /// Usernames that reacted with `emoji`.
    pub fn users(&self, emoji: &str) -> &[String] {
        self.0.get(emoji).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct emoji.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no reactions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read receipts: session id -> time the session marked the message read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadReceipts(BTreeMap<String, DateTime<Utc>>);

impl ReadReceipts {
    /// Record (or overwrite) a session's read time.
    pub fn mark(&mut self, session_id: &str, at: DateTime<Utc>) {
        self.0.insert(session_id.to_string(), at);
    }

    /// Read time for a session.
    pub fn get(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.0.get(session_id).copied()
    }

    /// Number of sessions that read the message.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nobody has read the message.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A message before the store assigns its id and timestamp.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    /// Sender's username.
    pub sender: String,
    /// Sender's session id.
    pub sender_session_id: String,
    /// Content.
    pub content: MessageContent,
}

impl MessageDraft {
    /// Create a new draft.
    pub fn new(
        sender: impl Into<String>,
        sender_session_id: impl Into<String>,
        content: MessageContent,
    ) -> Self {
        Self {
            sender: sender.into(),
            sender_session_id: sender_session_id.into(),
            content,
        }
    }
}

/// A stored chat message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// Sender's username.
    pub sender: String,
    /// Sender's session id.
    pub sender_session_id: String,
    /// Room (absent for private messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Recipient session id (private messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    /// Whether this is a private message.
    pub is_private: bool,
    /// Content.
    pub content: MessageContent,
    /// Server timestamp.
    pub timestamp: DateTime<Utc>,
    /// Emoji reactions.
    #[schema(value_type = Object)]
    pub reactions: Reactions,
    /// Read receipts.
    #[schema(value_type = Object)]
    pub read_by: ReadReceipts,
}

impl Message {
    /// Create a room message from a draft.
    pub(crate) fn in_room(room: &str, draft: MessageDraft) -> Self {
        Self::from_draft(draft, Some(room.to_string()), None)
    }

    /// Create a private message from a draft.
    pub(crate) fn private(recipient_id: &str, draft: MessageDraft) -> Self {
        Self::from_draft(draft, None, Some(recipient_id.to_string()))
    }

    fn from_draft(draft: MessageDraft, room: Option<String>, recipient_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: draft.sender,
            sender_session_id: draft.sender_session_id,
            is_private: recipient_id.is_some(),
            room,
            recipient_id,
            content: draft.content,
            timestamp: Utc::now(),
            reactions: Reactions::default(),
            read_by: ReadReceipts::default(),
        }
    }

    /// Case-insensitive match of a lowercased needle against body and sender.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.content.body().to_lowercase().contains(needle)
            || self.sender.to_lowercase().contains(needle)
    }
}
