//! Wire protocol of the chat event channel.
//!
//! Both directions are JSON objects internally tagged by `"type"`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::message::{FilePayload, Message, MessageId, MessageKind, ReadReceipts, Reactions};
use super::notify::Notification;
use super::session::{Session, SessionId};
use crate::ParlorError;

fn default_page() -> usize {
    1
}

/// Commands sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Join under a username.
    Join {
        /// Requested username.
        username: String,
        /// Room to start in (defaults to the configured default room).
        #[serde(default)]
        room: Option<String>,
    },
    /// Switch to another room.
    ChangeRoom {
        /// Target room.
        room: String,
    },
    /// Post to the current room.
    SendMessage {
        /// Text or caption.
        #[serde(default)]
        body: String,
        /// Message type.
        #[serde(default)]
        message_type: MessageKind,
        /// Image or file attachment.
        #[serde(default)]
        file_payload: Option<FilePayload>,
    },
    /// Start or stop typing in the current room.
    SetTyping {
        /// Whether the user is typing.
        is_typing: bool,
    },
    /// Send a private message.
    PrivateMessage {
        /// Recipient session id or username.
        to: String,
        /// Text or caption.
        #[serde(default)]
        body: String,
        /// Message type.
        #[serde(default)]
        message_type: MessageKind,
        /// Image or file attachment.
        #[serde(default)]
        file_payload: Option<FilePayload>,
    },
    /// Acknowledge a message.
    MarkRead {
        /// Message id.
        message_id: MessageId,
        /// Room holding the message (defaults to the current room).
        #[serde(default)]
        room: Option<String>,
    },
    /// React to a message.
    AddReaction {
        /// Message id.
        message_id: MessageId,
        /// Emoji.
        emoji: String,
        /// Room holding the message (defaults to the current room).
        #[serde(default)]
        room: Option<String>,
    },
    /// Retract a reaction.
    RemoveReaction {
        /// Message id.
        message_id: MessageId,
        /// Emoji.
        emoji: String,
        /// Room holding the message (defaults to the current room).
        #[serde(default)]
        room: Option<String>,
    },
    /// Fetch a page of history.
    GetMessagesPage {
        /// Page number, 1 = newest.
        #[serde(default = "default_page")]
        page: usize,
        /// Page size (defaults to the configured size).
        #[serde(default)]
        page_size: Option<usize>,
        /// Room (defaults to the current room).
        #[serde(default)]
        room: Option<String>,
    },
    /// Heartbeat ping.
    Ping,
}

impl Command {
    /// Command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Join { .. } => "join",
            Command::ChangeRoom { .. } => "change_room",
            Command::SendMessage { .. } => "send_message",
            Command::SetTyping { .. } => "set_typing",
            Command::PrivateMessage { .. } => "private_message",
            Command::MarkRead { .. } => "mark_read",
            Command::AddReaction { .. } => "add_reaction",
            Command::RemoveReaction { .. } => "remove_reaction",
            Command::GetMessagesPage { .. } => "get_messages_page",
            Command::Ping => "ping",
        }
    }
}

/// Pushes sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Push {
    /// Full log of a room the client just entered.
    RoomMessages {
        /// Room.
        room: String,
        /// Messages, oldest first.
        messages: Vec<Message>,
    },
    /// Available rooms.
    RoomList {
        /// Room names.
        rooms: Vec<String>,
    },
    /// Current members of a room.
    UserList {
        /// Room.
        room: String,
        /// Members in join order.
        users: Vec<Session>,
    },
    /// Someone entered the room.
    UserJoined {
        /// Username.
        username: String,
        /// Session id.
        session_id: SessionId,
        /// Room.
        room: String,
    },
    /// Someone switched to another room.
    UserLeftRoom {
        /// Username.
        username: String,
        /// Session id.
        session_id: SessionId,
        /// Room that was left.
        room: String,
    },
    /// Someone disconnected.
    UserLeft {
        /// Username.
        username: String,
        /// Session id.
        session_id: SessionId,
        /// Last room of the session.
        room: String,
    },
    /// Room change confirmed.
    RoomJoined {
        /// New room.
        room: String,
    },
    /// Unread counters of a room.
    UnreadCounts {
        /// Room.
        room: String,
        /// Session id -> count.
        counts: BTreeMap<SessionId, u32>,
    },
    /// New room message.
    ReceiveMessage {
        /// Message.
        message: Message,
    },
    /// Unseen activity elsewhere.
    NewMessageNotification(Notification),
    /// Users typing in a room.
    TypingUsers {
        /// Room.
        room: String,
        /// Usernames in the order they started typing.
        usernames: Vec<String>,
    },
    /// Private message (to the recipient, echoed to the sender).
    PrivateMessage {
        /// Message.
        message: Message,
    },
    /// Read receipts of a message changed.
    MessageRead {
        /// Message id.
        message_id: MessageId,
        /// Receipts.
        read_by: ReadReceipts,
    },
    /// Reactions of a message changed.
    MessageReaction {
        /// Message id.
        message_id: MessageId,
        /// Reactions.
        reactions: Reactions,
    },
    /// Requested page of history.
    MessagesPage {
        /// Room.
        room: String,
        /// Messages, oldest first.
        messages: Vec<Message>,
        /// Page number.
        page: usize,
        /// Whether older messages exist.
        has_more: bool,
    },
    /// A command was rejected.
    Error {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
    },
    /// Heartbeat pong response.
    Pong,
}

impl Push {
    /// Create an error push.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&ParlorError> for Push {
    fn from(err: &ParlorError) -> Self {
        Push::error(err.code(), err.to_string())
    }
}
