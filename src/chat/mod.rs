//! Chat module for Parlor.
//!
//! This module provides the real-time chat core:
//! - Session registry and per-connection outboxes
//! - Bounded room logs with paging and search
//! - Presence, typing indicators and unread counters
//! - Reactions, read receipts and private messages
//! - The coordinator and the task that serializes commands into it

pub mod coordinator;
pub mod message;
pub mod notify;
pub mod presence;
pub mod private;
pub mod processor;
pub mod protocol;
pub mod reactions;
pub mod session;
pub mod store;
pub mod unread;

pub use coordinator::Coordinator;
pub use message::{
    FilePayload, Message, MessageContent, MessageDraft, MessageId, MessageKind, Reactions,
    ReadReceipts,
};
pub use notify::{Notification, NotificationDispatcher};
pub use presence::TypingTracker;
pub use processor::{spawn, CoordinatorHandle};
pub use protocol::{Command, Push};
pub use session::{outbox, Inbox, Outbox, Session, SessionId, SessionRegistry, OUTBOX_CAPACITY};
pub use store::{Page, RoomStore};
pub use unread::UnreadCounters;
