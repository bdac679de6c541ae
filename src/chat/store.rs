//! Room and message store.
//!
//! Keeps a bounded, append-only log per room plus one log per private
//! conversation. Eviction is FIFO: once a log exceeds its limit the oldest
//! message is dropped.

use std::collections::{HashMap, VecDeque};

use super::message::{Message, MessageDraft};
use crate::{ParlorError, Result};

/// One page of a room's history.
#[derive(Debug, Clone)]
pub struct Page {
    /// Messages on this page, oldest first.
    pub messages: Vec<Message>,
    /// Page number (1 = newest).
    pub page: usize,
    /// Whether older messages exist beyond this page.
    pub has_more: bool,
}

/// Message logs for the predefined rooms and private conversations.
pub struct RoomStore {
    /// Room names in configured order.
    rooms: Vec<String>,
    /// Room logs.
    logs: HashMap<String, VecDeque<Message>>,
    /// Private conversation logs keyed by conversation key.
    conversations: HashMap<String, VecDeque<Message>>,
    /// Maximum messages per log.
    limit: usize,
}

impl RoomStore {
    /// Create a store with the given rooms.
    pub fn new(rooms: &[String], limit: usize) -> Self {
        let logs = rooms
            .iter()
            .map(|r| (r.clone(), VecDeque::new()))
            .collect();
        Self {
            rooms: rooms.to_vec(),
            logs,
            conversations: HashMap::new(),
            limit: limit.max(1),
        }
    }

    /// Room names in configured order.
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Whether `room` is one of the predefined rooms.
    pub fn has_room(&self, room: &str) -> bool {
        self.logs.contains_key(room)
    }

    /// Append a message to a room's log.
    pub fn append(&mut self, room: &str, draft: MessageDraft) -> Result<Message> {
        let limit = self.limit;
        let log = self
            .logs
            .get_mut(room)
            .ok_or_else(|| ParlorError::UnknownRoom(room.to_string()))?;
        let message = Message::in_room(room, draft);
        push_bounded(log, message.clone(), limit);
        Ok(message)
    }

    /// Append a private message to a conversation.
    pub fn append_private(
        &mut self,
        conversation: &str,
        recipient_id: &str,
        draft: MessageDraft,
    ) -> Message {
        let message = Message::private(recipient_id, draft);
        let log = self
            .conversations
            .entry(conversation.to_string())
            .or_default();
        push_bounded(log, message.clone(), self.limit);
        message
    }

    /// Full log of a room, oldest first.
    pub fn history(&self, room: &str) -> Option<Vec<Message>> {
        self.logs.get(room).map(|log| log.iter().cloned().collect())
    }

    /// Number of messages in a room.
    pub fn len(&self, room: &str) -> usize {
        self.logs.get(room).map_or(0, VecDeque::len)
    }

    /// A private conversation's log, oldest first.
    pub fn conversation(&self, conversation: &str) -> Vec<Message> {
        self.conversations
            .get(conversation)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every conversation `session_id` took part in.
    ///
    /// Returns the number of conversations removed.
    pub fn forget_conversations(&mut self, session_id: &str) -> usize {
        let before = self.conversations.len();
        self.conversations.retain(|_, log| {
            !log.front().is_some_and(|m| {
                m.sender_session_id == session_id || m.recipient_id.as_deref() == Some(session_id)
            })
        });
        before - self.conversations.len()
    }

    /// Page backward from the newest message.
    ///
    /// Page 1 holds the newest `page_size` messages. Page 0 is treated as 1.
    pub fn page(&self, room: &str, page: usize, page_size: usize) -> Option<Page> {
        let log = self.logs.get(room)?;
        let page = page.max(1);
        let page_size = page_size.max(1);
        let len = log.len();

        let end = len.saturating_sub((page - 1).saturating_mul(page_size));
        let start = len.saturating_sub(page.saturating_mul(page_size));

        Some(Page {
            messages: log.range(start..end).cloned().collect(),
            page,
            has_more: start > 0,
        })
    }

    /// Find a message in a room.
    pub fn find(&self, room: &str, message_id: &str) -> Option<&Message> {
        self.logs.get(room)?.iter().find(|m| m.id == message_id)
    }

    /// Find a message in a room for in-place mutation.
    pub fn find_mut(&mut self, room: &str, message_id: &str) -> Option<&mut Message> {
        self.logs
            .get_mut(room)?
            .iter_mut()
            .find(|m| m.id == message_id)
    }

    /// Case-insensitive substring search over body and sender.
    ///
    /// An empty query matches nothing.
    pub fn search(&self, room: &str, query: &str) -> Option<Vec<Message>> {
        let log = self.logs.get(room)?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Some(Vec::new());
        }
        Some(log.iter().filter(|m| m.matches(&needle)).cloned().collect())
    }
}

fn push_bounded(log: &mut VecDeque<Message>, message: Message, limit: usize) {
    log.push_back(message);
    while log.len() > limit {
        log.pop_front();
    }
}
