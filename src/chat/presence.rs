//! Presence and typing tracking.
//!
//! Room membership is never stored here: it is derived from the session
//! registry on demand. This module only holds the ephemeral typing sets.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::session::{Session, SessionId, SessionRegistry};

/// Members of a room, recomputed from the registry.
pub fn members_of(registry: &SessionRegistry, room: &str) -> Vec<Session> {
    registry.members_of(room).into_iter().cloned().collect()
}

#[derive(Debug, Clone)]
struct TypingEntry {
    session_id: SessionId,
    username: String,
    since: DateTime<Utc>,
}

/// Typing sets per room, in the order users started typing.
#[derive(Debug, Default)]
pub struct TypingTracker {
    rooms: HashMap<String, Vec<TypingEntry>>,
}

impl TypingTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a session's typing flag in a room.
    ///
    /// Setting an existing flag refreshes its timestamp.
    pub fn set(
        &mut self,
        room: &str,
        session_id: &str,
        username: &str,
        is_typing: bool,
        now: DateTime<Utc>,
    ) {
        if !is_typing {
            self.clear(room, session_id);
            return;
        }
        let entries = self.rooms.entry(room.to_string()).or_default();
        match entries.iter_mut().find(|e| e.session_id == session_id) {
            Some(entry) => entry.since = now,
            None => entries.push(TypingEntry {
                session_id: session_id.to_string(),
                username: username.to_string(),
                since: now,
            }),
        }
    }

    /// Clear a session's flag in one room. Returns true if it was set.
    pub fn clear(&mut self, room: &str, session_id: &str) -> bool {
        let Some(entries) = self.rooms.get_mut(room) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.session_id != session_id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.rooms.remove(room);
        }
        removed
    }

    /// Clear a session's flags everywhere. Returns the affected rooms.
    pub fn clear_session(&mut self, session_id: &str) -> Vec<String> {
        let rooms: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, entries)| entries.iter().any(|e| e.session_id == session_id))
            .map(|(room, _)| room.clone())
            .collect();
        for room in &rooms {
            self.clear(room, session_id);
        }
        rooms
    }

    /// Usernames currently typing in a room.
    pub fn typing_users(&self, room: &str) -> Vec<String> {
        self.rooms
            .get(room)
            .map(|entries| entries.iter().map(|e| e.username.clone()).collect())
            .unwrap_or_default()
    }

    /// Drop flags older than `timeout`. Returns the affected rooms, sorted.
    pub fn expire(&mut self, now: DateTime<Utc>, timeout: Duration) -> Vec<String> {
        let mut affected = Vec::new();
        for (room, entries) in self.rooms.iter_mut() {
            let before = entries.len();
            entries.retain(|e| now - e.since < timeout);
            if entries.len() != before {
                affected.push(room.clone());
            }
        }
        self.rooms.retain(|_, entries| !entries.is_empty());
        affected.sort();
        affected
    }
}
