//! Unread counters per room and session.

use std::collections::{BTreeMap, HashMap};

use super::session::{Session, SessionId};

/// Counts of messages that arrived in a room while a session was elsewhere.
///
/// A session's counter for the room it is viewing stays at 0: it is reset
/// on entry and never incremented while the session is there.
#[derive(Debug, Default)]
pub struct UnreadCounters {
    counts: HashMap<String, BTreeMap<SessionId, u32>>,
}

impl UnreadCounters {
    /// Create counters for the given rooms.
    pub fn new(rooms: &[String]) -> Self {
        Self {
            counts: rooms.iter().map(|r| (r.clone(), BTreeMap::new())).collect(),
        }
    }

    /// Start tracking a session with zero counts in every room.
    pub fn register(&mut self, session_id: &str) {
        for counts in self.counts.values_mut() {
            counts.entry(session_id.to_string()).or_insert(0);
        }
    }

    /// Count a new message in `room` for everyone not viewing it.
    ///
    /// Returns the sessions whose counter changed, with their new value.
    pub fn on_message_delivered<'a>(
        &mut self,
        room: &str,
        sender_id: &str,
        sessions: impl IntoIterator<Item = &'a Session>,
    ) -> Vec<(SessionId, u32)> {
        let Some(counts) = self.counts.get_mut(room) else {
            return Vec::new();
        };
        let mut changed = Vec::new();
        for session in sessions {
            if session.id == sender_id || session.current_room == room {
                continue;
            }
            let count = counts.entry(session.id.clone()).or_insert(0);
            *count += 1;
            changed.push((session.id.clone(), *count));
        }
        changed
    }

    /// Reset a session's counter on entering a room.
    pub fn on_room_enter(&mut self, room: &str, session_id: &str) {
        if let Some(counts) = self.counts.get_mut(room) {
            counts.insert(session_id.to_string(), 0);
        }
    }

    /// A session's counter for a room.
    pub fn get(&self, room: &str, session_id: &str) -> u32 {
        self.counts
            .get(room)
            .and_then(|counts| counts.get(session_id))
            .copied()
            .unwrap_or(0)
    }

    /// All counters for a room.
    pub fn room_counts(&self, room: &str) -> BTreeMap<SessionId, u32> {
        self.counts.get(room).cloned().unwrap_or_default()
    }

    /// Stop tracking a session.
    pub fn forget(&mut self, session_id: &str) {
        for counts in self.counts.values_mut() {
            counts.remove(session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session::{outbox, SessionRegistry};

    fn rooms() -> Vec<String> {
        vec!["general".to_string(), "tech".to_string()]
    }

    fn registry() -> SessionRegistry {
        let mut registry = SessionRegistry::new();
        for (id, name, room) in [
            ("s1", "alice", "general"),
            ("s2", "bob", "tech"),
            ("s3", "carol", "general"),
        ] {
            let (tx, _rx) = outbox();
            registry.attach(id, tx);
            registry.join(id, name, room).unwrap();
        }
        registry
    }

    #[test]
    fn test_register_initializes_zero() {
        let mut unread = UnreadCounters::new(&rooms());
        unread.register("s1");
        assert_eq!(unread.room_counts("general").get("s1"), Some(&0));
        assert_eq!(unread.room_counts("tech").get("s1"), Some(&0));
    }

    #[test]
    fn test_increment_only_non_viewers() {
        let registry = registry();
        let mut unread = UnreadCounters::new(&rooms());

        let changed = unread.on_message_delivered("general", "s1", registry.sessions());
        assert_eq!(changed, vec![("s2".to_string(), 1)]);
        assert_eq!(unread.get("general", "s2"), 1);
        assert_eq!(unread.get("general", "s1"), 0);
        assert_eq!(unread.get("general", "s3"), 0);
    }

    #[test]
    fn test_room_enter_resets() {
        let registry = registry();
        let mut unread = UnreadCounters::new(&rooms());
        unread.on_message_delivered("general", "s1", registry.sessions());
        unread.on_message_delivered("general", "s1", registry.sessions());
        assert_eq!(unread.get("general", "s2"), 2);

        unread.on_room_enter("general", "s2");
        assert_eq!(unread.get("general", "s2"), 0);
    }

    #[test]
    fn test_unknown_room_is_ignored() {
        let registry = registry();
        let mut unread = UnreadCounters::new(&rooms());
        assert!(unread
            .on_message_delivered("nope", "s1", registry.sessions())
            .is_empty());
    }

    #[test]
    fn test_forget_removes_session() {
        let mut unread = UnreadCounters::new(&rooms());
        unread.register("s1");
        unread.forget("s1");
        assert!(unread.room_counts("general").is_empty());
    }
}
