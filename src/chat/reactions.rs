//! Reaction and read-receipt aggregation.
//!
//! These are the only mutations ever applied to a stored message. They act
//! on the instance held by the store, so later history reads see them.

use chrono::{DateTime, Utc};

use super::message::{ReadReceipts, Reactions};
use super::store::RoomStore;
use crate::{ParlorError, Result};

fn unknown(message_id: &str) -> ParlorError {
    ParlorError::UnknownMessage(message_id.to_string())
}

/// Add a reaction. Reacting twice with the same emoji has no further effect.
///
/// Returns the message's reactions after the change.
pub fn add_reaction(
    store: &mut RoomStore,
    room: &str,
    message_id: &str,
    username: &str,
    emoji: &str,
) -> Result<Reactions> {
    let message = store
        .find_mut(room, message_id)
        .ok_or_else(|| unknown(message_id))?;
    message.reactions.add(emoji, username);
    Ok(message.reactions.clone())
}

/// Retract a reaction. Retracting one never added is a no-op.
pub fn remove_reaction(
    store: &mut RoomStore,
    room: &str,
    message_id: &str,
    username: &str,
    emoji: &str,
) -> Result<Reactions> {
    let message = store
        .find_mut(room, message_id)
        .ok_or_else(|| unknown(message_id))?;
    message.reactions.remove(emoji, username);
    Ok(message.reactions.clone())
}

/// Record that a session has read a message.
pub fn mark_read(
    store: &mut RoomStore,
    room: &str,
    message_id: &str,
    session_id: &str,
    at: DateTime<Utc>,
) -> Result<ReadReceipts> {
    let message = store
        .find_mut(room, message_id)
        .ok_or_else(|| unknown(message_id))?;
    message.read_by.mark(session_id, at);
    Ok(message.read_by.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{MessageContent, MessageDraft};

    fn store_with_message() -> (RoomStore, String) {
        let mut store = RoomStore::new(&["general".to_string()], 3);
        let msg = store
            .append(
                "general",
                MessageDraft::new("alice", "s1", MessageContent::text("hi")),
            )
            .unwrap();
        (store, msg.id)
    }

    #[test]
    fn test_add_reaction_mutates_stored_message() {
        let (mut store, id) = store_with_message();
        let reactions = add_reaction(&mut store, "general", &id, "bob", "👍").unwrap();
        assert_eq!(reactions.users("👍"), ["bob"]);

        let stored = store.find("general", &id).unwrap();
        assert_eq!(stored.reactions, reactions);
    }

    #[test]
    fn test_add_reaction_twice_is_unchanged() {
        let (mut store, id) = store_with_message();
        let first = add_reaction(&mut store, "general", &id, "bob", "👍").unwrap();
        let second = add_reaction(&mut store, "general", &id, "bob", "👍").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_remove_reaction_never_added() {
        let (mut store, id) = store_with_message();
        add_reaction(&mut store, "general", &id, "bob", "👍").unwrap();
        let after = remove_reaction(&mut store, "general", &id, "carol", "👍").unwrap();
        assert_eq!(after.users("👍"), ["bob"]);
    }

    #[test]
    fn test_remove_last_reaction_deletes_emoji() {
        let (mut store, id) = store_with_message();
        add_reaction(&mut store, "general", &id, "bob", "👍").unwrap();
        let after = remove_reaction(&mut store, "general", &id, "bob", "👍").unwrap();
        assert!(after.is_empty());
    }

    #[test]
    fn test_mark_read_repeatedly() {
        let (mut store, id) = store_with_message();
        let now = Utc::now();
        mark_read(&mut store, "general", &id, "s2", now).unwrap();
        let receipts = mark_read(&mut store, "general", &id, "s2", now).unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts.get("s2"), Some(now));
    }

    #[test]
    fn test_unknown_message_after_eviction() {
        let (mut store, id) = store_with_message();
        for i in 0..3 {
            store
                .append(
                    "general",
                    MessageDraft::new("alice", "s1", MessageContent::text(format!("m{i}"))),
                )
                .unwrap();
        }

        let result = add_reaction(&mut store, "general", &id, "bob", "👍");
        assert!(matches!(result, Err(ParlorError::UnknownMessage(_))));
        assert!(mark_read(&mut store, "general", &id, "s2", Utc::now()).is_err());
    }
}
